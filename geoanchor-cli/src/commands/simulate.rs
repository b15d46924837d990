//! `geoanchor simulate`: run one view end to end against the simulated SDK.
//!
//! ```text
//! create view ─► surface ─► initialize (bounded VPS poll)
//!                              │
//!                              ├─► load + place models (--models)
//!                              ├─► place one cube      (--place-here)
//!                              └─► status / camera JSON ─► dispose
//! ```
//!
//! Events and status payloads go to stdout as JSON; logs go to stderr and
//! the log file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use geoanchor::config::config_file_path;
use geoanchor::coord::GeoCoordinate;
use geoanchor::logging::{default_log_dir, default_log_file, init_logging};
use geoanchor::render::HeadlessBackend;
use geoanchor::sdk::{DeviceCapabilities, DisplayRotation, SimScript, SimulatedSdk};
use geoanchor::{ArConfig, SessionPool, ViewError, ViewHandle, ViewLifecycle};

use crate::error::CliError;

/// Arguments for `geoanchor simulate`.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Latitude the simulated device stands at
    #[arg(long, default_value_t = 38.75, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude the simulated device stands at
    #[arg(long, default_value_t = -9.27, allow_negative_numbers = true)]
    pub lon: f64,

    /// Altitude in meters
    #[arg(long, default_value_t = 170.0, allow_negative_numbers = true)]
    pub alt: f64,

    /// Update number at which the VPS localizes
    #[arg(long, default_value_t = 45)]
    pub converge_at: u64,

    /// Horizontal accuracy in meters once localized
    #[arg(long, default_value_t = 8.0)]
    pub h_acc: f64,

    /// Vertical accuracy in meters once localized
    #[arg(long, default_value_t = 7.0)]
    pub v_acc: f64,

    /// Never localize (exercises the initialization timeout)
    #[arg(long)]
    pub never_converge: bool,

    /// Initialization tick in milliseconds, overriding the config file
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,

    /// JSON batch of models to load and place after initialization
    #[arg(long)]
    pub models: Option<PathBuf>,

    /// Also place the default cube 2 m north of the device
    #[arg(long)]
    pub place_here: bool,

    /// Simulate a device without internet access
    #[arg(long)]
    pub offline: bool,

    /// Simulate a device with location services switched off
    #[arg(long)]
    pub location_off: bool,

    /// Surface width in the display's natural orientation
    #[arg(long, default_value_t = 1080)]
    pub width: u32,

    /// Surface height in the display's natural orientation
    #[arg(long, default_value_t = 1920)]
    pub height: u32,

    /// Display rotation in degrees (0, 90, 180, 270)
    #[arg(long, default_value_t = 0)]
    pub rotation: u32,

    /// Configuration file (default: ~/.geoanchor/config.ini)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log directory (default: ~/.geoanchor/logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    let log_dir = args.log_dir.clone().unwrap_or_else(default_log_dir);
    let _logging_guard = init_logging(&log_dir, default_log_file())
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let config_path = args.config.clone().unwrap_or_else(config_file_path);
    let config = ArConfig::load_from(&config_path)?
        .with_tick_interval(Duration::from_millis(args.tick_ms.max(1)));

    let rotation = DisplayRotation::from_degrees(args.rotation).ok_or_else(|| {
        CliError::Config(format!(
            "rotation must be 0, 90, 180 or 270, got {}",
            args.rotation
        ))
    })?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received shutdown signal, disposing view...");
        signal.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(simulate(args, config, rotation, shutdown))
}

async fn simulate(
    args: SimulateArgs,
    config: ArConfig,
    rotation: DisplayRotation,
    shutdown: CancellationToken,
) -> Result<(), CliError> {
    let origin = GeoCoordinate::new(args.lat, args.lon, args.alt).map_err(ViewError::from)?;
    let script = if args.never_converge {
        SimScript::never_converges()
    } else {
        SimScript::converges_at(args.converge_at, args.h_acc, args.v_acc)
    };
    let sdk = SimulatedSdk::new(script, origin);
    let pool = Arc::new(
        SessionPool::new(Arc::new(sdk.clone())).with_camera_facing(config.camera_facing),
    );

    let capabilities = DeviceCapabilities {
        network_available: !args.offline,
        location_provider_enabled: !args.location_off,
        ..DeviceCapabilities::all_granted()
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (view, handle) = ViewLifecycle::create(
        &pool,
        HeadlessBackend::new(),
        &capabilities,
        config,
        events_tx,
    )?;
    info!(origin = %origin, "Simulated view created");

    let render_loop = tokio::spawn(view.run(shutdown));
    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            print_json(&event);
        }
    });

    let outcome = drive(&handle, &args, rotation, origin).await;

    handle.dispose().await?;
    if let Err(e) = render_loop.await {
        warn!(error = %e, "Render loop task failed");
    }
    drop(handle);
    if let Err(e) = printer.await {
        warn!(error = %e, "Event printer task failed");
    }

    let stats = sdk.stats();
    info!(
        updates = stats.updates,
        anchors_created = stats.anchors_created,
        anchors_detached = stats.anchors_detached,
        sessions_closed = stats.sessions_closed,
        "Simulation finished"
    );
    outcome
}

async fn drive(
    handle: &ViewHandle,
    args: &SimulateArgs,
    rotation: DisplayRotation,
    origin: GeoCoordinate,
) -> Result<(), CliError> {
    handle
        .surface_changed(args.width, args.height, rotation)
        .await?;

    let snapshot = handle.initialize().await?;
    info!(tick = snapshot.tick, "VPS ready");
    print_json(&handle.get_status().await?);

    if let Some(path) = &args.models {
        let json = std::fs::read_to_string(path).map_err(|error| CliError::FileRead {
            path: path.display().to_string(),
            error,
        })?;
        let queued = handle.load_models(json).await?;
        info!(queued, "Models loaded");
        print_json(&handle.place_models().await?);
    }

    if args.place_here {
        // ~2 m north.
        let id = handle
            .place_model(origin.latitude + 0.000018, origin.longitude, origin.altitude)
            .await?;
        info!(id = %id, "Placed default model");
    }

    print_json(&handle.get_status().await?);
    print_json(&handle.get_camera_info().await?);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!(error = %e, "Failed to serialize output"),
    }
}
