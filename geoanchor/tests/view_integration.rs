//! Integration tests for the geospatial AR view.
//!
//! These drive a full view against the simulated SDK through the public
//! handle:
//! - bounded VPS initialization (convergence, timeout, hard errors)
//! - batch loading and explicit placement
//! - display rotation, removal and teardown
//!
//! Time is paused so the one-second initialization ticks run instantly.
//!
//! Run with: `cargo test --test view_integration`

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use geoanchor::coord::GeoCoordinate;
use geoanchor::render::HeadlessBackend;
use geoanchor::sdk::{
    DeviceCapabilities, DisplayRotation, EarthState, SimPhase, SimScript, SimulatedSdk,
};
use geoanchor::{ArConfig, SessionPool, ViewError, ViewEvent, ViewHandle, ViewLifecycle};

// ============================================================================
// Helper Functions
// ============================================================================

const DUCK_BATCH: &str = r#"[{"model":"Duck.glb","latitude":38.75,"longitude":-9.27,"altitude":170.0,"scale":1.0}]"#;

fn origin() -> GeoCoordinate {
    GeoCoordinate::new(38.75, -9.27, 170.0).unwrap()
}

struct Harness {
    sdk: SimulatedSdk,
    pool: Arc<SessionPool>,
    handle: ViewHandle,
    events: mpsc::UnboundedReceiver<ViewEvent>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

/// Mount one view on a fresh pool and start its render loop.
fn mount(script: SimScript) -> Harness {
    let sdk = SimulatedSdk::new(script, origin());
    let pool = Arc::new(SessionPool::new(Arc::new(sdk.clone())));
    let (handle, events, shutdown, task) = mount_on(&pool);
    Harness {
        sdk,
        pool,
        handle,
        events,
        shutdown,
        task,
    }
}

fn mount_on(
    pool: &Arc<SessionPool>,
) -> (
    ViewHandle,
    mpsc::UnboundedReceiver<ViewEvent>,
    CancellationToken,
    JoinHandle<()>,
) {
    let (tx, events) = mpsc::unbounded_channel();
    let (view, handle) = ViewLifecycle::create(
        pool,
        HeadlessBackend::new(),
        &DeviceCapabilities::all_granted(),
        ArConfig::default(),
        tx,
    )
    .unwrap();
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(view.run(shutdown.clone()));
    (handle, events, shutdown, task)
}

/// Give the view a portrait surface so the render loop goes ACTIVE.
async fn show(handle: &ViewHandle) {
    handle
        .surface_changed(1080, 1920, DisplayRotation::Rotation0)
        .await
        .unwrap();
}

fn placed_events(events: &mut mpsc::UnboundedReceiver<ViewEvent>) -> Vec<(String, f64, f64)> {
    let mut placed = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ViewEvent::ModelPlaced {
            model,
            latitude,
            longitude,
        } = event
        {
            placed.push((model, latitude, longitude));
        }
    }
    placed
}

// ============================================================================
// Initialization
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_initialize_converges_at_tick_45() {
    let h = mount(SimScript::converges_at(45, 8.0, 7.0));

    let snapshot = h.handle.initialize().await.unwrap();
    assert_eq!(snapshot.tick, 45);
    assert_eq!(h.sdk.stats().updates, 45);

    let status = h.handle.get_status().await.unwrap();
    assert!(status.available);
    assert!(status.tracking);
    assert_eq!(status.earth_state, "ENABLED");
    assert_eq!(status.horizontal_accuracy, 8.0);
    assert_eq!(status.vertical_accuracy, 7.0);
}

#[tokio::test(start_paused = true)]
async fn test_initialize_times_out_after_120_ticks() {
    let h = mount(SimScript::never_converges());

    let err = h.handle.initialize().await.unwrap_err();
    assert!(matches!(err, ViewError::VpsTimeout { ticks: 120, .. }));
    assert_eq!(err.code(), "TIMEOUT");
    assert!(err.is_retryable());
    assert!(err.to_string().contains("open view of the sky"));

    let status = h.handle.get_status().await.unwrap();
    assert_eq!(status.object_count, 0);
    assert!(!status.available);

    // Session kept for a retry.
    assert!(h.pool.is_live());
    assert_eq!(h.sdk.stats().sessions_closed, 0);
    assert_eq!(h.sdk.stats().anchor_attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_initialize_on_active_view_follows_render_loop() {
    let h = mount(SimScript::converges_at(45, 8.0, 7.0));
    show(&h.handle).await;
    let started = tokio::time::Instant::now();

    let snapshot = h.handle.initialize().await.unwrap();

    // Every session update came from the render loop and produced the
    // snapshot sequence the poll observed.
    assert!(snapshot.tick >= 45);
    assert_eq!(snapshot.tick, h.sdk.stats().updates);
    assert_eq!(started.elapsed(), Duration::from_secs(2));

    let status = h.handle.get_status().await.unwrap();
    assert!(status.available);
    assert_eq!(status.horizontal_accuracy, 8.0);
}

#[tokio::test(start_paused = true)]
async fn test_quota_exhausted_fails_immediately() {
    let h = mount(
        SimScript::starting(SimPhase::Searching)
            .then(5, SimPhase::Earth(EarthState::ErrorResourceExhausted)),
    );

    let err = h.handle.initialize().await.unwrap_err();
    assert_eq!(err.code(), "QUOTA_EXCEEDED");
    assert!(!err.is_retryable());
    assert_eq!(h.sdk.stats().updates, 5);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_cancels_initialization() {
    let h = mount(SimScript::never_converges());

    let init = {
        let handle = h.handle.clone();
        tokio::spawn(async move { handle.initialize().await })
    };
    tokio::time::sleep(Duration::from_millis(10_500)).await;

    assert!(h.handle.dispose().await.unwrap());
    let result = init.await.unwrap();
    assert!(matches!(result, Err(ViewError::Cancelled)));
    assert_eq!(h.sdk.stats().updates, 10);

    h.task.await.unwrap();
    assert!(!h.pool.is_live());
}

// ============================================================================
// Placement
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_batch_placement_emits_one_event() {
    let mut h = mount(SimScript::converges_at(2, 4.0, 3.0));
    show(&h.handle).await;
    h.handle.initialize().await.unwrap();

    assert_eq!(h.handle.load_models(DUCK_BATCH).await.unwrap(), 1);
    let summary = h.handle.place_models().await.unwrap();
    assert_eq!(summary.placed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.pending, 0);

    let placed = placed_events(&mut h.events);
    assert_eq!(placed, vec![("Duck.glb".to_string(), 38.75, -9.27)]);
    assert_eq!(h.handle.get_status().await.unwrap().object_count, 1);

    // Nothing left to place.
    let again = h.handle.place_models().await.unwrap();
    assert_eq!(again.placed, 0);
    assert_eq!(h.sdk.stats().anchors_created, 1);
}

#[tokio::test(start_paused = true)]
async fn test_place_models_before_ready_is_rejected() {
    let h = mount(SimScript::never_converges());
    show(&h.handle).await;
    h.handle.load_models(DUCK_BATCH).await.unwrap();

    let err = h.handle.place_models().await.unwrap_err();
    assert_eq!(err.code(), "NOT_TRACKING");
    assert_eq!(h.sdk.stats().anchor_attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_placement_before_surface_is_rejected() {
    let h = mount(SimScript::converges_at(1, 4.0, 3.0));
    h.handle.initialize().await.unwrap();
    h.handle.load_models(DUCK_BATCH).await.unwrap();

    let err = h.handle.place_model(38.7501, -9.27, 170.0).await.unwrap_err();
    assert_eq!(err.code(), "NOT_TRACKING");
    assert!(h.handle.place_models().await.is_err());
    assert_eq!(h.sdk.stats().anchor_attempts, 0);

    show(&h.handle).await;
    assert_eq!(h.handle.place_models().await.unwrap().placed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_remove_detaches_exactly_one() {
    let h = mount(SimScript::converges_at(1, 4.0, 3.0));
    show(&h.handle).await;
    h.handle.initialize().await.unwrap();

    let first = h.handle.place_model(38.7501, -9.27, 170.0).await.unwrap();
    let second = h.handle.place_model(38.7502, -9.27, 170.0).await.unwrap();
    assert_ne!(first, second);

    h.handle.remove_model(&first).await.unwrap();
    assert_eq!(h.sdk.stats().anchors_detached, 1);
    assert_eq!(h.handle.get_status().await.unwrap().object_count, 1);

    let err = h.handle.remove_model(&first).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

// ============================================================================
// Display & Teardown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rotation_swaps_geometry() {
    let h = mount(SimScript::default());

    h.handle
        .surface_changed(1080, 1920, DisplayRotation::Rotation0)
        .await
        .unwrap();
    h.handle
        .surface_changed(1080, 1920, DisplayRotation::Rotation90)
        .await
        .unwrap();

    let pushed = h.sdk.stats().display_geometry;
    assert_eq!(
        pushed,
        vec![
            (DisplayRotation::Rotation0, 1080, 1920),
            (DisplayRotation::Rotation90, 1920, 1080),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_double_dispose_detaches_once() {
    let h = mount(SimScript::converges_at(1, 4.0, 3.0));
    show(&h.handle).await;
    h.handle.initialize().await.unwrap();
    h.handle.place_model(38.7501, -9.27, 170.0).await.unwrap();

    assert!(h.handle.dispose().await.unwrap());
    assert!(!h.handle.dispose().await.unwrap());
    h.task.await.unwrap();

    let stats = h.sdk.stats();
    assert_eq!(stats.anchors_detached, 1);
    assert_eq!(stats.sessions_closed, 1);
    assert!(matches!(
        h.handle.get_status().await,
        Err(ViewError::Disposed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_views_share_one_session() {
    let h = mount(SimScript::default());
    let (second, _events, second_shutdown, second_task) = mount_on(&h.pool);

    assert_eq!(h.pool.ref_count(), 2);
    assert_eq!(h.sdk.stats().sessions_created, 1);

    assert!(second.dispose().await.unwrap());
    second_task.await.unwrap();
    assert_eq!(h.pool.ref_count(), 1);
    assert_eq!(h.sdk.stats().sessions_closed, 0);

    h.shutdown.cancel();
    h.task.await.unwrap();
    second_shutdown.cancel();
    assert!(!h.pool.is_live());
    assert_eq!(h.sdk.stats().sessions_closed, 1);
}
