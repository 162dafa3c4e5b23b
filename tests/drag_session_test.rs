//! Drag session tests
//!
//! Pointer input through the dashboard: coordinate mapping on scaled
//! surfaces, clamping, and the commit path into local storage.

mod common;

use anyhow::Result;
use routeatlas::dashboard::PointerEvent;
use routeatlas::drag::{PointerPosition, SurfaceRect};
use routeatlas::model::{DeliveryPoint, DistributionCenter, EntityKind, Point};

use common::{assert_close, cd_at, dp_at, sample_snapshot, Harness};

fn unscaled() -> SurfaceRect {
    SurfaceRect {
        left: 0.0,
        top: 0.0,
        width: 800.0,
        height: 500.0,
    }
}

fn down(kind: EntityKind, id: &str, x: f64, y: f64, surface: SurfaceRect) -> PointerEvent {
    PointerEvent::Down {
        kind,
        id: id.to_string(),
        pointer: PointerPosition::new(x, y),
        surface,
    }
}

fn move_to(x: f64, y: f64, surface: SurfaceRect) -> PointerEvent {
    PointerEvent::Move {
        pointer: PointerPosition::new(x, y),
        surface,
    }
}

#[tokio::test]
async fn test_drag_commit_round_trip_on_scaled_surface() -> Result<()> {
    let mut harness = Harness::new(sample_snapshot());
    harness.dashboard.refresh().await?;

    // Surface drawn at half size, offset inside the page
    let surface = SurfaceRect {
        left: 10.0,
        top: 20.0,
        width: 400.0,
        height: 250.0,
    };
    // cd1 sits at (200, 150); grab it 10 model units right of and below centre
    let dashboard = &mut harness.dashboard;
    dashboard.handle_pointer(down(EntityKind::DistributionCenter, "cd1", 115.0, 100.0, surface));
    assert!(dashboard.drag().is_dragging());
    assert!(dashboard.scheduler().has_pending_edit());

    dashboard.handle_pointer(move_to(165.0, 150.0, surface));
    let live = dashboard
        .store()
        .location_of(EntityKind::DistributionCenter, "cd1")
        .expect("cd1 in store");
    assert_close(live, Point::new(300.0, 250.0));

    let outcome = dashboard
        .handle_pointer(PointerEvent::Up)
        .expect("drag commits on release");
    assert!(outcome.saved);
    assert_eq!(outcome.entity_id, "cd1");
    assert!(!dashboard.drag().is_dragging());
    assert!(!dashboard.scheduler().has_pending_edit());

    let persisted = dashboard
        .persistence()
        .load::<DistributionCenter>()
        .expect("collection persisted");
    assert_eq!(persisted.len(), 3);
    assert_close(cd_at(&persisted, "cd1").location, live);
    assert_eq!(cd_at(dashboard.store().cds(), "cd1").location, live);
    // Untouched entities are saved alongside the moved one
    assert_eq!(cd_at(&persisted, "cd2").location, Point::new(600.0, 250.0));
    Ok(())
}

#[tokio::test]
async fn test_surface_resized_mid_drag_is_remapped() -> Result<()> {
    let mut harness = Harness::new(sample_snapshot());
    harness.dashboard.refresh().await?;
    let dashboard = &mut harness.dashboard;

    // cd1 sits at (200, 150); grab it dead centre on the full-size surface
    dashboard.handle_pointer(down(EntityKind::DistributionCenter, "cd1", 200.0, 150.0, unscaled()));

    let shrunk = SurfaceRect {
        left: 0.0,
        top: 0.0,
        width: 400.0,
        height: 250.0,
    };
    dashboard.handle_pointer(move_to(150.0, 100.0, shrunk));
    assert_close(
        dashboard
            .store()
            .location_of(EntityKind::DistributionCenter, "cd1")
            .expect("cd1 in store"),
        Point::new(300.0, 200.0),
    );

    let outcome = dashboard.handle_pointer(PointerEvent::Up).expect("commit");
    assert!(outcome.saved);
    let persisted = dashboard
        .persistence()
        .load::<DistributionCenter>()
        .expect("collection persisted");
    assert_close(cd_at(&persisted, "cd1").location, Point::new(300.0, 200.0));
    Ok(())
}

#[tokio::test]
async fn test_drag_is_clamped_to_canvas_margin() -> Result<()> {
    let mut harness = Harness::new(sample_snapshot());
    harness.dashboard.refresh().await?;
    let dashboard = &mut harness.dashboard;

    dashboard.handle_pointer(down(EntityKind::DeliveryPoint, "dp3", 80.0, 180.0, unscaled()));
    dashboard.handle_pointer(move_to(-50.0, 600.0, unscaled()));
    assert_eq!(
        dashboard.store().location_of(EntityKind::DeliveryPoint, "dp3"),
        Some(Point::new(25.0, 475.0))
    );

    dashboard.handle_pointer(move_to(2000.0, -300.0, unscaled()));
    assert_eq!(
        dashboard.store().location_of(EntityKind::DeliveryPoint, "dp3"),
        Some(Point::new(775.0, 25.0))
    );

    dashboard.handle_pointer(PointerEvent::Up);
    let persisted = dashboard
        .persistence()
        .load::<DeliveryPoint>()
        .expect("collection persisted");
    assert_eq!(dp_at(&persisted, "dp3").location, Point::new(775.0, 25.0));
    Ok(())
}

#[tokio::test]
async fn test_leaving_surface_commits_like_release() -> Result<()> {
    let mut harness = Harness::new(sample_snapshot());
    harness.dashboard.refresh().await?;
    let dashboard = &mut harness.dashboard;

    dashboard.handle_pointer(down(EntityKind::DeliveryPoint, "dp8", 440.0, 50.0, unscaled()));
    dashboard.handle_pointer(move_to(480.0, 90.0, unscaled()));
    let outcome = dashboard
        .handle_pointer(PointerEvent::Leave)
        .expect("leave commits");

    assert!(outcome.saved);
    assert_eq!(outcome.kind, EntityKind::DeliveryPoint);
    let persisted = dashboard
        .persistence()
        .load::<DeliveryPoint>()
        .expect("collection persisted");
    assert_close(dp_at(&persisted, "dp8").location, Point::new(480.0, 90.0));
    Ok(())
}

#[tokio::test]
async fn test_release_without_move_still_commits() -> Result<()> {
    let mut harness = Harness::new(sample_snapshot());
    harness.dashboard.refresh().await?;
    let writes_before = harness.storage.write_count();

    let dashboard = &mut harness.dashboard;
    dashboard.handle_pointer(down(EntityKind::DistributionCenter, "cd2", 600.0, 250.0, unscaled()));
    let outcome = dashboard.handle_pointer(PointerEvent::Up).expect("commit");

    assert!(outcome.saved);
    assert_eq!(harness.storage.write_count(), writes_before + 1);
    Ok(())
}

#[tokio::test]
async fn test_pointer_down_on_unknown_entity_is_ignored() -> Result<()> {
    let mut harness = Harness::new(sample_snapshot());
    harness.dashboard.refresh().await?;
    let dashboard = &mut harness.dashboard;

    dashboard.handle_pointer(down(EntityKind::DistributionCenter, "dp1", 120.0, 120.0, unscaled()));
    assert!(!dashboard.drag().is_dragging());
    assert!(!dashboard.scheduler().has_pending_edit());
    assert!(dashboard.handle_pointer(PointerEvent::Up).is_none());
    Ok(())
}

#[tokio::test]
async fn test_failed_save_keeps_in_memory_position() -> Result<()> {
    let mut harness = Harness::new(sample_snapshot());
    harness.dashboard.refresh().await?;
    harness.storage.set_quota(Some(32));

    let dashboard = &mut harness.dashboard;
    dashboard.handle_pointer(down(EntityKind::DistributionCenter, "cd3", 400.0, 100.0, unscaled()));
    dashboard.handle_pointer(move_to(420.0, 300.0, unscaled()));
    let outcome = dashboard.handle_pointer(PointerEvent::Up).expect("commit");

    assert!(!outcome.saved);
    assert!(dashboard.store().storage_warning().is_some());
    assert_close(
        cd_at(dashboard.store().cds(), "cd3").location,
        Point::new(420.0, 300.0),
    );
    let persisted = dashboard
        .persistence()
        .load::<DistributionCenter>()
        .expect("authoritative copy still stored");
    assert_eq!(cd_at(&persisted, "cd3").location, Point::new(400.0, 100.0));
    Ok(())
}
