//! Pointer-driven relocation of a single entity.
//!
//! There is no cancel gesture: releasing the pointer and leaving the surface
//! both commit the current position.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{ConfigError, ConfigResult};
use crate::model::{EntityKind, Point};
use crate::persistence::PersistenceAdapter;
use crate::store::EntityStore;

/// Logical canvas all locations live in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasBounds {
    pub width: f64,
    pub height: f64,
    /// Minimum distance kept between an entity and the canvas edge
    pub margin: f64,
}

impl Default for CanvasBounds {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            margin: 25.0,
        }
    }
}

impl CanvasBounds {
    pub fn new(width: f64, height: f64, margin: f64) -> ConfigResult<Self> {
        let bounds = Self {
            width,
            height,
            margin,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// The margin must leave a non-empty area on both axes.
    pub fn validate(&self) -> ConfigResult<()> {
        let fits = self.margin >= 0.0
            && self.margin * 2.0 < self.width
            && self.margin * 2.0 < self.height;
        if !fits {
            return Err(ConfigError::Invalid(format!(
                "canvas margin {} does not fit a {}x{} canvas",
                self.margin, self.width, self.height
            )));
        }
        Ok(())
    }

    /// Keep `point` at least `margin` away from every edge. On bounds that
    /// fail [`CanvasBounds::validate`] the far edge wins instead of panicking.
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.max(self.margin).min(self.width - self.margin),
            point.y.max(self.margin).min(self.height - self.margin),
        )
    }

    /// Map a pointer position onto the canvas using the surface's current
    /// on-screen box. Returns `None` for a collapsed surface.
    pub fn map_pointer(&self, pointer: PointerPosition, surface: &SurfaceRect) -> Option<Point> {
        if surface.width <= 0.0 || surface.height <= 0.0 {
            return None;
        }
        Some(Point::new(
            (pointer.x - surface.left) / surface.width * self.width,
            (pointer.y - surface.top) / surface.height * self.height,
        ))
    }
}

/// Bounding box of the rendering surface in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    /// A surface drawn at exactly canvas size, origin at zero.
    pub fn unscaled(bounds: &CanvasBounds) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: bounds.width,
            height: bounds.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub kind: EntityKind,
    pub entity_id: String,
    /// Pointer minus entity position at drag start
    pub offset: Point,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitOutcome {
    pub kind: EntityKind,
    pub entity_id: String,
    pub position: Option<Point>,
    /// False when the write to local storage failed
    pub saved: bool,
}

pub struct DragController {
    bounds: CanvasBounds,
    state: DragState,
}

impl DragController {
    pub fn new(bounds: CanvasBounds) -> Self {
        Self {
            bounds,
            state: DragState::Idle,
        }
    }

    pub fn bounds(&self) -> &CanvasBounds {
        &self.bounds
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Start dragging `id`. Ignored while another drag is active, for unknown
    /// entities, and for a collapsed surface.
    pub fn pointer_down(
        &mut self,
        kind: EntityKind,
        id: &str,
        pointer: PointerPosition,
        surface: &SurfaceRect,
        store: &EntityStore,
    ) -> bool {
        if let DragState::Dragging(session) = &self.state {
            debug!("Ignoring pointer-down on {}, already dragging {}", id, session.entity_id);
            return false;
        }
        let Some(position) = store.location_of(kind, id) else {
            debug!("Ignoring pointer-down on unknown {} {}", kind, id);
            return false;
        };
        let Some(model) = self.bounds.map_pointer(pointer, surface) else {
            return false;
        };

        debug!("Drag started on {} {} at {}", kind, id, position);
        self.state = DragState::Dragging(DragSession {
            kind,
            entity_id: id.to_string(),
            offset: model - position,
        });
        true
    }

    /// Move the dragged entity under the pointer, clamped to the canvas.
    pub fn pointer_move(
        &mut self,
        pointer: PointerPosition,
        surface: &SurfaceRect,
        store: &mut EntityStore,
    ) -> Option<Point> {
        let DragState::Dragging(session) = &self.state else {
            return None;
        };
        let model = self.bounds.map_pointer(pointer, surface)?;
        let position = self.bounds.clamp(model - session.offset);

        if !store.relocate(session.kind, &session.entity_id, position) {
            warn!(
                "Dragged {} {} disappeared from the store",
                session.kind, session.entity_id
            );
            return None;
        }
        Some(position)
    }

    /// End the drag and persist the whole collection of the dragged kind.
    ///
    /// Used for both pointer-up and pointer-leave.
    pub fn pointer_release(
        &mut self,
        store: &mut EntityStore,
        persistence: &mut PersistenceAdapter,
    ) -> Option<CommitOutcome> {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return None;
        };

        let saved = match session.kind {
            EntityKind::DistributionCenter => persistence.save(store.cds()),
            EntityKind::DeliveryPoint => persistence.save(store.delivery_points()),
        };
        let position = store.location_of(session.kind, &session.entity_id);

        if saved {
            info!("Saved new position of {} {}", session.kind, session.entity_id);
            store.set_storage_warning(None);
        } else {
            store.set_storage_warning(Some(
                "Position could not be saved locally; it will be lost on reload".to_string(),
            ));
        }

        Some(CommitOutcome {
            kind: session.kind,
            entity_id: session.entity_id,
            position,
            saved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_exact_boundaries() {
        let bounds = CanvasBounds::default();
        assert_eq!(bounds.clamp(Point::new(-50.0, 600.0)), Point::new(25.0, 475.0));
        assert_eq!(bounds.clamp(Point::new(900.0, -1.0)), Point::new(775.0, 25.0));
        assert_eq!(bounds.clamp(Point::new(25.0, 475.0)), Point::new(25.0, 475.0));
        assert_eq!(bounds.clamp(Point::new(400.0, 250.0)), Point::new(400.0, 250.0));
    }

    #[test]
    fn test_map_pointer_scales_with_surface() {
        let bounds = CanvasBounds::default();
        let surface = SurfaceRect {
            left: 100.0,
            top: 50.0,
            width: 400.0,
            height: 250.0,
        };
        let mapped = bounds.map_pointer(PointerPosition::new(300.0, 175.0), &surface);
        assert_eq!(mapped, Some(Point::new(400.0, 250.0)));
    }

    #[test]
    fn test_collapsed_surface_has_no_mapping() {
        let bounds = CanvasBounds::default();
        let surface = SurfaceRect {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 500.0,
        };
        assert_eq!(bounds.map_pointer(PointerPosition::new(1.0, 1.0), &surface), None);
    }

    #[test]
    fn test_invalid_bounds_are_rejected_and_never_panic() {
        assert!(CanvasBounds::new(800.0, 500.0, 25.0).is_ok());
        assert!(matches!(
            CanvasBounds::new(40.0, 500.0, 25.0),
            Err(ConfigError::Invalid(_))
        ));

        let cramped = CanvasBounds {
            width: 40.0,
            height: 500.0,
            margin: 25.0,
        };
        assert_eq!(cramped.clamp(Point::new(0.0, 0.0)), Point::new(15.0, 25.0));
    }

    #[test]
    fn test_mapping_follows_surface_resized_mid_drag() {
        let mut store = EntityStore::new();
        store.replace_all(
            vec![crate::model::DistributionCenter {
                id: "cd1".to_string(),
                name: "CD 1".to_string(),
                location: Point::new(200.0, 150.0),
                status: crate::model::ActivityStatus::Active,
                capacity: 100,
                current_load: 10,
            }],
            Vec::new(),
            Vec::new(),
        );
        let mut controller = DragController::new(CanvasBounds::default());
        let full = SurfaceRect::unscaled(controller.bounds());
        let half = SurfaceRect {
            left: 0.0,
            top: 0.0,
            width: 400.0,
            height: 250.0,
        };

        assert!(controller.pointer_down(
            EntityKind::DistributionCenter,
            "cd1",
            PointerPosition::new(200.0, 150.0),
            &full,
            &store,
        ));
        let moved = controller.pointer_move(PointerPosition::new(150.0, 100.0), &half, &mut store);
        assert_eq!(moved, Some(Point::new(300.0, 200.0)));
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let mut controller = DragController::new(CanvasBounds::default());
        let mut store = EntityStore::new();
        let surface = SurfaceRect::unscaled(controller.bounds());
        assert_eq!(
            controller.pointer_move(PointerPosition::new(10.0, 10.0), &surface, &mut store),
            None
        );
        assert_eq!(controller.state(), &DragState::Idle);
    }
}
