use serde::Serialize;
use tracing::debug;

use crate::model::{ActivityStatus, DeliveryStatus, Point};
use crate::store::EntityStore;

/// Inter-hub route between two distribution centers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubRoute {
    pub from_id: String,
    pub to_id: String,
    pub from: Point,
    pub to: Point,
    pub status: ActivityStatus,
}

/// Route from a distribution center to one of its delivery points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRoute {
    pub cd_id: String,
    pub point_id: String,
    pub from: Point,
    pub to: Point,
    pub status: DeliveryStatus,
}

/// Everything the renderer needs to draw edges.
///
/// References to missing centers are dropped here; the delivery points
/// themselves still render from the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteSet {
    pub hub_routes: Vec<HubRoute>,
    pub delivery_routes: Vec<DeliveryRoute>,
    pub dangling_assignments: Vec<String>,
    pub dangling_connections: usize,
}

impl RouteSet {
    pub fn build(store: &EntityStore) -> Self {
        let mut routes = RouteSet::default();

        for connection in store.connections() {
            match (store.cd(&connection.from), store.cd(&connection.to)) {
                (Some(from), Some(to)) => routes.hub_routes.push(HubRoute {
                    from_id: from.id.clone(),
                    to_id: to.id.clone(),
                    from: from.location,
                    to: to.location,
                    status: connection.status,
                }),
                _ => {
                    debug!(
                        "Skipping connection {} -> {}: unknown distribution center",
                        connection.from, connection.to
                    );
                    routes.dangling_connections += 1;
                }
            }
        }

        for point in store.delivery_points() {
            match store.cd(&point.assigned_cd) {
                Some(cd) => routes.delivery_routes.push(DeliveryRoute {
                    cd_id: cd.id.clone(),
                    point_id: point.id.clone(),
                    from: cd.location,
                    to: point.location,
                    status: point.status,
                }),
                None => {
                    debug!(
                        "Delivery point {} references missing CD {}",
                        point.id, point.assigned_cd
                    );
                    routes.dangling_assignments.push(point.id.clone());
                }
            }
        }

        routes
    }

    /// Delivery routes leaving one center, used to highlight a selection.
    pub fn routes_from<'a>(&'a self, cd_id: &'a str) -> impl Iterator<Item = &'a DeliveryRoute> + 'a {
        self.delivery_routes.iter().filter(move |r| r.cd_id == cd_id)
    }
}
