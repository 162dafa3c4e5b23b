use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{ActivityStatus, DeliveryStatus};
use crate::store::EntityStore;

/// Read-only aggregates shown alongside the network diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_deliveries: usize,
    pub delivered: usize,
    pub in_transit: usize,
    pub pending: usize,
    /// Whole percent of deliveries completed, 0 when there are none
    pub completion_rate: u32,
    pub total_capacity: u64,
    pub total_load: u64,
    /// Whole percent of network capacity in use, not clamped
    pub utilization_rate: u32,
    pub active_centers: usize,
    pub active_routes: usize,
    /// Per-center load percentage in store order, clamped to 100
    pub center_loads: IndexMap<String, u32>,
}

impl DashboardMetrics {
    pub fn compute(store: &EntityStore) -> Self {
        let points = store.delivery_points();
        let count = |status: DeliveryStatus| points.iter().filter(|p| p.status == status).count();

        let total_deliveries = points.len();
        let delivered = count(DeliveryStatus::Delivered);
        let total_capacity: u64 = store.cds().iter().map(|cd| u64::from(cd.capacity)).sum();
        let total_load: u64 = store.cds().iter().map(|cd| u64::from(cd.current_load)).sum();

        Self {
            total_deliveries,
            delivered,
            in_transit: count(DeliveryStatus::InTransit),
            pending: count(DeliveryStatus::Pending),
            completion_rate: percent(delivered as u64, total_deliveries as u64),
            total_capacity,
            total_load,
            utilization_rate: percent(total_load, total_capacity),
            active_centers: store
                .cds()
                .iter()
                .filter(|cd| cd.status == ActivityStatus::Active)
                .count(),
            active_routes: store
                .connections()
                .iter()
                .filter(|c| c.status == ActivityStatus::Active)
                .count(),
            center_loads: store
                .cds()
                .iter()
                .map(|cd| (cd.id.clone(), cd.load_percentage()))
                .collect(),
        }
    }
}

fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}
