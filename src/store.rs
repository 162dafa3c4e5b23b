use std::collections::HashMap;

use tracing::{debug, warn};

use crate::model::{
    CdConnection, DeliveryPoint, DistributionCenter, EntityKind, LocatedEntity, Point,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Error(String),
}

/// Entities kept in arrival order with an id index for O(1) relocation.
///
/// The collection is stored verbatim, duplicates included, so that saving it
/// back preserves the authoritative cardinality. The index points at the
/// first entity carrying a given id.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: LocatedEntity> Arena<T> {
    pub fn from_vec(items: Vec<T>) -> Self {
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if index.contains_key(item.id()) {
                warn!("Duplicate {} id '{}' in collection", T::KIND, item.id());
                continue;
            }
            index.insert(item.id().to_string(), position);
        }
        Self { items, index }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn relocate(&mut self, id: &str, location: Point) -> bool {
        match self.index.get(id) {
            Some(&position) => {
                self.items[position].set_location(location);
                true
            }
            None => false,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The single in-memory copy of the network handed to consumers.
#[derive(Debug, Clone)]
pub struct EntityStore {
    cds: Arena<DistributionCenter>,
    delivery_points: Arena<DeliveryPoint>,
    connections: Vec<CdConnection>,
    status: LoadStatus,
    storage_warning: Option<String>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    /// A fresh store starts in the loading state with no data.
    pub fn new() -> Self {
        Self {
            cds: Arena::default(),
            delivery_points: Arena::default(),
            connections: Vec::new(),
            status: LoadStatus::Loading,
            storage_warning: None,
        }
    }

    pub fn replace_all(
        &mut self,
        cds: Vec<DistributionCenter>,
        delivery_points: Vec<DeliveryPoint>,
        connections: Vec<CdConnection>,
    ) {
        debug!(
            "Replacing store contents: {} cds, {} delivery points, {} connections",
            cds.len(),
            delivery_points.len(),
            connections.len()
        );
        self.cds = Arena::from_vec(cds);
        self.delivery_points = Arena::from_vec(delivery_points);
        self.connections = connections;
        self.status = LoadStatus::Ready;
    }

    /// Update the location of one entity without persisting it.
    ///
    /// Returns false when no entity of that kind has the given id.
    pub fn relocate(&mut self, kind: EntityKind, id: &str, location: Point) -> bool {
        match kind {
            EntityKind::DistributionCenter => self.cds.relocate(id, location),
            EntityKind::DeliveryPoint => self.delivery_points.relocate(id, location),
        }
    }

    pub fn location_of(&self, kind: EntityKind, id: &str) -> Option<Point> {
        match kind {
            EntityKind::DistributionCenter => self.cds.get(id).map(|cd| cd.location),
            EntityKind::DeliveryPoint => self.delivery_points.get(id).map(|dp| dp.location),
        }
    }

    pub fn mark_loading(&mut self) {
        self.status = LoadStatus::Loading;
    }

    /// Previous data is retained; only the status changes.
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = LoadStatus::Error(message.into());
    }

    /// Leave the loading state without replacing data, used when a refreshed
    /// snapshot is discarded.
    pub fn mark_ready(&mut self) {
        self.status = LoadStatus::Ready;
    }

    pub fn set_storage_warning(&mut self, warning: Option<String>) {
        self.storage_warning = warning;
    }

    /// Soft warning shown when the last save could not be made durable.
    pub fn storage_warning(&self) -> Option<&str> {
        self.storage_warning.as_deref()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn cds(&self) -> &[DistributionCenter] {
        self.cds.as_slice()
    }

    pub fn delivery_points(&self) -> &[DeliveryPoint] {
        self.delivery_points.as_slice()
    }

    pub fn connections(&self) -> &[CdConnection] {
        &self.connections
    }

    pub fn cd(&self, id: &str) -> Option<&DistributionCenter> {
        self.cds.get(id)
    }

    pub fn delivery_point(&self, id: &str) -> Option<&DeliveryPoint> {
        self.delivery_points.get(id)
    }
}
