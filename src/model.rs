use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;

/// A position in logical canvas space.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Shared by distribution centers and hub connections.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Active,
    Inactive,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    InTransit,
    Delivered,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistributionCenter {
    pub id: String,
    pub name: String,
    pub location: Point,
    pub status: ActivityStatus,
    pub capacity: u32,
    pub current_load: u32,
}

impl DistributionCenter {
    /// Load as a whole percentage of capacity, clamped to 100 so an
    /// over-capacity center still renders a full bar.
    pub fn load_percentage(&self) -> u32 {
        if self.capacity == 0 {
            return if self.current_load > 0 { 100 } else { 0 };
        }
        let pct = (f64::from(self.current_load) / f64::from(self.capacity) * 100.0).round();
        (pct as u32).min(100)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DeliveryPoint {
    pub id: String,
    pub name: String,
    pub location: Point,
    pub status: DeliveryStatus,
    #[serde(rename = "assignedCD")]
    pub assigned_cd: String,
    pub priority: Priority,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CdConnection {
    pub from: String,
    pub to: String,
    pub status: ActivityStatus,
}

/// The two relocatable collections.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    #[serde(rename = "cd")]
    DistributionCenter,
    #[serde(rename = "delivery")]
    DeliveryPoint,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::DistributionCenter, EntityKind::DeliveryPoint];

    /// Fixed, versionless slot name in the local store.
    pub fn storage_key(&self) -> &'static str {
        match self {
            EntityKind::DistributionCenter => "route-atlas-cds",
            EntityKind::DeliveryPoint => "route-atlas-delivery-points",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::DistributionCenter => write!(f, "cd"),
            EntityKind::DeliveryPoint => write!(f, "delivery"),
        }
    }
}

/// An entity with a stable id and a draggable location.
pub trait LocatedEntity: Serialize + DeserializeOwned + Clone + fmt::Debug + Send {
    const KIND: EntityKind;

    fn id(&self) -> &str;
    fn location(&self) -> Point;
    fn set_location(&mut self, location: Point);
}

impl LocatedEntity for DistributionCenter {
    const KIND: EntityKind = EntityKind::DistributionCenter;

    fn id(&self) -> &str {
        &self.id
    }

    fn location(&self) -> Point {
        self.location
    }

    fn set_location(&mut self, location: Point) {
        self.location = location;
    }
}

impl LocatedEntity for DeliveryPoint {
    const KIND: EntityKind = EntityKind::DeliveryPoint;

    fn id(&self) -> &str {
        &self.id
    }

    fn location(&self) -> Point {
        self.location
    }

    fn set_location(&mut self, location: Point) {
        self.location = location;
    }
}
