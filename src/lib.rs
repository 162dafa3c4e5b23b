pub mod config;
pub mod dashboard;
pub mod drag;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod persistence;
pub mod reconcile;
pub mod routes;
pub mod scheduler;
pub mod source;
pub mod store;
