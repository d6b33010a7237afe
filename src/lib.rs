pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{InMemoryStore, StaticGeocoder};
pub use config::DispatchConfig;
pub use crate::core::{DispatchEngine, EngineSummary};
pub use domain::model::{Courier, CourierStatus, Location, Order, OrderStatus, Transport};
pub use utils::error::{DispatchError, Result};
