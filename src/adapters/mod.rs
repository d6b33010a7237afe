// Adapters layer: concrete implementations of the domain ports and the
// loaders that feed them.

pub mod geocoder;
pub mod memory;
pub mod roster;

pub use geocoder::StaticGeocoder;
pub use memory::{
    InMemoryCourierRepository, InMemoryOrderRepository, InMemorySession, InMemoryStore,
    InMemoryUnitOfWork,
};
