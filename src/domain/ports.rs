use crate::domain::model::{Courier, CourierId, Location, Order, OrderId};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Order persistence. `add` and `update` only stage changes; they become
/// visible to other readers after [`UnitOfWork::save_all`].
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn add(&self, order: Order) -> Result<()>;
    async fn update(&self, order: &Order) -> Result<()>;
    async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>>;
    async fn get_all_created(&self) -> Result<Vec<Order>>;
    async fn get_all_assigned(&self) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait CourierRepository: Send + Sync {
    async fn add(&self, courier: Courier) -> Result<()>;
    async fn update(&self, courier: &Courier) -> Result<()>;
    async fn get_by_id(&self, id: CourierId) -> Result<Option<Courier>>;
    async fn get_all_free(&self) -> Result<Vec<Courier>>;
    async fn get_all_busy(&self) -> Result<Vec<Courier>>;
}

/// Atomic commit boundary over everything staged since the last commit.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// All-or-nothing. On failure every staged change is discarded.
    async fn save_all(&self, cancel: &CancellationToken) -> Result<()>;

    /// Drop staged changes without committing.
    async fn rollback(&self);
}

/// Street name → grid cell.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, street: &str, cancel: &CancellationToken) -> Result<Location>;
}

#[async_trait]
impl<T: Geocoder + ?Sized> Geocoder for Arc<T> {
    async fn resolve(&self, street: &str, cancel: &CancellationToken) -> Result<Location> {
        (**self).resolve(street, cancel).await
    }
}

/// Opens persistence sessions. Each session stages its own changes and
/// commits them through its own [`UnitOfWork`], so two sessions never see
/// or commit each other's uncommitted work.
pub trait SessionFactory: Send + Sync {
    type Orders: OrderRepository;
    type Couriers: CourierRepository;
    type Work: UnitOfWork;

    fn open(&self) -> (Self::Orders, Self::Couriers, Self::Work);
}
