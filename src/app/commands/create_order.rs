use crate::domain::model::{Order, OrderId};
use crate::domain::ports::{Geocoder, OrderRepository, UnitOfWork};
use crate::utils::error::{DispatchError, Result};
use crate::utils::validation::validate_not_blank;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// 建立訂單的請求。訂單 id 直接沿用購物車 id。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderCommand {
    basket_id: Uuid,
    street: String,
}

impl CreateOrderCommand {
    pub fn new(basket_id: Uuid, street: impl Into<String>) -> Result<Self> {
        if basket_id.is_nil() {
            return Err(DispatchError::validation("basket_id", "value is required"));
        }
        let street = street.into();
        validate_not_blank("street", &street)?;
        Ok(Self { basket_id, street })
    }

    pub fn basket_id(&self) -> Uuid {
        self.basket_id
    }

    pub fn street(&self) -> &str {
        &self.street
    }
}

pub struct CreateOrderHandler<O, G, U> {
    orders: O,
    geocoder: G,
    unit_of_work: U,
}

impl<O, G, U> CreateOrderHandler<O, G, U>
where
    O: OrderRepository,
    G: Geocoder,
    U: UnitOfWork,
{
    pub fn new(orders: O, geocoder: G, unit_of_work: U) -> Self {
        Self {
            orders,
            geocoder,
            unit_of_work,
        }
    }

    pub async fn handle(
        &self,
        command: CreateOrderCommand,
        cancel: &CancellationToken,
    ) -> Result<OrderId> {
        let order_id = OrderId::from(command.basket_id);
        if self.orders.get_by_id(order_id).await?.is_some() {
            return Err(DispatchError::state_conflict(format!(
                "order {} has already been created",
                order_id
            )));
        }

        let location = self.geocoder.resolve(&command.street, cancel).await?;
        let order = Order::create(order_id, location)?;

        if let Err(e) = self.orders.add(order).await {
            self.unit_of_work.rollback().await;
            return Err(e);
        }
        self.unit_of_work.save_all(cancel).await?;

        tracing::info!(
            "🆕 Order {} created for '{}' at {}",
            order_id,
            command.street,
            location
        );
        Ok(order_id)
    }
}
