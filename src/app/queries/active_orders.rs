use crate::domain::model::{CourierId, Location, Order, OrderId, OrderStatus};
use crate::domain::ports::OrderRepository;
use crate::utils::error::Result;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub location: Location,
    pub status: OrderStatus,
    pub courier_id: Option<CourierId>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            location: order.location(),
            status: order.status(),
            courier_id: order.courier_id(),
        }
    }
}

/// 查詢所有尚未完成（Created 或 Assigned）的訂單
pub struct GetActiveOrdersHandler<O> {
    orders: O,
}

impl<O: OrderRepository> GetActiveOrdersHandler<O> {
    pub fn new(orders: O) -> Self {
        Self { orders }
    }

    pub async fn handle(&self) -> Result<Vec<OrderView>> {
        let mut active = self.orders.get_all_created().await?;
        active.extend(self.orders.get_all_assigned().await?);
        Ok(active.iter().map(OrderView::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryStore;
    use crate::domain::model::{Courier, Transport};
    use crate::domain::ports::UnitOfWork;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_completed_orders_are_excluded() {
        let store = InMemoryStore::new();
        let at = Location::new(4, 4).unwrap();
        let courier = Courier::create("Kate", Transport::Car, at).unwrap();

        let created = Order::create(Uuid::new_v4(), at).unwrap();
        let mut assigned = Order::create(Uuid::new_v4(), at).unwrap();
        assigned.assign(&courier).unwrap();
        let mut completed = Order::create(Uuid::new_v4(), at).unwrap();
        completed.assign(&courier).unwrap();
        completed.complete().unwrap();

        let session = store.session();
        for order in [&created, &assigned, &completed] {
            session.orders().add(order.clone()).await.unwrap();
        }
        session
            .unit_of_work()
            .save_all(&CancellationToken::new())
            .await
            .unwrap();

        let views = GetActiveOrdersHandler::new(session.orders())
            .handle()
            .await
            .unwrap();
        let ids: Vec<OrderId> = views.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![created.id(), assigned.id()]);
        assert_eq!(views[1].courier_id, Some(courier.id()));
    }
}
