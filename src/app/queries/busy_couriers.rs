use crate::domain::model::{Courier, CourierId, Location, Transport};
use crate::domain::ports::CourierRepository;
use crate::utils::error::Result;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourierView {
    pub id: CourierId,
    pub name: String,
    pub transport: Transport,
    pub location: Location,
}

impl From<&Courier> for CourierView {
    fn from(courier: &Courier) -> Self {
        Self {
            id: courier.id(),
            name: courier.name().to_string(),
            transport: courier.transport(),
            location: courier.location(),
        }
    }
}

/// 查詢所有忙碌中的快遞員
pub struct GetBusyCouriersHandler<C> {
    couriers: C,
}

impl<C: CourierRepository> GetBusyCouriersHandler<C> {
    pub fn new(couriers: C) -> Self {
        Self { couriers }
    }

    pub async fn handle(&self) -> Result<Vec<CourierView>> {
        let busy = self.couriers.get_all_busy().await?;
        Ok(busy.iter().map(CourierView::from).collect())
    }
}
