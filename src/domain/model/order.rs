use crate::domain::model::{Courier, CourierId, CourierStatus, Location};
use crate::utils::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order identity. Supplied by the caller; in practice the basket id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Assigned,
    Completed,
}

/// A delivery order. Status only moves forward: Created → Assigned → Completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    location: Location,
    status: OrderStatus,
    courier_id: Option<CourierId>,
}

impl Order {
    pub fn create(id: impl Into<OrderId>, location: Location) -> Result<Self> {
        let id = id.into();
        if id.is_nil() {
            return Err(DispatchError::validation("order_id", "value is required"));
        }

        Ok(Self {
            id,
            location,
            status: OrderStatus::Created,
            courier_id: None,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Present iff the order has left `Created`.
    pub fn courier_id(&self) -> Option<CourierId> {
        self.courier_id
    }

    pub fn assign(&mut self, courier: &Courier) -> Result<()> {
        if self.status != OrderStatus::Created {
            return Err(DispatchError::state_conflict(format!(
                "order {} is {:?}, only created orders can be assigned",
                self.id, self.status
            )));
        }
        if courier.status() == CourierStatus::Busy {
            return Err(DispatchError::state_conflict(format!(
                "courier {} is busy and cannot take order {}",
                courier.id(),
                self.id
            )));
        }

        self.status = OrderStatus::Assigned;
        self.courier_id = Some(courier.id());
        Ok(())
    }

    pub fn complete(&mut self) -> Result<()> {
        if self.status != OrderStatus::Assigned {
            return Err(DispatchError::state_conflict(format!(
                "order {} is {:?}, only assigned orders can be completed",
                self.id, self.status
            )));
        }
        self.status = OrderStatus::Completed;
        Ok(())
    }
}
