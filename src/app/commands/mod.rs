pub mod assign_orders;
pub mod create_order;
pub mod move_couriers;

pub use assign_orders::{AssignOrdersHandler, Assignment, AssignmentOutcome, AssignmentReport, NothingToAssign};
pub use create_order::{CreateOrderCommand, CreateOrderHandler};
pub use move_couriers::{CourierMove, Delivery, MoveCouriersHandler, MovementOutcome, MovementReport};

use crate::domain::model::OrderId;

/// 因狀態轉換失敗而略過的訂單
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOrder {
    pub order_id: OrderId,
    pub reason: String,
}
