use super::SkippedOrder;
use crate::domain::model::{CourierId, Location, Order, OrderId};
use crate::domain::ports::{CourierRepository, OrderRepository, UnitOfWork};
use crate::utils::error::Result;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourierMove {
    pub order_id: OrderId,
    pub courier_id: CourierId,
    pub from: Location,
    pub to: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub order_id: OrderId,
    pub courier_id: CourierId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementReport {
    pub moves: Vec<CourierMove>,
    pub deliveries: Vec<Delivery>,
    pub skipped: Vec<SkippedOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovementOutcome {
    NothingInFlight,
    Committed(MovementReport),
}

impl MovementOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, MovementOutcome::NothingInFlight)
    }

    pub fn delivered_count(&self) -> usize {
        match self {
            MovementOutcome::Committed(report) => report.deliveries.len(),
            MovementOutcome::NothingInFlight => 0,
        }
    }
}

/// 移動循環（一個 tick）：每位執行中快遞員朝目的地前進一步，抵達即完成訂單。
pub struct MoveCouriersHandler<O, C, U> {
    orders: O,
    couriers: C,
    unit_of_work: U,
}

impl<O, C, U> MoveCouriersHandler<O, C, U>
where
    O: OrderRepository,
    C: CourierRepository,
    U: UnitOfWork,
{
    pub fn new(orders: O, couriers: C, unit_of_work: U) -> Self {
        Self {
            orders,
            couriers,
            unit_of_work,
        }
    }

    pub async fn handle(&self, cancel: &CancellationToken) -> Result<MovementOutcome> {
        // 被中斷的上一次執行可能在同一個 session 留下暫存變更
        self.unit_of_work.rollback().await;

        let assigned = self.orders.get_all_assigned().await?;
        if assigned.is_empty() {
            tracing::debug!("No assigned orders, nothing to move");
            return Ok(MovementOutcome::NothingInFlight);
        }

        let report = match self.advance_all(assigned).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("❌ Movement cycle aborted while staging: {}", e);
                self.unit_of_work.rollback().await;
                return Err(e);
            }
        };

        if let Err(e) = self.unit_of_work.save_all(cancel).await {
            tracing::error!("❌ Movement cycle commit failed: {}", e);
            return Err(e);
        }

        tracing::info!(
            "🚚 Movement tick committed: {} moved, {} delivered, {} skipped",
            report.moves.len(),
            report.deliveries.len(),
            report.skipped.len()
        );
        Ok(MovementOutcome::Committed(report))
    }

    async fn advance_all(&self, assigned: Vec<Order>) -> Result<MovementReport> {
        let mut report = MovementReport::default();

        for mut order in assigned {
            let Some(courier_id) = order.courier_id() else {
                skip(&mut report, &order, "assigned order has no courier".to_string());
                continue;
            };
            let Some(mut courier) = self.couriers.get_by_id(courier_id).await? else {
                skip(&mut report, &order, format!("courier {} not found", courier_id));
                continue;
            };

            let target = order.location();
            let from = courier.location();
            if let Err(e) = courier.move_towards(&target) {
                skip(&mut report, &order, e.to_string());
                continue;
            }

            let arrived = courier.location() == target;
            if arrived {
                if let Err(e) = courier.set_free().and_then(|_| order.complete()) {
                    skip(&mut report, &order, e.to_string());
                    continue;
                }
            }

            self.couriers.update(&courier).await?;
            self.orders.update(&order).await?;

            report.moves.push(CourierMove {
                order_id: order.id(),
                courier_id,
                from,
                to: courier.location(),
            });
            if arrived {
                tracing::debug!(
                    order_id = %order.id(),
                    courier_id = %courier_id,
                    "📦 {} delivered at {}",
                    courier.name(),
                    target
                );
                report.deliveries.push(Delivery {
                    order_id: order.id(),
                    courier_id,
                });
            }
        }

        Ok(report)
    }
}

fn skip(report: &mut MovementReport, order: &Order, reason: String) {
    tracing::warn!(order_id = %order.id(), "Skipping in-flight order: {}", reason);
    report.skipped.push(SkippedOrder {
        order_id: order.id(),
        reason,
    });
}
