use super::SkippedOrder;
use crate::domain::model::{Courier, CourierId, Order, OrderId};
use crate::domain::ports::{CourierRepository, OrderRepository, UnitOfWork};
use crate::domain::services::{Dispatcher, NearestCourierDispatcher};
use crate::utils::error::Result;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub order_id: OrderId,
    pub courier_id: CourierId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    pub assignments: Vec<Assignment>,
    pub skipped: Vec<SkippedOrder>,
    /// 候選池用完後仍為 Created 的訂單，留待下一輪
    pub unmatched: Vec<OrderId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NothingToAssign {
    NoCreatedOrders,
    NoFreeCouriers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentOutcome {
    NothingToAssign(NothingToAssign),
    Committed(AssignmentReport),
}

impl AssignmentOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, AssignmentOutcome::NothingToAssign(_))
    }

    pub fn assigned_count(&self) -> usize {
        match self {
            AssignmentOutcome::Committed(report) => report.assignments.len(),
            AssignmentOutcome::NothingToAssign(_) => 0,
        }
    }
}

/// 指派循環：將所有 Created 訂單配給 Free 快遞員，最後一次提交。
pub struct AssignOrdersHandler<O, C, U, D = NearestCourierDispatcher> {
    orders: O,
    couriers: C,
    unit_of_work: U,
    dispatcher: D,
}

impl<O, C, U> AssignOrdersHandler<O, C, U>
where
    O: OrderRepository,
    C: CourierRepository,
    U: UnitOfWork,
{
    pub fn new(orders: O, couriers: C, unit_of_work: U) -> Self {
        Self::with_dispatcher(orders, couriers, unit_of_work, NearestCourierDispatcher)
    }
}

impl<O, C, U, D> AssignOrdersHandler<O, C, U, D>
where
    O: OrderRepository,
    C: CourierRepository,
    U: UnitOfWork,
    D: Dispatcher,
{
    pub fn with_dispatcher(orders: O, couriers: C, unit_of_work: U, dispatcher: D) -> Self {
        Self {
            orders,
            couriers,
            unit_of_work,
            dispatcher,
        }
    }

    pub async fn handle(&self, cancel: &CancellationToken) -> Result<AssignmentOutcome> {
        // 被中斷的上一次執行可能在同一個 session 留下暫存變更
        self.unit_of_work.rollback().await;

        let created = self.orders.get_all_created().await?;
        if created.is_empty() {
            tracing::debug!("No created orders, nothing to assign");
            return Ok(AssignmentOutcome::NothingToAssign(
                NothingToAssign::NoCreatedOrders,
            ));
        }

        let mut candidates = self.couriers.get_all_free().await?;
        if candidates.is_empty() {
            tracing::info!(
                "⏳ {} created orders waiting, but no free couriers",
                created.len()
            );
            return Ok(AssignmentOutcome::NothingToAssign(
                NothingToAssign::NoFreeCouriers,
            ));
        }

        let report = match self.assign_all(created, &mut candidates).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("❌ Assignment cycle aborted while staging: {}", e);
                self.unit_of_work.rollback().await;
                return Err(e);
            }
        };

        if let Err(e) = self.unit_of_work.save_all(cancel).await {
            tracing::error!("❌ Assignment cycle commit failed: {}", e);
            return Err(e);
        }

        tracing::info!(
            "✅ Assignment cycle committed: {} assigned, {} skipped, {} waiting",
            report.assignments.len(),
            report.skipped.len(),
            report.unmatched.len()
        );
        Ok(AssignmentOutcome::Committed(report))
    }

    async fn assign_all(
        &self,
        created: Vec<Order>,
        candidates: &mut Vec<Courier>,
    ) -> Result<AssignmentReport> {
        let mut report = AssignmentReport::default();

        for mut order in created {
            if candidates.is_empty() {
                report.unmatched.push(order.id());
                continue;
            }

            let chosen = match self.dispatcher.dispatch(&order, candidates) {
                Ok(courier) => courier.id(),
                Err(e) => {
                    skip(&mut report, &order, e.to_string());
                    continue;
                }
            };
            let Some(index) = candidates.iter().position(|c| c.id() == chosen) else {
                skip(&mut report, &order, format!("courier {} not in pool", chosen));
                continue;
            };

            let mut courier = candidates[index].clone();
            if let Err(e) = order.assign(&courier).and_then(|_| courier.set_busy()) {
                skip(&mut report, &order, e.to_string());
                continue;
            }

            self.orders.update(&order).await?;
            self.couriers.update(&courier).await?;

            // 已選中的快遞員不再參與本輪後續配對
            candidates.remove(index);

            tracing::debug!(
                order_id = %order.id(),
                courier_id = %courier.id(),
                "Order assigned to {} ({})",
                courier.name(),
                courier.transport()
            );
            report.assignments.push(Assignment {
                order_id: order.id(),
                courier_id: courier.id(),
            });
        }

        Ok(report)
    }
}

fn skip(report: &mut AssignmentReport, order: &Order, reason: String) {
    tracing::warn!(order_id = %order.id(), "Skipping order: {}", reason);
    report.skipped.push(SkippedOrder {
        order_id: order.id(),
        reason,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::model::{CourierStatus, Location, OrderStatus, Transport};
    use crate::adapters::InMemoryCourierRepository;
    use crate::utils::error::{DispatchError, ErrorKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    fn loc(x: i32, y: i32) -> Location {
        Location::new(x, y).unwrap()
    }

    async fn seed(store: &InMemoryStore, couriers: &[Courier], orders: &[Order]) {
        let session = store.session();
        for c in couriers {
            session.couriers().add(c.clone()).await.unwrap();
        }
        for o in orders {
            session.orders().add(o.clone()).await.unwrap();
        }
        session
            .unit_of_work()
            .save_all(&CancellationToken::new())
            .await
            .unwrap();
    }

    fn handler(
        store: &InMemoryStore,
    ) -> AssignOrdersHandler<
        crate::adapters::InMemoryOrderRepository,
        crate::adapters::InMemoryCourierRepository,
        crate::adapters::InMemoryUnitOfWork,
    > {
        let session = store.session();
        AssignOrdersHandler::new(session.orders(), session.couriers(), session.unit_of_work())
    }

    /// 永遠回傳第一位候選人的配對器
    struct FirstCandidate;

    impl Dispatcher for FirstCandidate {
        fn dispatch<'a>(&self, _order: &Order, couriers: &'a [Courier]) -> Result<&'a Courier> {
            couriers
                .first()
                .ok_or_else(|| DispatchError::validation("couriers", "candidate list is empty"))
        }
    }

    #[tokio::test]
    async fn test_noop_without_orders() {
        let store = InMemoryStore::new();
        let kate = Courier::create("Kate", Transport::Bicycle, loc(1, 1)).unwrap();
        seed(&store, &[kate], &[]).await;

        let outcome = handler(&store).handle(&CancellationToken::new()).await.unwrap();
        assert_eq!(
            outcome,
            AssignmentOutcome::NothingToAssign(NothingToAssign::NoCreatedOrders)
        );
        assert_eq!(store.commit_count().await, 1);
    }

    #[tokio::test]
    async fn test_noop_without_free_couriers() {
        let store = InMemoryStore::new();
        let order = Order::create(Uuid::new_v4(), loc(5, 5)).unwrap();
        seed(&store, &[], &[order.clone()]).await;

        let outcome = handler(&store).handle(&CancellationToken::new()).await.unwrap();
        assert!(outcome.is_noop());
        assert_eq!(
            store.committed_order(order.id()).await.unwrap().status(),
            OrderStatus::Created
        );
        assert_eq!(store.commit_count().await, 1);
    }

    #[tokio::test]
    async fn test_assigns_nearest_courier() {
        let store = InMemoryStore::new();
        let kate = Courier::create("Kate", Transport::Bicycle, loc(1, 1)).unwrap();
        let jack = Courier::create("Jack", Transport::Car, loc(2, 2)).unwrap();
        let bob = Courier::create("Bob", Transport::Pedestrian, loc(3, 3)).unwrap();
        let order = Order::create(Uuid::new_v4(), loc(5, 5)).unwrap();
        seed(&store, &[kate, jack.clone(), bob], &[order.clone()]).await;

        let outcome = handler(&store).handle(&CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.assigned_count(), 1);

        let stored = store.committed_order(order.id()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Assigned);
        assert_eq!(stored.courier_id(), Some(jack.id()));
        assert_eq!(
            store.committed_courier(jack.id()).await.unwrap().status(),
            CourierStatus::Busy
        );
    }

    #[tokio::test]
    async fn test_chosen_courier_leaves_the_pool() {
        let store = InMemoryStore::new();
        let jack = Courier::create("Jack", Transport::Car, loc(5, 5)).unwrap();
        let kate = Courier::create("Kate", Transport::Pedestrian, loc(1, 1)).unwrap();
        let first = Order::create(Uuid::new_v4(), loc(5, 5)).unwrap();
        let second = Order::create(Uuid::new_v4(), loc(5, 6)).unwrap();
        seed(&store, &[jack.clone(), kate.clone()], &[first.clone(), second.clone()]).await;

        let outcome = handler(&store).handle(&CancellationToken::new()).await.unwrap();
        let AssignmentOutcome::Committed(report) = outcome else {
            panic!("expected a committed cycle");
        };
        assert_eq!(
            report.assignments,
            vec![
                Assignment {
                    order_id: first.id(),
                    courier_id: jack.id()
                },
                Assignment {
                    order_id: second.id(),
                    courier_id: kate.id()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_orders_beyond_pool_stay_created() {
        let store = InMemoryStore::new();
        let kate = Courier::create("Kate", Transport::Car, loc(1, 1)).unwrap();
        let orders: Vec<Order> = (0..3)
            .map(|_| Order::create(Uuid::new_v4(), loc(4, 4)).unwrap())
            .collect();
        seed(&store, &[kate.clone()], &orders).await;

        let outcome = handler(&store).handle(&CancellationToken::new()).await.unwrap();
        let AssignmentOutcome::Committed(report) = outcome else {
            panic!("expected a committed cycle");
        };
        assert_eq!(report.assignments.len(), 1);
        assert_eq!(report.unmatched, vec![orders[1].id(), orders[2].id()]);
        assert_eq!(
            store.session().orders().get_all_created().await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_custom_dispatcher_is_used() {
        let store = InMemoryStore::new();
        let far = Courier::create("Far", Transport::Pedestrian, loc(10, 10)).unwrap();
        let near = Courier::create("Near", Transport::Car, loc(1, 2)).unwrap();
        let order = Order::create(Uuid::new_v4(), loc(1, 1)).unwrap();
        seed(&store, &[far.clone(), near], &[order.clone()]).await;

        let session = store.session();
        let handler = AssignOrdersHandler::with_dispatcher(
            session.orders(),
            session.couriers(),
            session.unit_of_work(),
            FirstCandidate,
        );
        handler.handle(&CancellationToken::new()).await.unwrap();
        assert_eq!(
            store.committed_order(order.id()).await.unwrap().courier_id(),
            Some(far.id())
        );
    }

    #[tokio::test]
    async fn test_commit_failure_leaves_state_untouched() {
        let store = InMemoryStore::new();
        let kate = Courier::create("Kate", Transport::Bicycle, loc(1, 1)).unwrap();
        let order = Order::create(Uuid::new_v4(), loc(5, 5)).unwrap();
        seed(&store, &[kate.clone()], &[order.clone()]).await;
        store.fail_next_commit("database unavailable").await;

        let session = store.session();
        let handler =
            AssignOrdersHandler::new(session.orders(), session.couriers(), session.unit_of_work());
        let err = handler.handle(&CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(store.committed_order(order.id()).await, Some(order));
        assert_eq!(store.committed_courier(kate.id()).await, Some(kate));
        assert!(!session.has_staged_changes().await);
    }

    /// `update` 第一次呼叫時永遠不會完成
    struct StallOnUpdate {
        inner: InMemoryCourierRepository,
        stall: Arc<AtomicBool>,
    }

    #[async_trait]
    impl CourierRepository for StallOnUpdate {
        async fn add(&self, courier: Courier) -> Result<()> {
            self.inner.add(courier).await
        }

        async fn update(&self, courier: &Courier) -> Result<()> {
            if self.stall.swap(false, Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            self.inner.update(courier).await
        }

        async fn get_by_id(&self, id: CourierId) -> Result<Option<Courier>> {
            self.inner.get_by_id(id).await
        }

        async fn get_all_free(&self) -> Result<Vec<Courier>> {
            self.inner.get_all_free().await
        }

        async fn get_all_busy(&self) -> Result<Vec<Courier>> {
            self.inner.get_all_busy().await
        }
    }

    #[tokio::test]
    async fn test_abandoned_run_leaves_nothing_for_the_next_one() {
        let store = InMemoryStore::new();
        let kate = Courier::create("Kate", Transport::Car, loc(1, 1)).unwrap();
        let first = Order::create(Uuid::new_v4(), loc(2, 2)).unwrap();
        seed(&store, &[kate.clone()], &[first.clone()]).await;

        let session = store.session();
        let handler = AssignOrdersHandler::new(
            session.orders(),
            StallOnUpdate {
                inner: session.couriers(),
                stall: Arc::new(AtomicBool::new(true)),
            },
            session.unit_of_work(),
        );

        // 訂單已暫存為 Assigned，快遞員的更新卡住
        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            handler.handle(&CancellationToken::new()),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(session.has_staged_changes().await);

        let second = Order::create(Uuid::new_v4(), loc(3, 3)).unwrap();
        seed(&store, &[], &[second.clone()]).await;

        let outcome = handler.handle(&CancellationToken::new()).await.unwrap();
        let AssignmentOutcome::Committed(report) = outcome else {
            panic!("expected a committed cycle");
        };
        assert_eq!(
            report.assignments,
            vec![Assignment {
                order_id: first.id(),
                courier_id: kate.id()
            }]
        );
        assert_eq!(report.unmatched, vec![second.id()]);

        let second = store.committed_order(second.id()).await.unwrap();
        assert_eq!(second.status(), OrderStatus::Created);
        assert_eq!(second.courier_id(), None);
        assert_eq!(
            store.committed_courier(kate.id()).await.unwrap().status(),
            CourierStatus::Busy
        );
    }
}
