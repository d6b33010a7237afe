use crate::app::commands::{
    AssignOrdersHandler, AssignmentOutcome, CreateOrderCommand, CreateOrderHandler,
    MoveCouriersHandler, MovementOutcome,
};
use crate::app::queries::{CourierView, GetActiveOrdersHandler, GetBusyCouriersHandler, OrderView};
use crate::config::toml_config::SchedulerConfig;
use crate::domain::model::{Courier, OrderId};
use crate::domain::ports::{CourierRepository, Geocoder, OrderRepository, SessionFactory, UnitOfWork};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Serialize)]
pub struct EngineSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub assignment_runs: u64,
    pub movement_ticks: u64,
    pub failed_runs: u64,
    pub orders_assigned: usize,
    pub orders_delivered: usize,
}

impl EngineSummary {
    fn started(at: DateTime<Utc>) -> Self {
        Self {
            started_at: at,
            finished_at: at,
            assignment_runs: 0,
            movement_ticks: 0,
            failed_runs: 0,
            orders_assigned: 0,
            orders_delivered: 0,
        }
    }
}

/// 驅動指派與移動兩個循環的排程引擎。
///
/// 每次執行都從 store 開一個新的 session，中途被放棄的執行不會把暫存變更
/// 留給下一次。每種循環各有一把 mutex：同一種循環同時間只會有一個在執行，
/// 指派與移動則可以並行。
pub struct DispatchEngine<S: SessionFactory, G: Geocoder> {
    store: S,
    geocoder: Arc<G>,
    assign_lock: Mutex<()>,
    movement_lock: Mutex<()>,
    create_lock: Mutex<()>,
}

impl<S, G> DispatchEngine<S, G>
where
    S: SessionFactory,
    G: Geocoder,
{
    pub fn new(store: S, geocoder: G) -> Self {
        Self {
            store,
            geocoder: Arc::new(geocoder),
            assign_lock: Mutex::new(()),
            movement_lock: Mutex::new(()),
            create_lock: Mutex::new(()),
        }
    }

    /// 新增一批快遞員並一次提交
    pub async fn seed_couriers(&self, couriers: Vec<Courier>, cancel: &CancellationToken) -> Result<usize> {
        let (_, repository, work) = self.store.open();
        let count = couriers.len();
        for courier in couriers {
            if let Err(e) = repository.add(courier).await {
                work.rollback().await;
                return Err(e);
            }
        }
        work.save_all(cancel).await?;
        tracing::info!("👥 Seeded {} couriers", count);
        Ok(count)
    }

    pub async fn create_order(&self, command: CreateOrderCommand, cancel: &CancellationToken) -> Result<OrderId> {
        let _running = self.create_lock.lock().await;
        let (orders, _, work) = self.store.open();
        CreateOrderHandler::new(orders, Arc::clone(&self.geocoder), work)
            .handle(command, cancel)
            .await
    }

    pub async fn run_assignment_cycle(&self, cancel: &CancellationToken) -> Result<AssignmentOutcome> {
        let _running = self.assign_lock.lock().await;
        let (orders, couriers, work) = self.store.open();
        AssignOrdersHandler::new(orders, couriers, work).handle(cancel).await
    }

    pub async fn run_movement_cycle(&self, cancel: &CancellationToken) -> Result<MovementOutcome> {
        let _running = self.movement_lock.lock().await;
        let (orders, couriers, work) = self.store.open();
        MoveCouriersHandler::new(orders, couriers, work).handle(cancel).await
    }

    pub async fn busy_couriers(&self) -> Result<Vec<CourierView>> {
        let (_, couriers, _) = self.store.open();
        GetBusyCouriersHandler::new(couriers).handle().await
    }

    pub async fn active_orders(&self) -> Result<Vec<OrderView>> {
        let (orders, _, _) = self.store.open();
        GetActiveOrdersHandler::new(orders).handle().await
    }

    /// 是否還有 Created 或 Assigned 的訂單
    pub async fn has_pending_work(&self) -> Result<bool> {
        let (orders, _, _) = self.store.open();
        Ok(!orders.get_all_created().await?.is_empty() || !orders.get_all_assigned().await?.is_empty())
    }

    /// 依排程設定反覆觸發兩個循環，直到取消、達到 tick 上限或（選用）沒有待處理訂單。
    ///
    /// 單次循環失敗只記錄，下一次觸發自然重試。
    pub async fn run(&self, schedule: &SchedulerConfig, cancel: &CancellationToken) -> EngineSummary {
        let mut summary = EngineSummary::started(Utc::now());

        let mut assign_timer = tokio::time::interval(schedule.assign_interval());
        assign_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut move_timer = tokio::time::interval(schedule.move_interval());
        move_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "🚀 Dispatch engine started (assign every {:?}, move every {:?}, max {} ticks)",
            schedule.assign_interval(),
            schedule.move_interval(),
            schedule.max_ticks
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("🛑 Stop requested, leaving scheduler loop");
                    break;
                }
                _ = assign_timer.tick() => {
                    summary.assignment_runs += 1;
                    match self.run_assignment_cycle(cancel).await {
                        Ok(outcome) => summary.orders_assigned += outcome.assigned_count(),
                        Err(e) => {
                            summary.failed_runs += 1;
                            tracing::warn!("Assignment cycle failed, retrying on next trigger: {}", e);
                        }
                    }
                }
                _ = move_timer.tick() => {
                    summary.movement_ticks += 1;
                    match self.run_movement_cycle(cancel).await {
                        Ok(outcome) => summary.orders_delivered += outcome.delivered_count(),
                        Err(e) => {
                            summary.failed_runs += 1;
                            tracing::warn!("Movement cycle failed, retrying on next trigger: {}", e);
                        }
                    }
                    if summary.movement_ticks >= schedule.max_ticks {
                        tracing::info!("⏱️ Reached max ticks ({})", schedule.max_ticks);
                        break;
                    }
                }
            }

            if schedule.stop_when_idle {
                match self.has_pending_work().await {
                    Ok(false) => {
                        tracing::info!("✅ No created or assigned orders left");
                        break;
                    }
                    Ok(true) => {}
                    Err(e) => tracing::warn!("Could not check pending orders: {}", e),
                }
            }
        }

        summary.finished_at = Utc::now();
        tracing::info!(
            "📊 Engine finished: {} assigned, {} delivered, {} ticks, {} failed runs",
            summary.orders_assigned,
            summary.orders_delivered,
            summary.movement_ticks,
            summary.failed_runs
        );
        summary
    }
}
