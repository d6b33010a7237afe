use crate::domain::model::{Courier, CourierId, CourierStatus, Order, OrderId, OrderStatus};
use crate::domain::ports::{CourierRepository, OrderRepository, SessionFactory, UnitOfWork};
use crate::utils::error::{DispatchError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// 保留插入順序的資料表
#[derive(Debug)]
struct Table<K, V> {
    rows: HashMap<K, V>,
    sequence: Vec<K>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            sequence: Vec::new(),
        }
    }
}

impl<K: Copy + Eq + Hash, V: Clone> Table<K, V> {
    fn contains(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    fn upsert(&mut self, key: K, value: V) {
        if self.rows.insert(key, value).is_none() {
            self.sequence.push(key);
        }
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn clear(&mut self) {
        self.rows.clear();
        self.sequence.clear();
    }

    fn drain_into(&mut self, target: &mut Table<K, V>) {
        for key in self.sequence.drain(..) {
            if let Some(value) = self.rows.remove(&key) {
                target.upsert(key, value);
            }
        }
        self.rows.clear();
    }
}

/// 已提交資料疊加暫存變更後的視圖
fn overlay<K: Copy + Eq + Hash, V: Clone>(committed: &Table<K, V>, staged: &Table<K, V>) -> Vec<V> {
    let mut values: Vec<V> = committed
        .sequence
        .iter()
        .filter_map(|key| staged.rows.get(key).or_else(|| committed.rows.get(key)))
        .cloned()
        .collect();

    values.extend(
        staged
            .sequence
            .iter()
            .filter(|key| !committed.contains(key))
            .filter_map(|key| staged.rows.get(key))
            .cloned(),
    );
    values
}

fn lookup<K: Copy + Eq + Hash, V: Clone>(
    committed: &Table<K, V>,
    staged: &Table<K, V>,
    key: &K,
) -> Option<V> {
    staged
        .rows
        .get(key)
        .or_else(|| committed.rows.get(key))
        .cloned()
}

#[derive(Debug, Default)]
struct Committed {
    orders: Table<OrderId, Order>,
    couriers: Table<CourierId, Courier>,
    fail_next_commit: Option<String>,
    commits: usize,
}

#[derive(Debug, Default)]
struct Staged {
    orders: Table<OrderId, Order>,
    couriers: Table<CourierId, Courier>,
}

impl Staged {
    fn clear(&mut self) {
        self.orders.clear();
        self.couriers.clear();
    }

    fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.couriers.is_empty()
    }
}

/// 記憶體內的儲存區，保存已提交的訂單與快遞員。
///
/// 讀寫都透過 [`InMemorySession`]：每個 session 有自己的暫存區，
/// `add`/`update` 只寫入暫存區，直到該 session 的 `save_all` 才一次套用。
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    committed: Arc<Mutex<Committed>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> InMemorySession {
        InMemorySession {
            committed: Arc::clone(&self.committed),
            staged: Arc::new(Mutex::new(Staged::default())),
        }
    }

    /// 讓下一次提交失敗（測試 all-or-nothing 用）
    pub async fn fail_next_commit(&self, reason: impl Into<String>) {
        self.committed.lock().await.fail_next_commit = Some(reason.into());
    }

    pub async fn committed_order(&self, id: OrderId) -> Option<Order> {
        self.committed.lock().await.orders.rows.get(&id).cloned()
    }

    pub async fn committed_courier(&self, id: CourierId) -> Option<Courier> {
        self.committed.lock().await.couriers.rows.get(&id).cloned()
    }

    pub async fn committed_orders(&self) -> Vec<Order> {
        let committed = self.committed.lock().await;
        overlay(&committed.orders, &Table::default())
    }

    pub async fn committed_couriers(&self) -> Vec<Courier> {
        let committed = self.committed.lock().await;
        overlay(&committed.couriers, &Table::default())
    }

    pub async fn commit_count(&self) -> usize {
        self.committed.lock().await.commits
    }
}

impl SessionFactory for InMemoryStore {
    type Orders = InMemoryOrderRepository;
    type Couriers = InMemoryCourierRepository;
    type Work = InMemoryUnitOfWork;

    fn open(&self) -> (Self::Orders, Self::Couriers, Self::Work) {
        let session = self.session();
        (session.orders(), session.couriers(), session.unit_of_work())
    }
}

/// 一個暫存區加上共用的已提交資料。鎖的順序固定為先 committed 後 staged。
#[derive(Debug, Clone)]
pub struct InMemorySession {
    committed: Arc<Mutex<Committed>>,
    staged: Arc<Mutex<Staged>>,
}

impl InMemorySession {
    pub fn orders(&self) -> InMemoryOrderRepository {
        InMemoryOrderRepository {
            session: self.clone(),
        }
    }

    pub fn couriers(&self) -> InMemoryCourierRepository {
        InMemoryCourierRepository {
            session: self.clone(),
        }
    }

    pub fn unit_of_work(&self) -> InMemoryUnitOfWork {
        InMemoryUnitOfWork {
            session: self.clone(),
        }
    }

    pub async fn has_staged_changes(&self) -> bool {
        !self.staged.lock().await.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryOrderRepository {
    session: InMemorySession,
}

impl InMemoryOrderRepository {
    async fn with_status(&self, status: OrderStatus) -> Vec<Order> {
        let committed = self.session.committed.lock().await;
        let staged = self.session.staged.lock().await;
        overlay(&committed.orders, &staged.orders)
            .into_iter()
            .filter(|o| o.status() == status)
            .collect()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn add(&self, order: Order) -> Result<()> {
        let committed = self.session.committed.lock().await;
        let mut staged = self.session.staged.lock().await;
        let id = order.id();
        if committed.orders.contains(&id) || staged.orders.contains(&id) {
            return Err(DispatchError::StorageError {
                message: format!("order {} already exists", id),
            });
        }
        staged.orders.upsert(id, order);
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let committed = self.session.committed.lock().await;
        let mut staged = self.session.staged.lock().await;
        let id = order.id();
        if !committed.orders.contains(&id) && !staged.orders.contains(&id) {
            return Err(DispatchError::not_found(format!("order {}", id)));
        }
        staged.orders.upsert(id, order.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let committed = self.session.committed.lock().await;
        let staged = self.session.staged.lock().await;
        Ok(lookup(&committed.orders, &staged.orders, &id))
    }

    async fn get_all_created(&self) -> Result<Vec<Order>> {
        Ok(self.with_status(OrderStatus::Created).await)
    }

    async fn get_all_assigned(&self) -> Result<Vec<Order>> {
        Ok(self.with_status(OrderStatus::Assigned).await)
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryCourierRepository {
    session: InMemorySession,
}

impl InMemoryCourierRepository {
    async fn with_status(&self, status: CourierStatus) -> Vec<Courier> {
        let committed = self.session.committed.lock().await;
        let staged = self.session.staged.lock().await;
        overlay(&committed.couriers, &staged.couriers)
            .into_iter()
            .filter(|c| c.status() == status)
            .collect()
    }
}

#[async_trait]
impl CourierRepository for InMemoryCourierRepository {
    async fn add(&self, courier: Courier) -> Result<()> {
        let committed = self.session.committed.lock().await;
        let mut staged = self.session.staged.lock().await;
        let id = courier.id();
        if committed.couriers.contains(&id) || staged.couriers.contains(&id) {
            return Err(DispatchError::StorageError {
                message: format!("courier {} already exists", id),
            });
        }
        staged.couriers.upsert(id, courier);
        Ok(())
    }

    async fn update(&self, courier: &Courier) -> Result<()> {
        let committed = self.session.committed.lock().await;
        let mut staged = self.session.staged.lock().await;
        let id = courier.id();
        if !committed.couriers.contains(&id) && !staged.couriers.contains(&id) {
            return Err(DispatchError::not_found(format!("courier {}", id)));
        }
        staged.couriers.upsert(id, courier.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: CourierId) -> Result<Option<Courier>> {
        let committed = self.session.committed.lock().await;
        let staged = self.session.staged.lock().await;
        Ok(lookup(&committed.couriers, &staged.couriers, &id))
    }

    async fn get_all_free(&self) -> Result<Vec<Courier>> {
        Ok(self.with_status(CourierStatus::Free).await)
    }

    async fn get_all_busy(&self) -> Result<Vec<Courier>> {
        Ok(self.with_status(CourierStatus::Busy).await)
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryUnitOfWork {
    session: InMemorySession,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn save_all(&self, cancel: &CancellationToken) -> Result<()> {
        let mut committed = self.session.committed.lock().await;
        let mut staged = self.session.staged.lock().await;

        if cancel.is_cancelled() {
            staged.clear();
            return Err(DispatchError::Cancelled);
        }

        if let Some(reason) = committed.fail_next_commit.take() {
            staged.clear();
            return Err(DispatchError::CommitError { message: reason });
        }

        let Staged { orders, couriers } = &mut *staged;
        orders.drain_into(&mut committed.orders);
        couriers.drain_into(&mut committed.couriers);
        committed.commits += 1;

        tracing::debug!("In-memory commit #{} applied", committed.commits);
        Ok(())
    }

    async fn rollback(&self) {
        self.session.staged.lock().await.clear();
    }
}
