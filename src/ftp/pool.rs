use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use super::error::FtpError;

/// Opens fresh connections for the pool
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: Send + 'static;

    async fn connect(&self) -> Result<Self::Connection, FtpError>;
}

/// What a waiter receives when it reaches the front of the queue
enum Slot<T> {
    /// An idle connection handed over directly
    Reuse(T),
    /// A freed slot; the waiter opens its own connection
    Open,
}

struct PoolState<T> {
    idle: Vec<T>,
    /// Connections checked out plus idle plus slots reserved for opening
    total: usize,
    waiters: VecDeque<oneshot::Sender<Slot<T>>>,
    closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub max_connections: usize,
    pub total: usize,
    pub idle: usize,
    pub waiting: usize,
}

/// Bounded connection pool with a FIFO wait queue.
///
/// At most `max_connections` connections exist at once. Callers beyond the cap
/// queue up and are served strictly in arrival order as connections are
/// released or discarded. The state lock is never held across an `.await`.
pub struct FtpPool<C: Connector> {
    connector: C,
    max_connections: usize,
    acquire_timeout: Option<Duration>,
    state: Mutex<PoolState<C::Connection>>,
}

impl<C: Connector> FtpPool<C> {
    pub fn new(connector: C, max_connections: usize, acquire_timeout: Option<Duration>) -> Self {
        Self {
            connector,
            max_connections: max_connections.max(1),
            acquire_timeout,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                total: 0,
                waiters: VecDeque::new(),
                closed: false,
            }),
        }
    }

    /// Check out a connection, waiting in line when the pool is exhausted
    pub async fn get_connection(&self) -> Result<C::Connection, FtpError> {
        match self.acquire_timeout {
            Some(limit) => tokio::time::timeout(limit, self.acquire())
                .await
                .map_err(|_| FtpError::Timeout(limit))?,
            None => self.acquire().await,
        }
    }

    /// Borrow a connection, run blocking `op` on it, and hand it back.
    ///
    /// The slot stays accounted for even when the caller is dropped mid-way:
    /// the connection then dies with the blocking task and its slot is freed.
    pub async fn with_connection<T, F>(self: &Arc<Self>, op: F) -> Result<T, FtpError>
    where
        T: Send + 'static,
        F: FnOnce(&mut C::Connection) -> Result<T, FtpError> + Send + 'static,
    {
        let mut conn = self.get_connection().await?;
        let lease = Lease { pool: self.clone(), armed: true };
        let joined = tokio::task::spawn_blocking(move || {
            let result = op(&mut conn);
            (conn, result)
        })
        .await;

        match joined {
            Ok((conn, result)) => {
                match &result {
                    Err(e) if e.is_broken_connection() => {
                        error!("Discarding FTP connection: {}", e);
                        lease.discard(conn);
                    }
                    _ => lease.release(conn),
                }
                result
            }
            // The connection was lost with the task; the lease frees the slot
            Err(e) => Err(FtpError::Io(e.to_string())),
        }
    }

    /// Return a healthy connection; the oldest waiter gets it first
    pub fn release_connection(&self, conn: C::Connection) {
        let mut state = self.lock();
        if state.closed {
            state.total = state.total.saturating_sub(1);
            return;
        }

        let mut conn = conn;
        while let Some(waiter) = state.waiters.pop_front() {
            match waiter.send(Slot::Reuse(conn)) {
                Ok(()) => return,
                // Waiter gave up; try the next one
                Err(Slot::Reuse(returned)) => conn = returned,
                Err(Slot::Open) => return,
            }
        }
        state.idle.push(conn);
    }

    /// Drop a broken connection and pass its slot on
    pub fn discard(&self, conn: C::Connection) {
        drop(conn);
        self.free_slot();
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.lock();
        PoolStatus {
            max_connections: self.max_connections,
            total: state.total,
            idle: state.idle.len(),
            waiting: state.waiters.iter().filter(|w| !w.is_closed()).count(),
        }
    }

    /// Drop idle connections and fail every waiter with `PoolClosed`
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        let idle = state.idle.len();
        state.idle.clear();
        state.total = state.total.saturating_sub(idle);
        state.waiters.clear();
    }

    async fn acquire(&self) -> Result<C::Connection, FtpError> {
        let receiver = {
            let mut state = self.lock();
            if state.closed {
                return Err(FtpError::PoolClosed);
            }
            if let Some(conn) = state.idle.pop() {
                return Ok(conn);
            }
            if state.total < self.max_connections {
                state.total += 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.waiters.retain(|w| !w.is_closed());
                state.waiters.push_back(tx);
                debug!("FTP pool exhausted, {} waiting", state.waiters.len());
                Some(rx)
            }
        };

        let slot = match receiver {
            None => Slot::Open,
            Some(rx) => {
                let mut waiter = Waiter { pool: self, rx: Some(rx) };
                waiter.recv().await?
            }
        };

        match slot {
            Slot::Reuse(conn) => Ok(conn),
            Slot::Open => self.open().await,
        }
    }

    /// Open a connection in a slot already counted in `total`
    async fn open(&self) -> Result<C::Connection, FtpError> {
        let mut reservation = Reservation { pool: self, armed: true };
        let result = self.connector.connect().await;
        if let Err(e) = &result {
            warn!("FTP connect failed: {}", e);
        } else {
            reservation.armed = false;
        }
        result
    }

    /// Give a slot to the oldest live waiter, or shrink the pool
    fn free_slot(&self) {
        let mut state = self.lock();
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.send(Slot::Open).is_ok() {
                return;
            }
        }
        state.total = state.total.saturating_sub(1);
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<C::Connection>> {
        // A panic while holding the lock cannot leave the counters half-updated
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Queue position that returns any slot it was handed if the caller stops waiting
struct Waiter<'a, C: Connector> {
    pool: &'a FtpPool<C>,
    rx: Option<oneshot::Receiver<Slot<C::Connection>>>,
}

impl<C: Connector> Waiter<'_, C> {
    async fn recv(&mut self) -> Result<Slot<C::Connection>, FtpError> {
        let rx = self.rx.as_mut().ok_or(FtpError::PoolClosed)?;
        let slot = rx.await.map_err(|_| FtpError::PoolClosed)?;
        self.rx = None;
        Ok(slot)
    }
}

impl<C: Connector> Drop for Waiter<'_, C> {
    fn drop(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
            match rx.try_recv() {
                Ok(Slot::Reuse(conn)) => self.pool.release_connection(conn),
                Ok(Slot::Open) => self.pool.free_slot(),
                Err(_) => {}
            }
        }
    }
}

/// A checked-out connection's claim on its slot. Dropped without
/// `release`/`discard` (cancelled caller, panicked task) it frees the slot.
struct Lease<C: Connector> {
    pool: Arc<FtpPool<C>>,
    armed: bool,
}

impl<C: Connector> Lease<C> {
    fn release(mut self, conn: C::Connection) {
        self.armed = false;
        self.pool.release_connection(conn);
    }

    fn discard(mut self, conn: C::Connection) {
        self.armed = false;
        self.pool.discard(conn);
    }
}

impl<C: Connector> Drop for Lease<C> {
    fn drop(&mut self) {
        if self.armed {
            debug!("FTP operation abandoned, freeing its slot");
            self.pool.free_slot();
        }
    }
}

/// Frees a reserved slot unless the open succeeded
struct Reservation<'a, C: Connector> {
    pool: &'a FtpPool<C>,
    armed: bool,
}

impl<C: Connector> Drop for Reservation<'_, C> {
    fn drop(&mut self) {
        if self.armed {
            self.pool.free_slot();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeConnector {
        opened: AtomicUsize,
        fail: AtomicBool,
    }

    impl FakeConnector {
        fn new() -> Self {
            Self { opened: AtomicUsize::new(0), fail: AtomicBool::new(false) }
        }
    }

    #[async_trait]
    impl Connector for Arc<FakeConnector> {
        type Connection = usize;

        async fn connect(&self) -> Result<usize, FtpError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(FtpError::Connect("refused".to_string()));
            }
            Ok(self.opened.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    fn pool(max: usize, timeout: Option<Duration>) -> (Arc<FtpPool<Arc<FakeConnector>>>, Arc<FakeConnector>) {
        let connector = Arc::new(FakeConnector::new());
        (Arc::new(FtpPool::new(connector.clone(), max, timeout)), connector)
    }

    #[tokio::test]
    async fn reuses_released_connections() {
        let (pool, connector) = pool(2, None);
        let a = pool.get_connection().await.unwrap();
        pool.release_connection(a);
        let b = pool.get_connection().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(connector.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn never_exceeds_cap() {
        let (pool, connector) = pool(2, Some(Duration::from_millis(50)));
        let _a = pool.get_connection().await.unwrap();
        let _b = pool.get_connection().await.unwrap();
        assert!(matches!(pool.get_connection().await, Err(FtpError::Timeout(_))));
        assert_eq!(connector.opened.load(Ordering::SeqCst), 2);
        let status = pool.status();
        assert_eq!(status.total, 2);
        assert_eq!(status.waiting, 0);
    }

    #[tokio::test]
    async fn waiters_are_served_in_arrival_order() {
        let (pool, _) = pool(1, None);
        let held = pool.get_connection().await.unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..3 {
            let task_pool = pool.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let conn = task_pool.get_connection().await.unwrap();
                order.lock().unwrap().push(i);
                task_pool.release_connection(conn);
            }));
            // Let each task enqueue before spawning the next
            while pool.status().waiting < i + 1 {
                tokio::task::yield_now().await;
            }
        }

        pool.release_connection(held);
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn discard_passes_slot_to_waiter() {
        let (pool, connector) = pool(1, None);
        let broken = pool.get_connection().await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.get_connection().await })
        };
        while pool.status().waiting == 0 {
            tokio::task::yield_now().await;
        }

        pool.discard(broken);
        let fresh = waiter.await.unwrap().unwrap();
        assert_ne!(fresh, broken);
        assert_eq!(connector.opened.load(Ordering::SeqCst), 2);
        assert_eq!(pool.status().total, 1);
    }

    #[tokio::test]
    async fn failed_open_frees_its_slot() {
        let (pool, connector) = pool(1, None);
        connector.fail.store(true, Ordering::SeqCst);
        assert!(matches!(pool.get_connection().await, Err(FtpError::Connect(_))));
        assert_eq!(pool.status().total, 0);

        connector.fail.store(false, Ordering::SeqCst);
        assert!(pool.get_connection().await.is_ok());
    }

    #[tokio::test]
    async fn timed_out_waiter_does_not_swallow_slot() {
        let (pool, _) = pool(1, Some(Duration::from_millis(20)));
        let held = pool.get_connection().await.unwrap();
        assert!(pool.get_connection().await.is_err());

        pool.release_connection(held);
        assert_eq!(pool.status().idle, 1);
        assert_eq!(pool.get_connection().await.unwrap(), held);
    }

    #[tokio::test]
    async fn cancelled_operation_frees_its_slot() {
        let (pool, connector) = pool(1, None);
        let (unblock, stalled) = std::sync::mpsc::channel::<()>();

        let op = pool.with_connection(move |_conn| {
            let _ = stalled.recv();
            Ok(())
        });
        assert!(tokio::time::timeout(Duration::from_millis(50), op).await.is_err());

        let status = pool.status();
        assert_eq!(status.total, 0, "slot still held: {:?}", status);
        let fresh = tokio::time::timeout(Duration::from_secs(1), pool.get_connection())
            .await
            .expect("pool should not be exhausted")
            .unwrap();
        assert_eq!(fresh, 2);
        assert_eq!(connector.opened.load(Ordering::SeqCst), 2);

        unblock.send(()).unwrap();
    }

    #[tokio::test]
    async fn finished_operation_returns_connection() {
        let (pool, _) = pool(1, None);
        let seen = pool.with_connection(|conn| Ok(*conn)).await.unwrap();
        assert_eq!(seen, 1);
        assert_eq!(pool.status().idle, 1);

        let err = pool
            .with_connection(|_| Err::<(), _>(FtpError::Io("reset".to_string())))
            .await
            .unwrap_err();
        assert!(err.is_broken_connection());
        assert_eq!(pool.status().total, 0);
    }

    #[tokio::test]
    async fn closed_pool_rejects_callers() {
        let (pool, _) = pool(1, None);
        let conn = pool.get_connection().await.unwrap();
        pool.release_connection(conn);
        pool.close();
        assert!(matches!(pool.get_connection().await, Err(FtpError::PoolClosed)));
        assert_eq!(pool.status().total, 0);
    }
}
