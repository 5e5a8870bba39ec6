//! Membership set of connected viewers.
//!
//! Each viewer owns a bounded queue of outbound text frames. The
//! broadcast loop pushes into the queue without waiting; the viewer's
//! socket task drains it. A push that fails because the queue is closed
//! (the socket task exited) or full (the viewer cannot keep up) evicts the
//! viewer. There are no retries.
//!
//! Delivery clones the member list under a short read lock and releases
//! it before sending, so `add_viewer` and `remove_viewer` never wait on an
//! in-flight broadcast.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

/// Default number of frames a viewer may fall behind before eviction.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Opaque handle identifying one viewer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewerId(Uuid);

impl ViewerId {
    /// Create a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ViewerId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ViewerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a newly registered viewer receives: its id and the receiving end
/// of its frame queue.
#[derive(Debug)]
pub struct ViewerHandle {
    /// Registry key for this viewer.
    pub id: ViewerId,
    /// Frames broadcast to this viewer.
    pub receiver: mpsc::Receiver<Arc<str>>,
}

/// Outcome of delivering one frame to every member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    /// Viewers whose queue accepted the frame.
    pub delivered: usize,
    /// Viewers removed because the frame could not be queued.
    pub evicted: usize,
}

/// Concurrent set of connected viewers.
#[derive(Debug)]
pub struct ViewerRegistry {
    viewers: RwLock<BTreeMap<ViewerId, mpsc::Sender<Arc<str>>>>,
    queue_capacity: usize,
}

impl ViewerRegistry {
    /// Create an empty registry. A capacity of zero is raised to one.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            viewers: RwLock::new(BTreeMap::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Register a new viewer and return its handle.
    pub async fn add_viewer(&self) -> ViewerHandle {
        let (tx, receiver) = mpsc::channel(self.queue_capacity);
        let id = ViewerId::new();
        let count = {
            let mut viewers = self.viewers.write().await;
            viewers.insert(id, tx);
            viewers.len()
        };
        debug!(viewer = %id, viewers = count, "Viewer registered");
        ViewerHandle { id, receiver }
    }

    /// Remove a viewer. Returns `false` if it was already gone.
    pub async fn remove_viewer(&self, id: ViewerId) -> bool {
        let mut viewers = self.viewers.write().await;
        viewers.remove(&id).is_some()
    }

    /// Number of registered viewers.
    pub async fn len(&self) -> usize {
        self.viewers.read().await.len()
    }

    /// Whether no viewers are registered.
    pub async fn is_empty(&self) -> bool {
        self.viewers.read().await.is_empty()
    }

    /// Whether `id` is currently registered.
    pub async fn contains(&self, id: ViewerId) -> bool {
        self.viewers.read().await.contains_key(&id)
    }

    /// Queue `frame` for every viewer, evicting those that cannot take it.
    pub async fn deliver(&self, frame: Arc<str>) -> DeliveryReport {
        let members: Vec<(ViewerId, mpsc::Sender<Arc<str>>)> = {
            let viewers = self.viewers.read().await;
            viewers.iter().map(|(id, tx)| (*id, tx.clone())).collect()
        };

        let mut report = DeliveryReport::default();
        let mut failed = Vec::new();

        for (id, tx) in members {
            match tx.try_send(Arc::clone(&frame)) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(viewer = %id, "Viewer queue full, evicting");
                    failed.push(id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(viewer = %id, "Viewer channel closed, evicting");
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut viewers = self.viewers.write().await;
            for id in &failed {
                if viewers.remove(id).is_some() {
                    report.evicted = report.evicted.saturating_add(1);
                }
            }
        }

        report
    }
}

impl Default for ViewerRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
