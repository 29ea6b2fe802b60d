use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::job::WorkItem;

/// Producer side of the work queue. Dropping every sender closes the queue.
pub type QueueSender = mpsc::UnboundedSender<WorkItem>;

/// Unbounded FIFO of work items shared by all workers.
///
/// Each item is handed to exactly one caller of [`WorkQueue::next`]. Once
/// the producer is gone and the queue is drained, `next` returns `None`.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<WorkItem>>>,
}

impl WorkQueue {
    pub fn new() -> (QueueSender, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            sender,
            Self {
                receiver: Arc::new(Mutex::new(receiver)),
            },
        )
    }

    /// Take the next item, waiting while the queue is empty but still open
    pub async fn next(&self) -> Option<WorkItem> {
        self.receiver.lock().await.recv().await
    }
}
