//! Unbounded job queue with a drainable pending count.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error};

use super::types::PostProcessJob;

/// Jobs enqueued but not yet finished.
#[derive(Debug, Clone)]
struct PendingCounter(Arc<watch::Sender<usize>>);

impl PendingCounter {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self(Arc::new(tx))
    }

    fn increment(&self) {
        self.0.send_modify(|n| *n += 1);
    }

    fn decrement(&self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }

    fn get(&self) -> usize {
        *self.0.borrow()
    }

    async fn wait_for_zero(&self) {
        let mut rx = self.0.subscribe();
        // The sender lives in `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

/// Producer side of the post-processing queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PostProcessQueue {
    tx: mpsc::UnboundedSender<PostProcessJob>,
    pending: PendingCounter,
}

impl PostProcessQueue {
    /// Adds a job. Never blocks.
    ///
    /// If the consumer is gone the job is dropped with an error log and the
    /// pending count is left untouched, so [`drain`](Self::drain) still returns.
    pub fn enqueue(&self, job: PostProcessJob) {
        self.pending.increment();
        debug!(source = %job.source.display(), mode = %job.mode, "Queued post-process job");
        if let Err(mpsc::error::SendError(job)) = self.tx.send(job) {
            error!(
                source = %job.source.display(),
                "Post-process worker is gone, dropping job"
            );
            self.pending.decrement();
        }
    }

    /// Jobs enqueued and not yet finished, including the one in flight.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Waits until every job enqueued so far, and any enqueued while
    /// waiting, has finished.
    pub async fn drain(&self) {
        self.pending.wait_for_zero().await;
    }
}

/// Consumer side of the post-processing queue.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<PostProcessJob>,
    pending: PendingCounter,
}

impl QueueReceiver {
    /// Next job in FIFO order. `None` once every producer is dropped.
    pub(crate) async fn recv(&mut self) -> Option<PostProcessJob> {
        self.rx.recv().await
    }

    /// Marks one received job as finished.
    pub(crate) fn complete(&self) {
        self.pending.decrement();
    }

    /// Takes a queued job without processing it. It counts as finished.
    pub fn try_recv(&mut self) -> Option<PostProcessJob> {
        let job = self.rx.try_recv().ok()?;
        self.pending.decrement();
        Some(job)
    }

    /// Refuses further jobs and discards what is still queued.
    pub(crate) fn close(&mut self) -> usize {
        self.rx.close();
        let mut discarded = 0;
        while self.try_recv().is_some() {
            discarded += 1;
        }
        discarded
    }
}

/// Creates a connected queue handle and receiver.
///
/// Hand the receiver to a [`PostProcessWorker`](super::PostProcessWorker)
/// and keep the queue for enqueueing and draining.
pub fn create_post_process_queue() -> (PostProcessQueue, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = PendingCounter::new();
    (
        PostProcessQueue {
            tx,
            pending: pending.clone(),
        },
        QueueReceiver { rx, pending },
    )
}
