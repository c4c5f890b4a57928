//! Types for the worker pool module.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use super::PoolError;

/// Snapshot of a worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Pool name (used as the thread/log label).
    pub name: String,
    /// Maximum concurrent tasks.
    pub workers: usize,
    /// Maximum queued tasks.
    pub queue_capacity: usize,
    /// Tasks currently running.
    pub active_tasks: usize,
    /// Tasks accepted but not yet picked up by a worker.
    pub queued_tasks: usize,
    /// Tasks that ran to completion since startup.
    pub total_completed: u64,
    /// Tasks that panicked since startup.
    pub total_panicked: u64,
    /// Submissions refused because the backlog was full.
    pub total_rejected: u64,
    /// Whether the pool still accepts submissions.
    pub accepting: bool,
}

/// Completion handle for a single submitted task.
///
/// Resolves with the task's output once it has run. If the task panicked the
/// handle resolves to [`PoolError::TaskPanicked`].
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> TaskHandle<T> {
    pub(super) fn new(rx: oneshot::Receiver<T>) -> Self {
        Self { rx }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, PoolError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // The sender is only dropped without a value when the task unwound.
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| PoolError::TaskPanicked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_resolves_with_value() {
        let (tx, rx) = oneshot::channel();
        let handle = TaskHandle::new(rx);
        tx.send(7).unwrap();
        assert_eq!(handle.await.unwrap(), 7);
    }

    #[test]
    fn test_handle_is_pending_until_value_is_sent() {
        let (tx, rx) = oneshot::channel();
        let mut handle = tokio_test::task::spawn(TaskHandle::new(rx));

        tokio_test::assert_pending!(handle.poll());

        tx.send("done").unwrap();
        assert!(handle.is_woken());
        let value = tokio_test::assert_ready_ok!(handle.poll());
        assert_eq!(value, "done");
    }

    #[tokio::test]
    async fn test_handle_reports_dropped_sender_as_panic() {
        let (tx, rx) = oneshot::channel::<u32>();
        let handle = TaskHandle::new(rx);
        drop(tx);
        assert!(matches!(handle.await, Err(PoolError::TaskPanicked)));
    }

    #[test]
    fn test_pool_status_serializes() {
        let status = PoolStatus {
            name: "items".to_string(),
            workers: 10,
            queue_capacity: 100,
            active_tasks: 3,
            queued_tasks: 1,
            total_completed: 42,
            total_panicked: 0,
            total_rejected: 2,
            accepting: true,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["workers"], 10);
        assert_eq!(json["active_tasks"], 3);
        assert_eq!(json["accepting"], true);
    }
}
