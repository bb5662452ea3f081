use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::{Notify, Semaphore};

/// Unbounded FIFO work queue with completion tracking.
///
/// `push` enqueues an item and raises the pending count; `task_done` lowers
/// it once the item has been fully processed, children included in the count
/// through their own `push` calls. `join` resolves when the pending count
/// reaches zero, i.e. when every discovered item has been processed even if
/// processing it failed.
///
/// The semaphore mirrors the queue length exactly, so a popped permit always
/// corresponds to a queued item and blocked consumers cannot miss a wakeup.
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Semaphore,
    pending: AtomicUsize,
    done: Notify,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Semaphore::new(0),
            pending: AtomicUsize::new(0),
            done: Notify::new(),
        }
    }

    pub fn push(&self, item: T) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.items
            .lock()
            .expect("work queue mutex poisoned")
            .push_back(item);
        self.available.add_permits(1);
    }

    /// Dequeue the next item, waiting while the queue is empty. Returns
    /// `None` once the queue has been closed.
    pub async fn pop(&self) -> Option<T> {
        let permit = self.available.acquire().await.ok()?;
        permit.forget();

        let item = self
            .items
            .lock()
            .expect("work queue mutex poisoned")
            .pop_front()
            .expect("semaphore permit without a queued item");
        Some(item)
    }

    /// Mark one previously popped item as fully processed.
    pub fn task_done(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.done.notify_waiters();
        }
    }

    /// Wait until every pushed item has been processed.
    pub async fn join(&self) {
        loop {
            let notified = self.done.notified();
            tokio::pin!(notified);
            // Register interest before checking the counter so a concurrent
            // final task_done cannot slip between check and sleep.
            notified.as_mut().enable();

            if self.pending.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Close the queue; blocked and future `pop` calls return `None`.
    pub fn close(&self) {
        self.available.close();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.lock().expect("work queue mutex poisoned").len()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn fifo_order() {
        let queue = WorkQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(queue.pop().await, Some(2));
        assert_eq!(queue.pop().await, Some(3));
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn pop_returns_none_after_close() {
        let queue: WorkQueue<u32> = WorkQueue::new();
        queue.close();
        assert_eq!(queue.pop().await, None);
    }

    #[tokio::test]
    async fn join_waits_for_in_flight_items() {
        let queue = Arc::new(WorkQueue::new());
        queue.push(0u32);

        let worker_queue = Arc::clone(&queue);
        let worker = tokio::spawn(async move {
            while let Some(item) = worker_queue.pop().await {
                // Each popped item enqueues one child until the depth limit
                if item < 3 {
                    worker_queue.push(item + 1);
                }
                worker_queue.task_done();
            }
        });

        queue.join().await;
        assert_eq!(queue.len(), 0);

        queue.close();
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn join_returns_immediately_when_idle() {
        let queue: WorkQueue<u32> = WorkQueue::new();
        queue.join().await;
    }
}
