//! Bounded worker pool for deferred answer tasks.
//!
//! Answer computation runs off the request's critical path, but the pool
//! tracks every spawned task so the gateway can await completion before the
//! process exits. Without that drain, a hosting environment that kills the
//! process right after the HTTP response would drop in-flight answers.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinHandle;

/// Bounded pool: at most `permits` tasks run concurrently; the rest queue on
/// the semaphore. Handles are retained until [`TaskPool::drain`].
#[derive(Clone)]
pub struct TaskPool {
    semaphore: Arc<Semaphore>,
    tasks: Arc<RwLock<Vec<JoinHandle<()>>>>,
}

impl TaskPool {
    pub fn new(permits: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(permits.max(1))),
            tasks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Spawn a task onto the pool. The permit is acquired inside the spawned
    /// task so submission never blocks the caller.
    pub async fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        let handle = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                log::warn!("worker pool closed, dropping task");
                return;
            };
            fut.await;
        });
        let mut g = self.tasks.write().await;
        g.retain(|h| !h.is_finished());
        g.push(handle);
    }

    /// Await all outstanding tasks. Called on gateway shutdown so deferred
    /// deliveries finish before the process ends.
    pub async fn drain(&self) {
        let handles = {
            let mut g = self.tasks.write().await;
            std::mem::take(&mut *g)
        };
        for h in handles {
            let _ = h.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn drain_waits_for_all_tasks() {
        let pool = TaskPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let counter = counter.clone();
            pool.spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        }
        pool.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn concurrency_is_bounded_by_permits() {
        let pool = TaskPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        for _ in 0..6 {
            let running = running.clone();
            let peak = peak.clone();
            pool.spawn(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
            .await;
        }
        pool.drain().await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn zero_permits_is_clamped_to_one() {
        let pool = TaskPool::new(0);
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        pool.spawn(async move {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        pool.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
