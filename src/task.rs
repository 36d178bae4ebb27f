// ABOUTME: Composition root for "runnable with a running flag" (spec §9: composition over inheritance)
// ABOUTME: Every long-running component (dispatcher, pipelines, input replay) owns one of these

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::primitives::MutexCell;

/// Owns a shared running flag plus the join handle of a spawned loop.
/// Concrete components embed a `Task` rather than inheriting behaviour
/// from it; the loop body is responsible for observing `running_flag()`
/// at each iteration.
pub struct Task {
    running: Arc<MutexCell<bool>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Task {
    pub fn new() -> Self {
        Self {
            running: Arc::new(MutexCell::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// A cheaply-cloned handle the loop body checks each iteration.
    pub fn running_flag(&self) -> Arc<MutexCell<bool>> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Spawn `fut` as the task's loop. Calling this while already running
    /// is a programmer error.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.running.get() {
            panic!("Task::spawn called while already running");
        }
        self.running.set(true);
        let handle = tokio::spawn(fut);
        *self.handle.lock().unwrap() = Some(handle);
    }

    /// Idempotent. Flips the running flag so the loop body observes it on
    /// its next iteration, then joins.
    pub async fn stop(&self) {
        if !self.running.get() {
            return;
        }
        self.running.set(false);
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn stop_joins_the_spawned_loop() {
        let task = Task::new();
        let flag = task.running_flag();
        let ticks = Arc::new(AtomicU32::new(0));
        let ticks_clone = Arc::clone(&ticks);

        task.spawn(async move {
            while flag.get() {
                ticks_clone.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
        });

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        task.stop().await;
        assert!(ticks.load(Ordering::SeqCst) > 0);
        assert!(!task.is_running());
    }

    #[tokio::test]
    async fn stop_twice_is_a_no_op() {
        let task = Task::new();
        let flag = task.running_flag();
        task.spawn(async move {
            while flag.get() {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
        });
        task.stop().await;
        task.stop().await;
    }
}
