// SPDX-License-Identifier: MIT

//! Execution contexts for in-flight effects
//!
//! A store polls each new effect once on the calling thread; whatever is left
//! afterwards is handed to the store's [`Scheduler`]. Values the effect emits
//! later are always sent back through the store, so the scheduler decides
//! where effects run but never where state is mutated.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::{EnterGuard, Handle};

use super::error::{ReflowError, Result};

/// Drives effect tasks to completion
pub trait Scheduler: Send + Sync + 'static {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Take ownership of a task and run it to completion
    fn spawn(&self, task: BoxFuture<'static, ()>);

    /// Runtime context to enter while an effect is polled on the caller's thread
    fn enter(&self) -> Option<EnterGuard<'_>> {
        None
    }

    /// Drive queued tasks on the calling thread until none can make progress
    ///
    /// Returns the number of tasks that completed. Schedulers that own their
    /// executor have nothing to drive and return 0.
    fn run_until_stalled(&self) -> usize {
        0
    }
}

/// Runs effects as tasks on a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is currently running on
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| ReflowError::NoRuntime)
    }
}

impl Scheduler for TokioScheduler {
    fn name(&self) -> &str {
        "tokio"
    }

    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.handle.spawn(task);
    }

    fn enter(&self) -> Option<EnterGuard<'_>> {
        Some(self.handle.enter())
    }
}

/// Queues effects and runs them on whichever thread calls
/// [`Scheduler::run_until_stalled`]
///
/// Useful for single-threaded hosts and for tests that want to step effects
/// deterministically. Tasks are polled with a no-op waker, so effects that
/// need a tokio reactor (timers, sockets) belong on a [`TokioScheduler`].
#[derive(Default)]
pub struct CurrentThreadScheduler {
    queue: Mutex<Vec<BoxFuture<'static, ()>>>,
}

impl CurrentThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to be driven
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

impl Scheduler for CurrentThreadScheduler {
    fn name(&self) -> &str {
        "current_thread"
    }

    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.queue.lock().push(task);
    }

    fn run_until_stalled(&self) -> usize {
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut completed = 0;

        loop {
            // The lock is released while polling: tasks deliver actions,
            // and those may spawn further tasks on this scheduler.
            let batch = std::mem::take(&mut *self.queue.lock());
            if batch.is_empty() {
                break;
            }

            let mut progressed = false;
            let mut parked = Vec::with_capacity(batch.len());
            for mut task in batch {
                match Pin::new(&mut task).poll(&mut cx) {
                    Poll::Ready(()) => {
                        completed += 1;
                        progressed = true;
                    }
                    Poll::Pending => parked.push(task),
                }
            }

            let mut queue = self.queue.lock();
            let spawned = std::mem::take(&mut *queue);
            progressed |= !spawned.is_empty();
            *queue = parked;
            queue.extend(spawned);

            if !progressed {
                break;
            }
        }

        completed
    }
}

impl fmt::Debug for CurrentThreadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentThreadScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Shared handle to a scheduler
pub type SharedScheduler = Arc<dyn Scheduler>;

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_tokio_current_outside_runtime() {
        assert!(matches!(
            TokioScheduler::current(),
            Err(ReflowError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn test_tokio_spawn_runs_task() {
        let scheduler = TokioScheduler::current().unwrap();
        let (tx, rx) = oneshot::channel();
        scheduler.spawn(Box::pin(async move {
            let _ = tx.send(7);
        }));
        assert_eq!(rx.await.unwrap(), 7);
        assert_eq!(scheduler.run_until_stalled(), 0);
    }

    #[test]
    fn test_current_thread_runs_ready_tasks() {
        let scheduler = CurrentThreadScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let runs = runs.clone();
            scheduler.spawn(Box::pin(async move {
                runs.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(scheduler.pending(), 3);
        assert_eq!(scheduler.run_until_stalled(), 3);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_current_thread_parks_pending_tasks() {
        let scheduler = CurrentThreadScheduler::new();
        let (tx, rx) = oneshot::channel::<()>();
        scheduler.spawn(Box::pin(async move {
            let _ = rx.await;
        }));

        assert_eq!(scheduler.run_until_stalled(), 0);
        assert_eq!(scheduler.pending(), 1);

        tx.send(()).unwrap();
        assert_eq!(scheduler.run_until_stalled(), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_current_thread_runs_tasks_spawned_while_running() {
        let scheduler = Arc::new(CurrentThreadScheduler::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let inner_scheduler = scheduler.clone();
        let inner_runs = runs.clone();
        scheduler.spawn(Box::pin(async move {
            let runs = inner_runs.clone();
            inner_scheduler.spawn(Box::pin(async move {
                runs.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        assert_eq!(scheduler.run_until_stalled(), 2);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
