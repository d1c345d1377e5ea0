//! Scheduling collaborator.
//!
//! The leave workflow needs exactly one scheduling primitive: run a task
//! once after a delay, with the option to cancel it first. The host supplies
//! the real implementation (a tick scheduler, a runtime timer, a thread);
//! [`ManualScheduler`] here drives tasks by hand for deterministic tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

/// Handle to a scheduled task. `cancel` is idempotent; cancelling a task
/// that already ran is a no-op.
pub trait CancelHandle: Send {
    fn cancel(&self);
}

/// Runs a task once after a delay.
pub trait Scheduler: Send + Sync {
    /// Schedule `task` to run after `delay`.
    ///
    /// The task must never run on the calling thread before this returns;
    /// callers rely on that to install the returned handle under the same
    /// lock the task will take.
    fn schedule_after(
        &self,
        delay: Duration,
        task: Box<dyn FnOnce() + Send>,
    ) -> Box<dyn CancelHandle>;
}

struct ManualTask {
    delay: Duration,
    cancelled: Arc<AtomicBool>,
    task: Box<dyn FnOnce() + Send>,
}

struct ManualHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle for ManualHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Test scheduler: queues tasks and fires them only when told to.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<Vec<ManualTask>>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queued tasks that have not been cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// The delay the next queued task was scheduled with.
    #[must_use]
    pub fn next_delay(&self) -> Option<Duration> {
        self.queue.lock().first().map(|t| t.delay)
    }

    /// Fire the oldest queued task. Cancelled tasks are discarded without
    /// running. Returns whether any task (cancelled or not) was dequeued.
    pub fn fire_next(&self) -> bool {
        // Pop under the lock, run outside it: tasks take their own locks.
        let task = {
            let mut queue = self.queue.lock();
            if queue.is_empty() {
                return false;
            }
            queue.remove(0)
        };
        if !task.cancelled.load(Ordering::SeqCst) {
            (task.task)();
        }
        true
    }

    /// Fire every queued task in order; returns how many actually ran.
    pub fn fire_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = {
                let mut queue = self.queue.lock();
                if queue.is_empty() {
                    break;
                }
                queue.remove(0)
            };
            if !task.cancelled.load(Ordering::SeqCst) {
                (task.task)();
                ran += 1;
            }
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(
        &self,
        delay: Duration,
        task: Box<dyn FnOnce() + Send>,
    ) -> Box<dyn CancelHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.queue.lock().push(ManualTask {
            delay,
            cancelled: Arc::clone(&cancelled),
            task,
        });
        Box::new(ManualHandle { cancelled })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;

    #[test]
    fn test_tasks_run_only_when_fired() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&counter);
        let _handle = scheduler.schedule_after(
            Duration::from_secs(10),
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.next_delay(), Some(Duration::from_secs(10)));
        assert!(scheduler.fire_next());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!scheduler.fire_next());
    }

    #[test]
    fn test_cancelled_tasks_never_run() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&counter);
        let handle = scheduler.schedule_after(
            Duration::from_secs(1),
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        handle.cancel();
        handle.cancel();

        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.fire_all(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
