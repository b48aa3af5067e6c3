//! In-process main-thread scheduler.
//!
//! [`TickScheduler`] is a [`Scheduler`] driven by whoever calls
//! [`tick`](TickScheduler::tick). That caller is the main thread: tasks never
//! run concurrently with each other.
//!
//! Tasks are keyed by `(due_tick, sequence)`, so tasks due on the same tick
//! run in submission order. A task posted while a tick is running is due on
//! the next tick at the earliest.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{error, trace};

use crate::integration::host::{Scheduler, Task};

#[derive(Default)]
struct Queue {
    tasks: BTreeMap<(u64, u64), Task>,
    next_seq: u64,
}

/// A tick-driven, single-consumer task queue.
#[derive(Default)]
pub struct TickScheduler {
    queue: Mutex<Queue>,
    current_tick: AtomicU64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of the last tick that ran.
    pub fn current_tick(&self) -> u64 {
        self.current_tick.load(Ordering::Acquire)
    }

    /// Number of tasks not yet run.
    pub fn pending(&self) -> usize {
        self.queue.lock().tasks.len()
    }

    fn schedule(&self, delay: u64, task: Task) {
        let due = self.current_tick().saturating_add(delay.max(1));
        let mut queue = self.queue.lock();
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.tasks.insert((due, seq), task);
    }

    /// Advances one tick and runs every task due on it.
    ///
    /// Returns the number of tasks run. A panicking task is logged and the
    /// remaining tasks still run.
    pub fn tick(&self) -> usize {
        let now = self.current_tick.fetch_add(1, Ordering::AcqRel) + 1;
        let due = {
            let mut queue = self.queue.lock();
            let later = queue.tasks.split_off(&(now + 1, 0));
            std::mem::replace(&mut queue.tasks, later)
        };

        let count = due.len();
        if count > 0 {
            trace!(tick = now, tasks = count, "Running main-thread tasks");
        }
        for ((_, seq), task) in due {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(task)) {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(tick = now, task = seq, panic = %message, "Main-thread task panicked");
            }
        }
        count
    }

    /// Runs `ticks` ticks, returning the total number of tasks run.
    pub fn advance(&self, ticks: u64) -> usize {
        (0..ticks).map(|_| self.tick()).sum()
    }

    /// Ticks until the queue is empty or `max_ticks` have elapsed.
    pub fn run_until_idle(&self, max_ticks: u64) -> usize {
        let mut total = 0;
        for _ in 0..max_ticks {
            if self.pending() == 0 {
                break;
            }
            total += self.tick();
        }
        total
    }
}

impl Scheduler for TickScheduler {
    fn run_on_main_thread(&self, task: Task) {
        self.schedule(1, task);
    }

    fn run_on_main_thread_after(&self, ticks: u64, task: Task) {
        self.schedule(ticks, task);
    }
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("current_tick", &self.current_tick())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log2 = Arc::clone(&log);
        let make = move |name: &'static str| -> Task {
            let log = Arc::clone(&log2);
            Box::new(move || log.lock().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_immediate_tasks_run_in_order() {
        let scheduler = TickScheduler::new();
        let (log, task) = recorder();
        scheduler.run_on_main_thread(task("a"));
        scheduler.run_on_main_thread(task("b"));
        assert_eq!(scheduler.pending(), 2);

        assert_eq!(scheduler.tick(), 2);
        assert_eq!(*log.lock(), vec!["a", "b"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_delayed_task_runs_on_due_tick() {
        let scheduler = TickScheduler::new();
        let (log, task) = recorder();
        scheduler.run_on_main_thread_after(3, task("late"));
        scheduler.run_on_main_thread(task("now"));

        assert_eq!(scheduler.tick(), 1);
        assert_eq!(scheduler.tick(), 0);
        assert!(!log.lock().contains(&"late"));
        assert_eq!(scheduler.tick(), 1);
        assert_eq!(*log.lock(), vec!["now", "late"]);
        assert_eq!(scheduler.current_tick(), 3);
    }

    #[test]
    fn test_task_posted_during_tick_runs_next_tick() {
        let scheduler = Arc::new(TickScheduler::new());
        let (log, task) = recorder();
        let inner = task("inner");
        let sched = Arc::clone(&scheduler);
        scheduler.run_on_main_thread(Box::new(move || sched.run_on_main_thread(inner)));

        assert_eq!(scheduler.tick(), 1);
        assert!(log.lock().is_empty());
        assert_eq!(scheduler.tick(), 1);
        assert_eq!(*log.lock(), vec!["inner"]);
    }

    #[test]
    fn test_panic_is_contained() {
        let scheduler = TickScheduler::new();
        let (log, task) = recorder();
        scheduler.run_on_main_thread(Box::new(|| panic!("boom")));
        scheduler.run_on_main_thread(task("after"));

        assert_eq!(scheduler.tick(), 2);
        assert_eq!(*log.lock(), vec!["after"]);
    }

    #[test]
    fn test_run_until_idle() {
        let scheduler = TickScheduler::new();
        let (log, task) = recorder();
        scheduler.run_on_main_thread_after(5, task("x"));
        assert_eq!(scheduler.run_until_idle(100), 1);
        assert_eq!(*log.lock(), vec!["x"]);
        assert_eq!(scheduler.current_tick(), 5);
    }
}
