//! Cancellable delayed tasks on an explicit millisecond clock.
//!
//! Every delay in the engine (stagger offsets, restore settle time, debounced
//! saves) goes through a `Scheduler` owned by the component that needs it.
//! Scheduling hands back a `TaskHandle`; the only way to stop a task is to
//! give that handle back through `cancel`. Because each scheduler lives inside
//! its component, dropping the component drops every task it still had.
//!
//! # Example
//!
//! ```rust
//! use scrollcue::scheduler::Scheduler;
//!
//! let mut scheduler = Scheduler::new();
//! let first = scheduler.schedule(0, 100, "first");
//! let _second = scheduler.schedule(0, 200, "second");
//! assert!(scheduler.cancel(first));
//! assert_eq!(scheduler.due(250), vec!["second"]);
//! ```

use std::collections::BTreeMap;

/// Proof of a scheduled task, needed to cancel it.
#[must_use = "a dropped handle can no longer cancel its task"]
#[derive(Debug, PartialEq, Eq)]
pub struct TaskHandle {
    deadline: u64,
    seq: u64,
}

impl TaskHandle {
    pub fn deadline(&self) -> u64 {
        self.deadline
    }
}

/// Tasks ordered by deadline, then by the order they were scheduled.
#[derive(Debug)]
pub struct Scheduler<T> {
    next_seq: u64,
    queue: BTreeMap<(u64, u64), T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            next_seq: 0,
            queue: BTreeMap::new(),
        }
    }

    /// Schedule `task` to become due `delay_ms` after `now_ms`.
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, task: T) -> TaskHandle {
        let deadline = now_ms.saturating_add(delay_ms);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((deadline, seq), task);
        TaskHandle { deadline, seq }
    }

    /// Cancel a task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.queue.remove(&(handle.deadline, handle.seq)).is_some()
    }

    pub fn is_pending(&self, handle: &TaskHandle) -> bool {
        self.queue.contains_key(&(handle.deadline, handle.seq))
    }

    /// Remove and return every task whose deadline is at or before `now_ms`,
    /// in deadline order. Tasks sharing a deadline come out in schedule order.
    pub fn due(&mut self, now_ms: u64) -> Vec<T> {
        if now_ms == u64::MAX {
            return std::mem::take(&mut self.queue).into_values().collect();
        }
        let later = self.queue.split_off(&(now_ms + 1, 0));
        std::mem::replace(&mut self.queue, later)
            .into_values()
            .collect()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Drop every pending task, returning how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.queue.len();
        self.queue.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Handles owned by one component, disposed together on teardown.
#[derive(Debug, Default)]
pub struct TaskGroup {
    handles: Vec<TaskHandle>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: TaskHandle) {
        self.handles.push(handle);
    }

    /// Forget handles whose tasks have already fired.
    pub fn prune<T>(&mut self, scheduler: &Scheduler<T>) {
        self.handles.retain(|h| scheduler.is_pending(h));
    }

    /// Cancel every task still pending, returning how many were cancelled.
    pub fn dispose<T>(&mut self, scheduler: &mut Scheduler<T>) -> usize {
        self.handles
            .drain(..)
            .map(|h| scheduler.cancel(h))
            .filter(|cancelled| *cancelled)
            .count()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_returns_tasks_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        let _c = scheduler.schedule(0, 300, 'c');
        let _a = scheduler.schedule(0, 100, 'a');
        let _b = scheduler.schedule(0, 200, 'b');

        assert!(scheduler.due(99).is_empty());
        assert_eq!(scheduler.due(200), vec!['a', 'b']);
        assert_eq!(scheduler.next_deadline(), Some(300));
        assert_eq!(scheduler.due(1000), vec!['c']);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_equal_deadlines_keep_schedule_order() {
        let mut scheduler = Scheduler::new();
        for i in 0..5 {
            let _ = scheduler.schedule(10, 0, i);
        }
        assert_eq!(scheduler.due(10), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cancel_after_fire_reports_false() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(0, 10, ());
        assert_eq!(scheduler.due(10).len(), 1);
        assert!(!scheduler.cancel(handle));
    }

    #[test]
    fn test_group_dispose_cancels_only_pending() {
        let mut scheduler = Scheduler::new();
        let mut group = TaskGroup::new();
        group.push(scheduler.schedule(0, 10, 1));
        group.push(scheduler.schedule(0, 20, 2));
        group.push(scheduler.schedule(0, 30, 3));

        assert_eq!(scheduler.due(10), vec![1]);
        group.prune(&scheduler);
        assert_eq!(group.len(), 2);

        assert_eq!(group.dispose(&mut scheduler), 2);
        assert!(group.is_empty());
        assert!(scheduler.is_empty());
    }
}
