/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The simulation's event queue.
//!
//! Events are totally ordered by `(time, priority, counter)`: earliest time
//! wins, ties broken by priority (scheduler runs sort after submissions and
//! finishes at the same instant), remaining ties broken by insertion order so
//! the queue is deterministic run to run. `Event` implements `Ord` directly
//! (reversed) rather than wrapping entries in `std::cmp::Reverse`, so the
//! comparison logic lives in one place next to the fields it orders.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::model::{AppId, NodeId, TaskId};

/// What kind of thing happens when an [`Event`] is popped.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// An application submits `num_tasks` new tasks at this instant.
    Submit { app_id: AppId, num_tasks: u32 },
    /// A running task completes. `generation` pins this event to the exact
    /// placement that scheduled it — see [`crate::model::Task::generation`].
    TaskFinish { task_id: TaskId, node_id: NodeId, generation: u32 },
    /// The scheduler evaluates one placement/preemption cycle.
    SchedulerRun,
}

impl EventKind {
    /// Tie-break priority: submissions and finishes (0) are applied before a
    /// scheduler run (1) scheduled for the same instant, so a scheduler run
    /// always sees the state left by every other event at that time.
    fn priority(&self) -> u8 {
        match self {
            EventKind::Submit { .. } | EventKind::TaskFinish { .. } => 0,
            EventKind::SchedulerRun => 1,
        }
    }
}

/// A scheduled occurrence. Ordered by `(time, priority, counter)`, ascending;
/// [`EventQueue`] is a min-heap over this order.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub time: f64,
    pub kind: EventKind,
    /// Monotonic insertion sequence number, assigned by [`EventQueue::push`].
    /// Breaks ties between same-time, same-priority events deterministically.
    counter: u64,
}

impl Event {
    fn key(&self) -> (f64, u8, u64) {
        (self.time, self.kind.priority(), self.counter)
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want pop() to return the
        // smallest (time, priority, counter) triple.
        other
            .key()
            .partial_cmp(&self.key())
            .expect("event keys are always finite")
    }
}

/// A min-priority queue of [`Event`]s.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Event>,
    next_counter: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue { heap: BinaryHeap::new(), next_counter: 0 }
    }

    /// Schedule `kind` to occur at `time`, assigning it the next counter.
    pub fn push(&mut self, time: f64, kind: EventKind) {
        let counter = self.next_counter;
        self.next_counter += 1;
        self.heap.push(Event { time, kind, counter });
    }

    /// Pop the earliest-ordered event, if any.
    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// `true` if a `SchedulerRun` is already queued for exactly `time`.
    ///
    /// Used by the event loop to avoid double-booking a scheduler cycle at
    /// the same instant: a scheduler run is re-triggered only if none is
    /// already pending for this time.
    pub fn has_scheduler_run_at(&self, time: f64) -> bool {
        self.heap
            .iter()
            .any(|e| e.time == time && matches!(e.kind, EventKind::SchedulerRun))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut q = EventQueue::new();
        q.push(5.0, EventKind::SchedulerRun);
        q.push(1.0, EventKind::SchedulerRun);
        q.push(3.0, EventKind::SchedulerRun);
        assert_eq!(q.pop().unwrap().time, 1.0);
        assert_eq!(q.pop().unwrap().time, 3.0);
        assert_eq!(q.pop().unwrap().time, 5.0);
        assert!(q.pop().is_none());
    }

    #[test]
    fn same_time_breaks_tie_by_priority_then_insertion_order() {
        let mut q = EventQueue::new();
        q.push(1.0, EventKind::SchedulerRun);
        q.push(1.0, EventKind::Submit { app_id: 1, num_tasks: 1 });
        q.push(1.0, EventKind::TaskFinish { task_id: 1, node_id: 1, generation: 1 });

        let first = q.pop().unwrap();
        assert!(matches!(first.kind, EventKind::Submit { .. }));
        let second = q.pop().unwrap();
        assert!(matches!(second.kind, EventKind::TaskFinish { .. }));
        let third = q.pop().unwrap();
        assert!(matches!(third.kind, EventKind::SchedulerRun));
    }

    #[test]
    fn has_scheduler_run_at_detects_pending_run() {
        let mut q = EventQueue::new();
        assert!(!q.has_scheduler_run_at(2.0));
        q.push(2.0, EventKind::SchedulerRun);
        assert!(q.has_scheduler_run_at(2.0));
        assert!(!q.has_scheduler_run_at(3.0));
    }

    #[test]
    fn is_empty_reflects_heap_state() {
        let mut q = EventQueue::new();
        assert!(q.is_empty());
        q.push(0.0, EventKind::SchedulerRun);
        assert!(!q.is_empty());
        q.pop();
        assert!(q.is_empty());
    }
}
