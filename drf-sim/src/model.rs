/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core entity model for the DRF simulation: [`Task`], [`Application`], and
//! [`Node`].
//!
//! # Ownership model
//! A [`Task`] is **owned** by the [`crate::engine::Simulation`] for the whole
//! simulation, held in one global `HashMap<TaskId, Task>`. [`Application`]
//! and [`Node`] never hold a second copy — they hold only task ids
//! (`VecDeque<TaskId>` for a pending FIFO, `BTreeSet<TaskId>` for a running
//! set) and look the task up through the global map when they need its
//! fields. This avoids cyclic ownership and keeps invariant auditing to a
//! single source of truth.

use std::collections::{BTreeSet, VecDeque};

use crate::resource::ResourceVector;

/// Task and application identifiers are simple monotonic counters, assigned
/// once at creation and never reused within a simulation.
pub type TaskId = u64;
pub type AppId = u64;
pub type NodeId = u64;

// ── Task ──────────────────────────────────────────────────────────────────────

/// Lifecycle state of a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Finished,
}

/// A single unit of work produced from an [`Application`]'s task prototype.
///
/// Invariant: a task is referenced from exactly one of
/// {its app's `pending_tasks`, its app's `running_tasks`} while `status` is
/// `Pending`/`Running`; once `Finished` it is dropped from the global map
/// entirely.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub app_id: AppId,
    pub requirements: ResourceVector,
    pub duration: f64,
    pub status: TaskStatus,
    /// `None` while `Pending`/`Finished`; `Some(t)` while `Running`.
    pub start_time: Option<f64>,
    /// `None` while `Pending`/`Finished`; `Some(node)` while `Running`.
    pub node_id: Option<NodeId>,
    /// Incremented every time this task is placed. A `TaskFinish` event
    /// stamped with a generation lets the engine tell a finish for the
    /// current placement apart from a stale one left over from before a
    /// preemption — preemption never removes a task from the global map (it
    /// only goes back to `Pending`), so `task_id` alone isn't enough to
    /// detect that the originally scheduled finish no longer applies.
    pub generation: u32,
}

impl Task {
    pub fn new(id: TaskId, app_id: AppId, requirements: ResourceVector, duration: f64) -> Self {
        Task {
            id,
            app_id,
            requirements,
            duration,
            status: TaskStatus::Pending,
            start_time: None,
            node_id: None,
            generation: 0,
        }
    }

    /// Elapsed running time at `current_time`; `0.0` unless `Running`.
    pub fn elapsed(&self, current_time: f64) -> f64 {
        match (self.status, self.start_time) {
            (TaskStatus::Running, Some(start)) => current_time - start,
            _ => 0.0,
        }
    }

    /// Transition `Pending` -> `Running`, recording placement and bumping
    /// `generation` so the finish event scheduled for this placement can be
    /// told apart from any earlier, now-stale one.
    pub fn place(&mut self, current_time: f64, node_id: NodeId) {
        self.status = TaskStatus::Running;
        self.start_time = Some(current_time);
        self.node_id = Some(node_id);
        self.generation += 1;
    }

    /// Transition `Running` -> `Pending`, discarding elapsed work. There is
    /// no checkpointing: a preempted task's progress is not carried over, so
    /// a later re-placement starts its duration over from zero.
    pub fn preempt(&mut self) {
        self.status = TaskStatus::Pending;
        self.start_time = None;
        self.node_id = None;
    }
}

// ── Application ───────────────────────────────────────────────────────────────

/// A task prototype: the requirement vector and duration shared by every task
/// an application submits.
#[derive(Debug, Clone)]
pub struct TaskPrototype {
    pub requirements: ResourceVector,
    pub duration: f64,
}

/// A DRF participant. Tracks its own dominant share `s_i` and aggregate usage
/// `U_i`, updated incrementally as tasks start, finish, or are preempted.
#[derive(Debug, Clone)]
pub struct Application {
    pub id: AppId,
    pub prototype: TaskPrototype,
    /// FIFO of pending task ids; the front is the next placement candidate.
    pub pending_tasks: VecDeque<TaskId>,
    /// Task ids currently running, owned by this application.
    pub running_tasks: BTreeSet<TaskId>,
    /// `U_i` — sum of requirement vectors of running tasks.
    pub u: ResourceVector,
    /// `s_i` — dominant share, `max(U_i / R_total)`.
    pub s: f64,
}

impl Application {
    pub fn new(id: AppId, prototype: TaskPrototype, dim: usize) -> Self {
        Application {
            id,
            prototype,
            pending_tasks: VecDeque::new(),
            running_tasks: BTreeSet::new(),
            u: ResourceVector::zeros(dim),
            s: 0.0,
        }
    }

    /// Recompute `s_i` from the current `U_i` against the cluster total.
    pub fn recompute_share(&mut self, r_total: &ResourceVector) {
        self.s = self.u.dominant_share(r_total);
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// A compute node with a fixed capacity and current usage.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// `R_k` — immutable capacity.
    pub capacity: ResourceVector,
    /// `C_k` — current usage; `0 <= C_k <= R_k` componentwise at every
    /// quiescent point.
    pub usage: ResourceVector,
    pub running_tasks: BTreeSet<TaskId>,
}

impl Node {
    pub fn new(id: NodeId, capacity: ResourceVector) -> Self {
        let dim = capacity.dim();
        Node {
            id,
            capacity,
            usage: ResourceVector::zeros(dim),
            running_tasks: BTreeSet::new(),
        }
    }

    /// `true` if adding `req` to the current usage would still fit within
    /// capacity, componentwise.
    pub fn can_fit(&self, req: &ResourceVector) -> bool {
        self.usage.add(req).le(&self.capacity)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
