/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The simulation engine: construction, the event loop, and the DRF
//! scheduling cycle.
//!
//! `Simulation` is the sole owner of every [`Task`] for the run, held in one
//! `HashMap<TaskId, Task>`; [`Node`]s and [`Application`]s hold only task
//! ids, so there is exactly one source of truth for node and task state.

pub mod error;
pub mod preemption;

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::event::{Event, EventKind, EventQueue};
use crate::model::{AppId, Application, Node, NodeId, Task, TaskId, TaskPrototype, TaskStatus};
use crate::resource::ResourceVector;
use error::{BuildError, EngineError};

/// Input node description for [`Simulation::new`].
pub struct NodeSpec {
    pub id: NodeId,
    pub capacity: ResourceVector,
}

/// Input application description for [`Simulation::new`].
pub struct AppSpec {
    pub id: AppId,
    pub requirements: ResourceVector,
    pub duration: f64,
}

/// A scheduled submission: `num_tasks` new tasks from `app_id`'s prototype,
/// injected at `time`.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionSpec {
    pub time: f64,
    pub app_id: AppId,
    pub num_tasks: u32,
}

/// Preemption tuning weights: gain weight `alpha`, cost weight `beta`, and
/// the minimum-gain tolerance `epsilon`.
#[derive(Debug, Clone, Copy)]
pub struct PreemptionTuning {
    pub alpha: f64,
    pub beta: f64,
    pub epsilon: f64,
}

/// The discrete-event simulation engine.
pub struct Simulation {
    nodes: BTreeMap<NodeId, Node>,
    apps: BTreeMap<AppId, Application>,
    tasks: HashMap<TaskId, Task>,
    events: EventQueue,
    current_time: f64,
    r_total: ResourceVector,
    next_task_id: TaskId,
    dim: usize,
    alpha: f64,
    beta: f64,
    epsilon: f64,
}

impl Simulation {
    /// Build a new simulation. Validates dimension consistency, id
    /// uniqueness, and tuning-parameter ranges before accepting any of it;
    /// every failure mode maps onto a [`BuildError`] variant.
    pub fn new(
        nodes: Vec<NodeSpec>,
        applications: Vec<AppSpec>,
        submissions: Vec<SubmissionSpec>,
        tuning: PreemptionTuning,
    ) -> Result<Self, BuildError> {
        if tuning.alpha < 0.0 {
            return Err(BuildError::ConfigurationOutOfRange("alpha must be >= 0".into()));
        }
        if tuning.beta < 0.0 {
            return Err(BuildError::ConfigurationOutOfRange("beta must be >= 0".into()));
        }
        if tuning.epsilon < 0.0 {
            return Err(BuildError::ConfigurationOutOfRange("epsilon must be >= 0".into()));
        }

        let dim = nodes
            .first()
            .map(|n| n.capacity.dim())
            .or_else(|| applications.first().map(|a| a.requirements.dim()))
            .unwrap_or(0);

        for n in &nodes {
            if n.capacity.dim() != dim {
                return Err(BuildError::DimensionMismatch { expected: dim, found: n.capacity.dim() });
            }
        }
        for a in &applications {
            if a.requirements.dim() != dim {
                return Err(BuildError::DimensionMismatch { expected: dim, found: a.requirements.dim() });
            }
        }

        let mut node_map = BTreeMap::new();
        let mut r_total = ResourceVector::zeros(dim);
        for n in nodes {
            if node_map.contains_key(&n.id) {
                return Err(BuildError::DuplicateNodeId(n.id));
            }
            r_total = r_total.add(&n.capacity);
            node_map.insert(n.id, Node::new(n.id, n.capacity));
        }

        let mut app_map = BTreeMap::new();
        for a in applications {
            if app_map.contains_key(&a.id) {
                return Err(BuildError::DuplicateAppId(a.id));
            }
            if a.duration <= 0.0 {
                return Err(BuildError::ConfigurationOutOfRange(format!(
                    "application {} duration must be positive",
                    a.id
                )));
            }
            let prototype = TaskPrototype { requirements: a.requirements, duration: a.duration };
            app_map.insert(a.id, Application::new(a.id, prototype, dim));
        }

        for s in &submissions {
            if s.time < 0.0 {
                return Err(BuildError::ConfigurationOutOfRange("submission time must be >= 0".into()));
            }
            if !app_map.contains_key(&s.app_id) {
                return Err(BuildError::ConfigurationOutOfRange(format!(
                    "submission references unknown application {}",
                    s.app_id
                )));
            }
        }

        let mut events = EventQueue::new();
        for s in submissions {
            events.push(s.time, EventKind::Submit { app_id: s.app_id, num_tasks: s.num_tasks });
        }

        info!(nodes = node_map.len(), apps = app_map.len(), dim, "simulation constructed");

        Ok(Simulation {
            nodes: node_map,
            apps: app_map,
            tasks: HashMap::new(),
            events,
            current_time: 0.0,
            r_total,
            next_task_id: 0,
            dim,
            alpha: tuning.alpha,
            beta: tuning.beta,
            epsilon: tuning.epsilon,
        })
    }

    /// Run the simulation to completion (event queue exhaustion). Returns
    /// `Err` only if an internal invariant is violated.
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.events.push(0.0, EventKind::SchedulerRun);

        while let Some(Event { time, kind, .. }) = self.events.pop() {
            self.current_time = time;
            let is_scheduler_run = matches!(kind, EventKind::SchedulerRun);

            match kind {
                EventKind::Submit { app_id, num_tasks } => self.handle_submit(app_id, num_tasks),
                EventKind::TaskFinish { task_id, node_id, generation } => self.handle_finish(task_id, node_id, generation)?,
                EventKind::SchedulerRun => self.run_scheduler_cycle()?,
            }

            if !is_scheduler_run && !self.events.has_scheduler_run_at(self.current_time) {
                self.events.push(self.current_time, EventKind::SchedulerRun);
            }
        }

        info!(current_time = self.current_time, "simulation complete");
        Ok(())
    }

    fn handle_submit(&mut self, app_id: AppId, num_tasks: u32) {
        let Some(app) = self.apps.get(&app_id) else {
            warn!(app_id, "submit event for unknown application, ignoring");
            return;
        };
        let requirements = app.prototype.requirements.clone();
        let duration = app.prototype.duration;

        debug!(app_id, num_tasks, time = self.current_time, "submitting tasks");

        for _ in 0..num_tasks {
            let task_id = self.next_task_id;
            self.next_task_id += 1;
            let task = Task::new(task_id, app_id, requirements.clone(), duration);
            self.tasks.insert(task_id, task);
            self.apps.get_mut(&app_id).unwrap().pending_tasks.push_back(task_id);
        }
    }

    fn handle_finish(&mut self, task_id: TaskId, node_id: NodeId, generation: u32) -> Result<(), EngineError> {
        let is_current = self
            .tasks
            .get(&task_id)
            .is_some_and(|t| t.status == TaskStatus::Running && t.generation == generation);
        if !is_current {
            // Already preempted since the finish was scheduled, or preempted
            // and re-placed under a later generation.
            debug!(task_id, generation, "finish event for stale task placement, ignoring");
            return Ok(());
        }

        let task = self.tasks.remove(&task_id).unwrap();
        let app_id = task.app_id;

        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or_else(|| EngineError::InvariantViolation(format!("finish event references unknown node {node_id}")))?;
        node.running_tasks.remove(&task_id);
        node.usage = node.usage.checked_sub(&task.requirements).ok_or_else(|| {
            EngineError::InvariantViolation(format!("node {node_id} usage would go negative on finish of task {task_id}"))
        })?;
        debug_assert!(
            !node.running_tasks.is_empty() || node.usage.is_zero(),
            "node {node_id} has no running tasks but non-zero usage"
        );

        let app = self
            .apps
            .get_mut(&app_id)
            .ok_or_else(|| EngineError::InvariantViolation(format!("finish event references unknown application {app_id}")))?;
        app.running_tasks.remove(&task_id);
        app.u = app.u.checked_sub(&task.requirements).ok_or_else(|| {
            EngineError::InvariantViolation(format!("application {app_id} usage would go negative on finish of task {task_id}"))
        })?;
        app.recompute_share(&self.r_total);
        debug_assert!(
            !app.running_tasks.is_empty() || app.u.is_zero(),
            "application {app_id} has no running tasks but non-zero usage"
        );

        debug!(task_id, app_id, node_id, time = self.current_time, "task finished");
        Ok(())
    }

    /// One full scheduling cycle: repeat rounds until a round allocates
    /// nothing.
    fn run_scheduler_cycle(&mut self) -> Result<(), EngineError> {
        loop {
            let mut candidates: Vec<AppId> = self
                .apps
                .values()
                .filter(|a| !a.pending_tasks.is_empty())
                .map(|a| a.id)
                .collect();
            if candidates.is_empty() {
                return Ok(());
            }
            candidates.sort_by(|a, b| {
                let sa = self.apps[a].s;
                let sb = self.apps[b].s;
                sa.partial_cmp(&sb).expect("dominant shares are finite")
            });

            let mut allocated = false;
            for app_id in candidates {
                let task_id = *self.apps[&app_id].pending_tasks.front().expect("app was filtered for non-empty pending");
                let requirements = self.tasks[&task_id].requirements.clone();

                if let Some(node_id) = self.find_best_node(&requirements) {
                    self.place_task(app_id, task_id, node_id)?;
                    allocated = true;
                    break;
                }

                let app = &self.apps[&app_id];
                let s_w = app.s;
                let u_w = app.u.clone();
                if let Some(candidate) = preemption::find_candidate(
                    app_id,
                    s_w,
                    &u_w,
                    &requirements,
                    self.current_time,
                    &self.apps,
                    &self.nodes,
                    &self.tasks,
                    &self.r_total,
                    self.alpha,
                    self.beta,
                    self.epsilon,
                ) {
                    self.apply_preemption(&candidate)?;
                    self.place_task(app_id, task_id, candidate.node_id)?;
                    allocated = true;
                    break;
                }
            }

            if !allocated {
                return Ok(());
            }
        }
    }

    /// First-fit over nodes ordered by ascending node id.
    fn find_best_node(&self, requirements: &ResourceVector) -> Option<NodeId> {
        self.nodes.values().find(|n| n.can_fit(requirements)).map(|n| n.id)
    }

    fn place_task(&mut self, app_id: AppId, task_id: TaskId, node_id: NodeId) -> Result<(), EngineError> {
        let requirements = self.tasks[&task_id].requirements.clone();
        let duration = self.tasks[&task_id].duration;

        self.apps.get_mut(&app_id).unwrap().pending_tasks.pop_front();

        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or_else(|| EngineError::InvariantViolation(format!("placement references unknown node {node_id}")))?;
        let usage = node.usage.add(&requirements);
        if !usage.le(&node.capacity) {
            return Err(EngineError::InvariantViolation(format!(
                "node {node_id} capacity exceeded placing task {task_id}"
            )));
        }
        node.usage = usage;
        node.running_tasks.insert(task_id);

        let app = self.apps.get_mut(&app_id).unwrap();
        app.running_tasks.insert(task_id);
        app.u = app.u.add(&requirements);
        app.recompute_share(&self.r_total);

        let task = self.tasks.get_mut(&task_id).unwrap();
        task.place(self.current_time, node_id);
        let generation = task.generation;
        self.events.push(
            self.current_time + duration,
            EventKind::TaskFinish { task_id, node_id, generation },
        );

        debug!(task_id, app_id, node_id, time = self.current_time, "task placed");
        Ok(())
    }

    /// Apply a preemption candidate: evict its victims from the node and the
    /// victim application, resetting them to pending. Victims are prepended
    /// to the victim application's pending list one at a time in accumulation
    /// (ascending-cost) order, which leaves them in descending-cost order at
    /// the front. Any stable reinsertion policy keeps the invariants sound;
    /// this one is simplest to implement and to reason about.
    fn apply_preemption(&mut self, candidate: &preemption::PreemptionCandidate) -> Result<(), EngineError> {
        let mut freed = ResourceVector::zeros(self.dim);
        for task_id in &candidate.victims {
            let requirements = self.tasks[task_id].requirements.clone();
            freed = freed.add(&requirements);
        }

        let node = self
            .nodes
            .get_mut(&candidate.node_id)
            .ok_or_else(|| EngineError::InvariantViolation(format!("preemption references unknown node {}", candidate.node_id)))?;
        for task_id in &candidate.victims {
            node.running_tasks.remove(task_id);
        }
        node.usage = node.usage.checked_sub(&freed).ok_or_else(|| {
            EngineError::InvariantViolation(format!("node {} usage would go negative on preemption", candidate.node_id))
        })?;

        let app = self.apps.get_mut(&candidate.victim_app_id).ok_or_else(|| {
            EngineError::InvariantViolation(format!("preemption references unknown application {}", candidate.victim_app_id))
        })?;
        app.u = app.u.checked_sub(&freed).ok_or_else(|| {
            EngineError::InvariantViolation(format!("application {} usage would go negative on preemption", candidate.victim_app_id))
        })?;
        for task_id in &candidate.victims {
            app.running_tasks.remove(task_id);
            app.pending_tasks.push_front(*task_id);
        }
        app.recompute_share(&self.r_total);

        for task_id in &candidate.victims {
            self.tasks.get_mut(task_id).unwrap().preempt();
        }

        info!(
            node_id = candidate.node_id,
            victim_app_id = candidate.victim_app_id,
            victims = candidate.victims.len(),
            cost = candidate.total_cost,
            time = self.current_time,
            "preemption applied"
        );
        Ok(())
    }

    // ── Observation surface ────────────────────────────────────────────────

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn app_share(&self, app_id: AppId) -> Option<f64> {
        self.apps.get(&app_id).map(|a| a.s)
    }

    pub fn app_pending_count(&self, app_id: AppId) -> Option<usize> {
        self.apps.get(&app_id).map(|a| a.pending_tasks.len())
    }

    pub fn app_running_count(&self, app_id: AppId) -> Option<usize> {
        self.apps.get(&app_id).map(|a| a.running_tasks.len())
    }

    pub fn node_usage(&self, node_id: NodeId) -> Option<&ResourceVector> {
        self.nodes.get(&node_id).map(|n| &n.usage)
    }

    pub fn node_capacity(&self, node_id: NodeId) -> Option<&ResourceVector> {
        self.nodes.get(&node_id).map(|n| &n.capacity)
    }

    pub fn app_ids(&self) -> Vec<AppId> {
        self.apps.keys().copied().collect()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
