/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The cost-aware preemption evaluator.
//!
//! Kept as free functions taking explicit borrows of the engine's maps,
//! rather than methods on `Simulation`, so the feasibility search is a pure,
//! independently-testable function. Nothing here mutates state; the caller
//! (`engine::mod`'s scheduling cycle) applies whatever candidate is returned.

use std::collections::{BTreeMap, HashMap};

use crate::model::{AppId, Application, Node, NodeId, Task, TaskId};
use crate::resource::ResourceVector;

/// A feasible victim set on a single node, ready to be applied by the
/// caller.
#[derive(Debug, Clone, PartialEq)]
pub struct PreemptionCandidate {
    pub node_id: NodeId,
    pub victim_app_id: AppId,
    /// Victim task ids, in ascending-cost order (the order they were
    /// accumulated in).
    pub victims: Vec<TaskId>,
    pub total_cost: f64,
}

/// Wasted-work cost of a single running task: `elapsed(T) * dominant-share(T.requirements)`.
///
/// Zero elapsed time or a zero dominant component both yield a cost of zero.
pub fn task_cost(task: &Task, current_time: f64, r_total: &ResourceVector) -> f64 {
    let elapsed = task.elapsed(current_time);
    let dominance = task.requirements.dominant_share(r_total);
    elapsed * dominance
}

/// Find the minimum-cost feasible preemption candidate for a winner
/// application `winner_app_id` (current share `s_w`, usage `u_w`) trying to
/// place a task requiring `d_w`, or `None` if no node yields a candidate
/// that satisfies all three predicates.
#[allow(clippy::too_many_arguments)]
pub fn find_candidate(
    winner_app_id: AppId,
    s_w: f64,
    u_w: &ResourceVector,
    d_w: &ResourceVector,
    current_time: f64,
    apps: &BTreeMap<AppId, Application>,
    nodes: &BTreeMap<NodeId, Node>,
    tasks: &HashMap<TaskId, Task>,
    r_total: &ResourceVector,
    alpha: f64,
    beta: f64,
    epsilon: f64,
) -> Option<PreemptionCandidate> {
    // Victim-app selection: the application with maximum s_p among those
    // with at least one running task, excluding the winner itself (a task
    // cannot preempt its own application).
    let victim_app = apps
        .values()
        .filter(|a| a.id != winner_app_id && !a.running_tasks.is_empty())
        .max_by(|a, b| a.s.partial_cmp(&b.s).expect("dominant shares are finite"))?;

    if victim_app.s <= s_w {
        return None;
    }

    let u_w_prime = u_w.add(d_w);
    let s_w_prime = u_w_prime.dominant_share(r_total);

    let mut best: Option<PreemptionCandidate> = None;

    for node in nodes.values() {
        let mut victim_tasks: Vec<&Task> = node
            .running_tasks
            .iter()
            .filter_map(|tid| tasks.get(tid))
            .filter(|t| t.app_id == victim_app.id)
            .collect();
        if victim_tasks.is_empty() {
            continue;
        }

        victim_tasks.sort_by(|a, b| {
            let ca = task_cost(a, current_time, r_total);
            let cb = task_cost(b, current_time, r_total);
            ca.partial_cmp(&cb).expect("costs are finite")
        });

        let mut accumulated: Vec<TaskId> = Vec::new();
        let mut freed = ResourceVector::zeros(r_total.dim());
        let mut total_cost = 0.0_f64;
        let mut feasible = false;

        for t in &victim_tasks {
            accumulated.push(t.id);
            freed = freed.add(&t.requirements);
            total_cost += task_cost(t, current_time, r_total);

            // (C_k - freed) + D_W <= R_k, componentwise.
            let remaining_usage = node
                .usage
                .checked_sub(&freed)
                .expect("freed resources never exceed a node's own usage");
            let hypothetical = remaining_usage.add(d_w);
            if hypothetical.le(&node.capacity) {
                feasible = true;
                break;
            }
        }

        if !feasible {
            continue;
        }

        let u_p_prime = victim_app
            .u
            .checked_sub(&freed)
            .expect("freed resources never exceed the victim app's own usage");
        let s_p_prime = u_p_prime.dominant_share(r_total);

        // Hierarchy preservation.
        if !(s_p_prime > s_w_prime) {
            continue;
        }

        // Fairness gain.
        let gain = victim_app.s - s_p_prime;
        if !(gain > epsilon) {
            continue;
        }

        // Economic test.
        if !(gain * alpha > total_cost * beta) {
            continue;
        }

        let candidate = PreemptionCandidate {
            node_id: node.id,
            victim_app_id: victim_app.id,
            victims: accumulated,
            total_cost,
        };

        best = match best {
            None => Some(candidate),
            Some(current_best) if candidate.total_cost < current_best.total_cost => Some(candidate),
            Some(current_best) => Some(current_best),
        };
    }

    best
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Application, Node, Task, TaskPrototype};

    fn rv(v: &[f64]) -> ResourceVector {
        ResourceVector::from_vec(v.to_vec())
    }

    /// One node, one resource kind, capacity 20. A heavily dominant victim
    /// app (6 running tasks of 3 each, `U_P = 18`, `s_P = 0.9`) leaves only 2
    /// free, not enough for a winner requiring 3. Freeing a single victim
    /// task (cost `1.0 * 0.15 = 0.15`) leaves the victim at `s_P' = 0.75`,
    /// comfortably above the winner's post-placement `s_W' = 0.15` — every
    /// gating predicate passes with room to spare, unlike the
    /// symmetric-requirement-vector fixture in `engine::mod`'s tests, whose
    /// numbers tie `s_P'` and `s_W'` at exactly `0.5`.
    fn scenario_with_clear_margin() -> (
        BTreeMap<AppId, Application>,
        BTreeMap<NodeId, Node>,
        HashMap<TaskId, Task>,
        ResourceVector,
    ) {
        let r_total = rv(&[20.0]);

        let mut node = Node::new(1, rv(&[20.0]));
        node.usage = rv(&[18.0]);

        let mut tasks = HashMap::new();
        let mut app1 = Application::new(1, TaskPrototype { requirements: rv(&[3.0]), duration: 100.0 }, 1);
        for tid in 10u64..16u64 {
            let mut t = Task::new(tid, 1, rv(&[3.0]), 100.0);
            t.place(0.0, 1);
            tasks.insert(tid, t);
            app1.running_tasks.insert(tid);
            node.running_tasks.insert(tid);
        }
        app1.u = rv(&[18.0]);
        app1.recompute_share(&r_total);

        let app2 = Application::new(2, TaskPrototype { requirements: rv(&[3.0]), duration: 50.0 }, 1);

        let mut apps = BTreeMap::new();
        apps.insert(1, app1);
        apps.insert(2, app2);

        let mut nodes = BTreeMap::new();
        nodes.insert(1, node);

        (apps, nodes, tasks, r_total)
    }

    #[test]
    fn task_cost_is_zero_at_zero_elapsed() {
        let t = Task::new(0, 1, rv(&[1.0, 8.0]), 16.0);
        assert_eq!(task_cost(&t, 0.0, &rv(&[8.0, 16.0])), 0.0);
    }

    #[test]
    fn preemption_fires_when_economics_favor_it() {
        let (apps, nodes, tasks, r_total) = scenario_with_clear_margin();
        let d_w = rv(&[3.0]);
        let u_w = ResourceVector::zeros(1);

        let candidate = find_candidate(2, 0.0, &u_w, &d_w, 1.0, &apps, &nodes, &tasks, &r_total, 50.0, 10.0, 1e-3);
        assert!(candidate.is_some());
        let c = candidate.unwrap();
        assert_eq!(c.node_id, 1);
        assert_eq!(c.victim_app_id, 1);
        assert_eq!(c.victims.len(), 1);
        assert!((c.total_cost - 0.15).abs() < 1e-9);
    }

    #[test]
    fn preemption_rejected_by_economic_test() {
        let (apps, nodes, tasks, r_total) = scenario_with_clear_margin();
        let d_w = rv(&[3.0]);
        let u_w = ResourceVector::zeros(1);

        // Same feasible, hierarchy-preserving, gain-positive candidate as
        // above, but beta now dominates alpha so the economic test rejects it.
        let candidate = find_candidate(2, 0.0, &u_w, &d_w, 1.0, &apps, &nodes, &tasks, &r_total, 1.0, 1000.0, 1e-3);
        assert!(candidate.is_none());
    }

    #[test]
    fn no_candidate_when_no_app_has_running_tasks() {
        let r_total = rv(&[8.0, 16.0]);
        let apps: BTreeMap<AppId, Application> = BTreeMap::new();
        let nodes: BTreeMap<NodeId, Node> = BTreeMap::new();
        let tasks: HashMap<TaskId, Task> = HashMap::new();
        let d_w = rv(&[1.0, 1.0]);
        let u_w = ResourceVector::zeros(2);
        assert!(find_candidate(1, 0.0, &u_w, &d_w, 0.0, &apps, &nodes, &tasks, &r_total, 1.0, 1.0, 1e-3).is_none());
    }

    #[test]
    fn no_candidate_when_victim_share_not_above_winner() {
        let (mut apps, nodes, tasks, r_total) = scenario_with_clear_margin();
        // Winner already has a higher share than the would-be victim.
        let d_w = rv(&[3.0]);
        let u_w = ResourceVector::zeros(1);
        let s_w = apps.get(&1).unwrap().s + 1.0;
        apps.get_mut(&2).unwrap().s = s_w;
        assert!(find_candidate(2, s_w, &u_w, &d_w, 1.0, &apps, &nodes, &tasks, &r_total, 50.0, 10.0, 1e-3).is_none());
    }

    /// Symmetric requirement vectors ([1,8] winner-complement vs [4,2]) where
    /// the post-preemption hierarchy check ties at exactly `s_P' = s_W' =
    /// 0.5` and the strict `>` predicate correctly rejects the only node
    /// (see the note on `scenario_with_clear_margin`).
    #[test]
    fn hierarchy_tie_is_rejected_not_rounded_up() {
        let r_total = rv(&[8.0, 16.0]);

        let mut node = Node::new(1, rv(&[8.0, 16.0]));
        node.usage = rv(&[2.0, 16.0]);

        let mut tasks = HashMap::new();
        let mut app1 = Application::new(1, TaskPrototype { requirements: rv(&[1.0, 8.0]), duration: 16.0 }, 2);
        for tid in [10u64, 11u64] {
            let mut t = Task::new(tid, 1, rv(&[1.0, 8.0]), 16.0);
            t.place(0.0, 1);
            tasks.insert(tid, t);
            app1.running_tasks.insert(tid);
            node.running_tasks.insert(tid);
        }
        app1.u = rv(&[2.0, 16.0]);
        app1.recompute_share(&r_total);

        let app2 = Application::new(2, TaskPrototype { requirements: rv(&[4.0, 2.0]), duration: 20.0 }, 2);

        let mut apps = BTreeMap::new();
        apps.insert(1, app1);
        apps.insert(2, app2);
        let mut nodes = BTreeMap::new();
        nodes.insert(1, node);

        let d_w = rv(&[4.0, 2.0]);
        let u_w = ResourceVector::zeros(2);
        let candidate = find_candidate(2, 0.0, &u_w, &d_w, 0.1, &apps, &nodes, &tasks, &r_total, 50.0, 10.0, 1e-3);
        assert!(candidate.is_none());
    }
}
