/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cluster configuration loading.
//!
//! The engine never touches YAML, CLI flags, or environment variables itself
//! — this module is the one external collaborator that does: a private
//! `*File`/`*Entry` deserialization shape kept separate from the plain
//! constructor arguments it produces, `anyhow::Context` on I/O/parse
//! failures, `tracing` on load.
//!
//! The expected YAML structure is:
//! ```yaml
//! nodes:
//!   - id: 1
//!     capacity: [8.0, 16.0]
//! applications:
//!   - id: 1
//!     requirements: [1.0, 8.0]
//!     duration: 16.0
//! submissions:
//!   - time: 0.0
//!     app_id: 1
//!     num_tasks: 2
//! preemption:
//!   alpha: 50.0
//!   beta: 10.0
//!   epsilon: 0.001
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::engine::{AppSpec, NodeSpec, PreemptionTuning, SubmissionSpec};
use crate::resource::ResourceVector;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout. Kept
/// private – callers work with [`ClusterConfig`] instead.
#[derive(Debug, Deserialize)]
struct ClusterConfigFile {
    nodes: Vec<NodeEntry>,
    applications: Vec<ApplicationEntry>,
    #[serde(default)]
    submissions: Vec<SubmissionEntry>,
    #[serde(default)]
    preemption: PreemptionEntry,
}

#[derive(Debug, Deserialize)]
struct NodeEntry {
    id: u64,
    capacity: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ApplicationEntry {
    id: u64,
    requirements: Vec<f64>,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct SubmissionEntry {
    time: f64,
    app_id: u64,
    num_tasks: u32,
}

/// Preemption tuning weights. Every field defaults to a neutral value, so an
/// omitted `preemption:` section still yields a usable (if untuned)
/// simulation rather than a parse error.
#[derive(Debug, Deserialize)]
struct PreemptionEntry {
    #[serde(default = "default_alpha")]
    alpha: f64,
    #[serde(default = "default_beta")]
    beta: f64,
    #[serde(default = "default_epsilon")]
    epsilon: f64,
}

impl Default for PreemptionEntry {
    fn default() -> Self {
        PreemptionEntry { alpha: default_alpha(), beta: default_beta(), epsilon: default_epsilon() }
    }
}

fn default_alpha() -> f64 {
    1.0
}
fn default_beta() -> f64 {
    1.0
}
fn default_epsilon() -> f64 {
    1e-3
}

// ── Public data structure ──────────────────────────────────────────────────────

/// A parsed cluster configuration, ready to hand to
/// [`crate::engine::Simulation::new`].
///
/// This module performs no validation beyond what `serde` gives for free
/// (field presence, numeric types) — dimension and range checks live in
/// `Simulation::new` so the same checks apply whether the caller came
/// through YAML or built the arguments programmatically.
#[derive(Debug)]
pub struct ClusterConfig {
    pub nodes: Vec<NodeSpec>,
    pub applications: Vec<AppSpec>,
    pub submissions: Vec<SubmissionSpec>,
    pub preemption: PreemptionTuning,
}

impl ClusterConfig {
    /// Parses `path` into a [`ClusterConfig`].
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or if the YAML is
    /// structurally invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("loading cluster configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot open configuration file: {}", path.display()))?;

        let file: ClusterConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML file: {}", path.display()))?;

        let nodes: Vec<NodeSpec> = file
            .nodes
            .into_iter()
            .map(|n| {
                debug!(id = n.id, dim = n.capacity.len(), "node entry");
                NodeSpec { id: n.id, capacity: ResourceVector::from_vec(n.capacity) }
            })
            .collect();

        let applications: Vec<AppSpec> = file
            .applications
            .into_iter()
            .map(|a| {
                debug!(id = a.id, duration = a.duration, "application entry");
                AppSpec { id: a.id, requirements: ResourceVector::from_vec(a.requirements), duration: a.duration }
            })
            .collect();

        let submissions: Vec<SubmissionSpec> = file
            .submissions
            .into_iter()
            .map(|s| SubmissionSpec { time: s.time, app_id: s.app_id, num_tasks: s.num_tasks })
            .collect();

        let preemption = PreemptionTuning {
            alpha: file.preemption.alpha,
            beta: file.preemption.beta,
            epsilon: file.preemption.epsilon,
        };

        info!(
            nodes = nodes.len(),
            applications = applications.len(),
            submissions = submissions.len(),
            "cluster configuration loaded"
        );

        Ok(ClusterConfig { nodes, applications, submissions, preemption })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_full_example() {
        let yaml = r#"
nodes:
  - id: 1
    capacity: [8.0, 16.0]
applications:
  - id: 1
    requirements: [1.0, 8.0]
    duration: 16.0
  - id: 2
    requirements: [4.0, 2.0]
    duration: 20.0
submissions:
  - time: 0.0
    app_id: 1
    num_tasks: 2
  - time: 0.1
    app_id: 2
    num_tasks: 1
preemption:
  alpha: 50.0
  beta: 10.0
  epsilon: 0.001
"#;
        let f = yaml_tempfile(yaml);
        let cfg = ClusterConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.nodes.len(), 1);
        assert_eq!(cfg.nodes[0].id, 1);
        assert_eq!(cfg.nodes[0].capacity.as_slice(), &[8.0, 16.0]);

        assert_eq!(cfg.applications.len(), 2);
        assert_eq!(cfg.applications[1].id, 2);
        assert_eq!(cfg.applications[1].duration, 20.0);

        assert_eq!(cfg.submissions.len(), 2);
        assert_eq!(cfg.submissions[1].time, 0.1);

        assert_eq!(cfg.preemption.alpha, 50.0);
        assert_eq!(cfg.preemption.beta, 10.0);
        assert!((cfg.preemption.epsilon - 0.001).abs() < 1e-12);
    }

    #[test]
    fn missing_preemption_section_uses_defaults() {
        let yaml = r#"
nodes:
  - id: 1
    capacity: [4.0]
applications:
  - id: 1
    requirements: [1.0]
    duration: 1.0
"#;
        let f = yaml_tempfile(yaml);
        let cfg = ClusterConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.preemption.alpha, 1.0);
        assert_eq!(cfg.preemption.beta, 1.0);
        assert!((cfg.preemption.epsilon - 1e-3).abs() < 1e-12);
        assert!(cfg.submissions.is_empty());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = ClusterConfig::load_from_file(Path::new("/nonexistent/path/config.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        let result = ClusterConfig::load_from_file(f.path());
        assert!(result.is_err());
    }

    #[test]
    fn missing_required_field_returns_error() {
        // `applications` is required; omitting it is a parse error rather
        // than silently defaulting to an empty cluster.
        let yaml = "nodes:\n  - id: 1\n    capacity: [1.0]\n";
        let f = yaml_tempfile(yaml);
        let result = ClusterConfig::load_from_file(f.path());
        assert!(result.is_err());
    }
}
