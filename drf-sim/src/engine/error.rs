/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Error taxonomy for the simulation engine.
//!
//! Two layers: [`BuildError`] is returned only from construction
//! (`Simulation::new`) and is always fatal to the attempt; [`EngineError`] is
//! returned only from the running simulation and always indicates a broken
//! invariant rather than a recoverable condition. The one non-fatal
//! condition — a finish event for an already-preempted task — is not an
//! error at all; it is logged with `tracing::debug!` and discarded at the
//! call site (see `engine::mod`).

use thiserror::Error;

/// Fatal errors detected while constructing a [`crate::engine::Simulation`].
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("resource vectors must share one dimension: node/app/task vectors found with dimensions {expected} and {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("duplicate node id {0}")]
    DuplicateNodeId(u64),

    #[error("duplicate application id {0}")]
    DuplicateAppId(u64),

    #[error("configuration out of range: {0}")]
    ConfigurationOutOfRange(String),
}

/// Fatal errors raised while the simulation is running. Every variant
/// indicates a broken invariant — a bug in the engine, not a modeling
/// condition the caller can recover from — so `Simulation::run` propagates
/// these with `?` instead of continuing.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
