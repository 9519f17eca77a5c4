/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! A discrete-event simulator for a multi-resource cluster scheduler built
//! around Dominant Resource Fairness (DRF) with cost-aware preemption.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── resource/   – ResourceVector, the dominant-share arithmetic
//! ├── model/      – Task, Application, Node entities
//! ├── event/      – the deterministic event queue
//! ├── engine/     – Simulation: construction, event loop, scheduling cycle
//! │   ├── error/      – BuildError / EngineError
//! │   └── preemption/ – the cost-aware preemption evaluator
//! └── config/     – YAML cluster configuration loading
//! ```

pub mod config;
pub mod engine;
pub mod event;
pub mod model;
pub mod resource;
