/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Fixed-width, non-negative real resource vectors.
//!
//! Every node capacity, application usage total, and task requirement in a
//! simulation shares one dimension `D` (the number of resource kinds — e.g.
//! CPU, memory). [`ResourceVector`] carries that dimension with the value
//! instead of passing around a bare `&[f64]` and a separate length, so a
//! dimension mismatch is caught once, at construction, rather than
//! resurfacing as a panic deep inside the scheduler.

use std::fmt;

/// An ordered tuple of non-negative reals of fixed dimension `D`.
///
/// All arithmetic assumes both operands share the same dimension — callers
/// are expected to have validated that once, at [`crate::engine::Simulation::new`]
/// time (see [`crate::engine::error::BuildError::DimensionMismatch`]); every
/// vector that reaches this type afterwards is already conformant.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceVector(Vec<f64>);

impl ResourceVector {
    /// A zero vector of dimension `dim`.
    pub fn zeros(dim: usize) -> Self {
        ResourceVector(vec![0.0; dim])
    }

    /// Build a `ResourceVector` from raw components.
    pub fn from_vec(values: Vec<f64>) -> Self {
        ResourceVector(values)
    }

    /// Number of resource kinds this vector carries.
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// `true` if every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }

    /// Elementwise `self + other`.
    pub fn add(&self, other: &ResourceVector) -> ResourceVector {
        debug_assert_eq!(self.dim(), other.dim(), "resource vector dimension mismatch");
        ResourceVector(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect())
    }

    /// Elementwise `self - other`.
    ///
    /// Returns `None` if any resulting component would go negative — this is
    /// treated as an invariant violation rather than a value to clamp or
    /// saturate. Callers map a `None` here to
    /// [`crate::engine::error::EngineError::InvariantViolation`].
    pub fn checked_sub(&self, other: &ResourceVector) -> Option<ResourceVector> {
        debug_assert_eq!(self.dim(), other.dim(), "resource vector dimension mismatch");
        let mut out = Vec::with_capacity(self.dim());
        for (a, b) in self.0.iter().zip(&other.0) {
            let v = a - b;
            if v < -f64::EPSILON {
                return None;
            }
            out.push(v.max(0.0));
        }
        Some(ResourceVector(out))
    }

    /// Componentwise `self <= other`.
    pub fn le(&self, other: &ResourceVector) -> bool {
        debug_assert_eq!(self.dim(), other.dim(), "resource vector dimension mismatch");
        self.0.iter().zip(&other.0).all(|(a, b)| *a <= *b)
    }

    /// Dominant share of `self` against a cluster total `total`.
    ///
    /// `max_r(self_r / total_r)`, with the convention `0/0 = x/0 = 0`.
    /// Returns `0.0` when the dimension is `0`.
    pub fn dominant_share(&self, total: &ResourceVector) -> f64 {
        debug_assert_eq!(self.dim(), total.dim(), "resource vector dimension mismatch");
        self.0
            .iter()
            .zip(&total.0)
            .map(|(u, r)| if *r == 0.0 { 0.0 } else { u / r })
            .fold(0.0_f64, f64::max)
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v:.3}")?;
        }
        write!(f, "]")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
