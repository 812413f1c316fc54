//! Scalar CG state and its transitions.
//!
//! The driver feeds the reduced scalars (`delta0`, `d·z`, `delta1`) into a
//! [`CgState`] and acts on the returned decisions. Every rank feeds the same
//! reduced values, so every rank takes the same transitions.

use serde::{Deserialize, Serialize};

use crate::algs::reduction::rms;

/// Phases of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CgPhase {
    Init,
    ComputeInitialResidual,
    Iterating,
    Converged,
    MaxItersReached,
    Stagnated,
}

impl CgPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CgPhase::Converged | CgPhase::MaxItersReached | CgPhase::Stagnated
        )
    }
}

/// How a solve ended. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    /// RMS residual reached `eps`.
    Converged,
    /// `k_max` iterations without reaching `eps`.
    MaxItersReached,
    /// `d·z` was zero or not finite; the step length is undefined.
    Stagnated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CgState {
    pub delta0: f64,
    pub delta1: f64,
    pub alpha: f64,
    pub beta: f64,
    /// RMS residual after the latest reduction.
    pub sum_res: f64,
    /// Completed iterations.
    pub iteration: usize,
    phase: CgPhase,
    eps: f64,
    k_max: usize,
    points: usize,
}

impl CgState {
    /// State after the initial residual reduction `delta0 = ‖res‖²`.
    pub fn start(delta0: f64, points: usize, eps: f64, k_max: usize) -> Self {
        let sum_res = rms(delta0, points);
        let phase = if sum_res <= eps {
            CgPhase::Converged
        } else if k_max == 0 {
            CgPhase::MaxItersReached
        } else {
            CgPhase::Iterating
        };
        Self {
            delta0,
            delta1: delta0,
            alpha: 0.0,
            beta: 0.0,
            sum_res,
            iteration: 0,
            phase,
            eps,
            k_max,
            points,
        }
    }

    pub fn phase(&self) -> CgPhase {
        self.phase
    }

    /// `alpha = delta0 / (d·z)`, or `None` (and [`CgPhase::Stagnated`]) when
    /// the curvature `d·z` is zero or not finite.
    pub fn step_length(&mut self, curvature: f64) -> Option<f64> {
        debug_assert_eq!(self.phase, CgPhase::Iterating);
        if curvature == 0.0 || !curvature.is_finite() {
            self.phase = CgPhase::Stagnated;
            return None;
        }
        self.alpha = self.delta0 / curvature;
        Some(self.alpha)
    }

    /// Close an iteration with `delta1 = ‖res‖²`.
    ///
    /// Returns `beta` when the next iteration should run; the caller then
    /// sets `d = res + beta·d`. Returns `None` on convergence or when the
    /// iteration cap is reached.
    pub fn advance(&mut self, delta1: f64) -> Option<f64> {
        debug_assert_eq!(self.phase, CgPhase::Iterating);
        self.iteration += 1;
        self.delta1 = delta1;
        self.sum_res = rms(delta1, self.points);
        if self.sum_res <= self.eps {
            self.phase = CgPhase::Converged;
            return None;
        }
        self.beta = delta1 / self.delta0;
        self.delta0 = delta1;
        if self.iteration >= self.k_max {
            self.phase = CgPhase::MaxItersReached;
            return None;
        }
        Some(self.beta)
    }

    /// Terminal status, once the solve has ended.
    pub fn status(&self) -> Option<SolveStatus> {
        match self.phase {
            CgPhase::Converged => Some(SolveStatus::Converged),
            CgPhase::MaxItersReached => Some(SolveStatus::MaxItersReached),
            CgPhase::Stagnated => Some(SolveStatus::Stagnated),
            _ => None,
        }
    }
}
