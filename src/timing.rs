//! Phase hooks around the solver's work.
//!
//! The solver calls [`PhaseObserver::enter`] / [`PhaseObserver::exit`]
//! around every phase and knows nothing else about timing. [`PhaseTimer`]
//! accumulates wall-clock time per phase.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Topology,
    Computation,
    HaloExchange,
    Reduction,
    Output,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Topology,
        Phase::Computation,
        Phase::HaloExchange,
        Phase::Reduction,
        Phase::Output,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Topology => "topology",
            Phase::Computation => "comp",
            Phase::HaloExchange => "halo",
            Phase::Reduction => "reduce",
            Phase::Output => "output",
        }
    }
}

pub trait PhaseObserver {
    fn enter(&mut self, _phase: Phase) {}
    fn exit(&mut self, _phase: Phase) {}
}

/// Observer that ignores every hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PhaseObserver for NoopObserver {}

/// Run `f` between `enter(phase)` and `exit(phase)`.
#[inline]
pub fn timed<O, T>(obs: &mut O, phase: Phase, f: impl FnOnce() -> T) -> T
where
    O: PhaseObserver + ?Sized,
{
    obs.enter(phase);
    let out = f();
    obs.exit(phase);
    out
}

/// Accumulated wall-clock time and entry count per phase.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimer {
    started: [Option<Instant>; 5],
    totals: [Duration; 5],
    counts: [u64; 5],
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self, phase: Phase) -> Duration {
        self.totals[phase.index()]
    }

    pub fn count(&self, phase: Phase) -> u64 {
        self.counts[phase.index()]
    }

    /// Communication share: halo exchange plus reductions.
    pub fn communication(&self) -> Duration {
        self.total(Phase::HaloExchange) + self.total(Phase::Reduction)
    }

    pub fn summary(&self) -> PhaseSummary {
        PhaseSummary {
            seconds: Phase::ALL
                .iter()
                .map(|&p| (p, self.total(p).as_secs_f64()))
                .collect(),
        }
    }
}

impl PhaseObserver for PhaseTimer {
    fn enter(&mut self, phase: Phase) {
        self.started[phase.index()] = Some(Instant::now());
    }

    fn exit(&mut self, phase: Phase) {
        let k = phase.index();
        if let Some(t0) = self.started[k].take() {
            self.totals[k] += t0.elapsed();
            self.counts[k] += 1;
        }
    }
}

/// Per-phase seconds, printable as `tag:seconds,` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub seconds: Vec<(Phase, f64)>,
}

impl fmt::Display for PhaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (phase, secs) in &self.seconds {
            write!(f, "{}:{:.8},", phase.label(), secs)?;
        }
        Ok(())
    }
}
