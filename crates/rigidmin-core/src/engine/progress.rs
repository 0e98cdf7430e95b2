use std::fmt;

/// Why a minimizer discarded its curvature history mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// The two-loop recursion produced a NaN or infinite step.
    NonFiniteStep,
    /// Every shortened trial still raised the energy too much.
    BacktrackingExhausted,
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetReason::NonFiniteStep => f.write_str("non-finite step"),
            ResetReason::BacktrackingExhausted => f.write_str("backtracking exhausted"),
        }
    }
}

/// Events a workflow emits while it runs.
///
/// A run is one phase holding one task; every accepted iteration of the task emits
/// [`Progress::Iteration`]. A task may end before `total_steps` when the minimizer converges.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart {
        name: &'static str,
    },
    PhaseFinish,

    TaskStart {
        total_steps: u64,
    },
    Iteration {
        iteration: usize,
        energy: f64,
        rms: f64,
    },
    HistoryReset {
        iteration: usize,
        reason: ResetReason,
    },
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional callback.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub fn is_active(&self) -> bool {
        self.callback.is_some()
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
