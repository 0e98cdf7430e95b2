use super::config::{CurvaturePolicy, LbfgsConfig};
use super::error::LbfgsError;
use super::history::{Correction, History};
use crate::core::utils::vector::{all_finite, axpy, difference, dot, norm, scale};
use tracing::{trace, warn};

/// How the history changed while computing a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryUpdate {
    /// First call since construction or [`Lbfgs::reset`]; no previous point to difference.
    NoPreviousPoint,
    Stored,
    /// The curvature pair violated `s·y > 0` and was dropped.
    Skipped,
    /// The curvature pair violated `s·y > 0` and the whole history was cleared.
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Value of the step counter for this step (zero for the first).
    pub iteration: usize,
    pub step_norm: f64,
    /// The raw step was longer than `max_step` and was shortened.
    pub clipped: bool,
    /// The raw step pointed uphill and was reversed.
    pub reversed: bool,
    pub update: HistoryUpdate,
}

enum Pending {
    None,
    Push(Correction),
    Skip,
    Reset,
}

/// Limited-memory BFGS stepper.
///
/// Each call to [`step`](Self::step) or [`compute_step`](Self::compute_step) consumes the
/// current point and gradient, folds the difference to the previous call into a bounded
/// history of curvature pairs, and applies the two-loop recursion to produce a step.
/// The stepper has no notion of the objective itself and no line search; callers that need
/// one (see [`crate::workflows::quench`]) scale the returned step themselves.
#[derive(Debug, Clone)]
pub struct Lbfgs {
    config: LbfgsConfig,
    history: History,
    previous: Option<(Vec<f64>, Vec<f64>)>,
    k: usize,
}

impl Lbfgs {
    pub fn new(config: LbfgsConfig) -> Self {
        let history = History::with_capacity(config.history_size);
        Self {
            config,
            history,
            previous: None,
            k: 0,
        }
    }

    pub fn config(&self) -> &LbfgsConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Number of steps computed so far.
    pub fn iteration(&self) -> usize {
        self.k
    }

    /// Forgets the history and the previous point. The step counter keeps running.
    pub fn reset(&mut self) {
        self.history.clear();
        self.previous = None;
    }

    /// Computes the step for point `x` with gradient `g`, applies it to `x` and returns a
    /// summary.
    pub fn step(&mut self, x: &mut [f64], g: &[f64]) -> Result<StepReport, LbfgsError> {
        let (step, report) = self.advance(x, g)?;
        axpy(1.0, &step, x);
        Ok(report)
    }

    /// Like [`step`](Self::step) but returns the step instead of applying it.
    ///
    /// The stepper still records `(x, g)` as the previous point, so the next call should be
    /// made at the position the caller actually moved to.
    pub fn compute_step(&mut self, x: &[f64], g: &[f64]) -> Result<Vec<f64>, LbfgsError> {
        self.advance(x, g).map(|(step, _)| step)
    }

    pub fn compute_step_with_report(
        &mut self,
        x: &[f64],
        g: &[f64],
    ) -> Result<(Vec<f64>, StepReport), LbfgsError> {
        self.advance(x, g)
    }

    fn advance(&mut self, x: &[f64], g: &[f64]) -> Result<(Vec<f64>, StepReport), LbfgsError> {
        self.check_dimensions(x, g)?;

        let pending = self.pending_update(x, g);
        let mut step = self.direction(g, &pending);
        if !all_finite(&step) {
            return Err(LbfgsError::NonFiniteStep { iteration: self.k });
        }

        let reversed = dot(&step, g) > 0.0;
        if reversed {
            scale(-1.0, &mut step);
        }
        let mut step_norm = norm(&step);
        let clipped = step_norm > self.config.max_step;
        if clipped {
            scale(self.config.max_step / step_norm, &mut step);
            step_norm = self.config.max_step;
        }

        let update = match pending {
            Pending::None => HistoryUpdate::NoPreviousPoint,
            Pending::Push(correction) => {
                self.history.push(correction);
                HistoryUpdate::Stored
            }
            Pending::Skip => HistoryUpdate::Skipped,
            Pending::Reset => {
                self.history.clear();
                HistoryUpdate::Reset
            }
        };
        let report = StepReport {
            iteration: self.k,
            step_norm,
            clipped,
            reversed,
            update,
        };
        trace!(
            "L-BFGS step {}: |step| = {:.3e}, history = {}",
            self.k,
            step_norm,
            self.history.len()
        );

        self.previous = Some((x.to_vec(), g.to_vec()));
        self.k += 1;
        Ok((step, report))
    }

    fn check_dimensions(&self, x: &[f64], g: &[f64]) -> Result<(), LbfgsError> {
        if x.len() != g.len() {
            return Err(LbfgsError::LengthMismatch {
                position: x.len(),
                gradient: g.len(),
            });
        }
        if let Some((x_prev, _)) = &self.previous {
            if x_prev.len() != x.len() {
                return Err(LbfgsError::DimensionMismatch {
                    expected: x_prev.len(),
                    found: x.len(),
                });
            }
        }
        Ok(())
    }

    fn pending_update(&self, x: &[f64], g: &[f64]) -> Pending {
        let Some((x_prev, g_prev)) = &self.previous else {
            return Pending::None;
        };
        let correction = Correction::new(difference(x, x_prev), difference(g, g_prev));
        let acceptable = correction.curvature() > 0.0 && correction.rho.is_finite();
        match self.config.curvature_policy {
            _ if acceptable => Pending::Push(correction),
            CurvaturePolicy::Unguarded => Pending::Push(correction),
            CurvaturePolicy::SkipUpdate => {
                warn!(
                    "Curvature condition violated at step {} (s·y = {:.3e}); skipping history update",
                    self.k,
                    correction.curvature()
                );
                Pending::Skip
            }
            CurvaturePolicy::ResetHistory => {
                warn!(
                    "Curvature condition violated at step {} (s·y = {:.3e}); resetting history",
                    self.k,
                    correction.curvature()
                );
                Pending::Reset
            }
        }
    }

    /// Two-loop recursion over the committed history plus the pending update, without
    /// mutating either.
    fn direction(&self, g: &[f64], pending: &Pending) -> Vec<f64> {
        let window: Vec<&Correction> = match pending {
            Pending::Reset => Vec::new(),
            Pending::Push(newest) => {
                let drop_oldest = usize::from(self.history.is_full());
                self.history
                    .iter()
                    .skip(drop_oldest)
                    .chain(std::iter::once(newest))
                    .collect()
            }
            Pending::None | Pending::Skip => self.history.iter().collect(),
        };

        let mut q = g.to_vec();
        let mut alpha = vec![0.0; window.len()];
        for (i, c) in window.iter().enumerate().rev() {
            alpha[i] = c.rho * dot(&c.s, &q);
            axpy(-alpha[i], &c.y, &mut q);
        }

        let h0 = match window.last() {
            Some(newest) if self.config.scale_inverse_hessian => newest.inverse_hessian_scale(),
            _ => self.config.initial_inverse_hessian,
        };
        let mut z = q;
        scale(h0, &mut z);

        for (i, c) in window.iter().enumerate() {
            let beta = c.rho * dot(&c.y, &z);
            axpy(alpha[i] - beta, &c.s, &mut z);
        }

        scale(-1.0, &mut z);
        z
    }
}
