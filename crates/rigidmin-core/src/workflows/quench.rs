use crate::core::potentials::Potential;
use crate::core::utils::vector::{axpy, rms};
use crate::engine::config::QuenchConfig;
use crate::engine::error::{EngineError, LbfgsError};
use crate::engine::lbfgs::Lbfgs;
use crate::engine::progress::{Progress, ProgressReporter, ResetReason};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct QuenchResult {
    pub coords: Vec<f64>,
    pub energy: f64,
    pub gradient: Vec<f64>,
    /// RMS of the final gradient, `|g| / sqrt(N)`.
    pub rms: f64,
    pub iterations: usize,
    pub function_evaluations: usize,
    pub converged: bool,
}

struct Evaluator<'p, P> {
    potential: &'p P,
    count: usize,
}

impl<P: Potential> Evaluator<'_, P> {
    fn evaluate(&mut self, x: &[f64]) -> Result<(f64, Vec<f64>), EngineError> {
        self.count += 1;
        Ok(self.potential.energy_gradient(x)?)
    }
}

/// Minimizes `potential` starting from `initial`.
///
/// Each iteration asks the L-BFGS stepper for a step and tries `x + f·step` with
/// `f = 1, 0.1, 0.01, ..`, accepting the first trial whose energy rises by less than
/// `max_energy_rise`. If every allowed trial is rejected the last one is accepted anyway and
/// the stepper history is discarded. The loop stops once the RMS gradient drops to
/// `tolerance` or after `max_iterations` iterations.
#[instrument(skip_all, name = "quench_workflow", fields(ndof = initial.len()))]
pub fn run<P: Potential>(
    potential: &P,
    initial: &[f64],
    config: &QuenchConfig,
    reporter: &ProgressReporter,
) -> Result<QuenchResult, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Quench" });
    info!(
        "Starting quench: {} coordinates, tolerance {:.1e}, at most {} iterations.",
        initial.len(),
        config.tolerance,
        config.max_iterations
    );

    let mut evaluator = Evaluator {
        potential,
        count: 0,
    };
    let mut lbfgs = Lbfgs::new(config.lbfgs.clone());
    let mut x = initial.to_vec();
    let (mut energy, mut gradient) = evaluator.evaluate(&x)?;
    if !energy.is_finite() {
        return Err(EngineError::NonFiniteEnergy {
            energy,
            iteration: 0,
        });
    }

    let mut iterations = 0;
    let mut converged = rms(&gradient) <= config.tolerance;

    reporter.report(Progress::TaskStart {
        total_steps: config.max_iterations as u64,
    });
    while !converged && iterations < config.max_iterations {
        let step = match lbfgs.compute_step(&x, &gradient) {
            Ok(step) => step,
            Err(LbfgsError::NonFiniteStep { iteration }) => {
                warn!(
                    "Non-finite L-BFGS step at iteration {}; restarting from steepest descent.",
                    iteration
                );
                lbfgs.reset();
                reporter.report(Progress::HistoryReset {
                    iteration: iterations + 1,
                    reason: ResetReason::NonFiniteStep,
                });
                lbfgs.compute_step(&x, &gradient)?
            }
            Err(e) => return Err(e.into()),
        };

        let (x_new, e_new, g_new) = backtrack(&mut evaluator, &x, energy, &step, config)?
            .unwrap_or_else(|(x_last, e_last, g_last)| {
                warn!(
                    "Energy still rose after {} step reductions at iteration {}; accepting the step and resetting the L-BFGS history.",
                    config.max_backtracks,
                    iterations + 1
                );
                lbfgs.reset();
                reporter.report(Progress::HistoryReset {
                    iteration: iterations + 1,
                    reason: ResetReason::BacktrackingExhausted,
                });
                (x_last, e_last, g_last)
            });
        if !e_new.is_finite() {
            return Err(EngineError::NonFiniteEnergy {
                energy: e_new,
                iteration: iterations + 1,
            });
        }

        x = x_new;
        energy = e_new;
        gradient = g_new;
        iterations += 1;
        let current_rms = rms(&gradient);
        converged = current_rms <= config.tolerance;

        debug!(
            "Iteration {}: E = {:.8}, rms = {:.3e}",
            iterations, energy, current_rms
        );
        reporter.report(Progress::Iteration {
            iteration: iterations,
            energy,
            rms: current_rms,
        });
    }
    reporter.report(Progress::TaskFinish);

    let final_rms = rms(&gradient);
    if converged {
        info!(
            "Quench converged after {} iterations: E = {:.8}, rms = {:.3e}.",
            iterations, energy, final_rms
        );
    } else {
        warn!(
            "Quench stopped after {} iterations without converging: E = {:.8}, rms = {:.3e}.",
            iterations, energy, final_rms
        );
    }
    reporter.report(Progress::Message(format!(
        "E = {:.8}, rms = {:.3e}, {} iterations",
        energy, final_rms, iterations
    )));
    reporter.report(Progress::PhaseFinish);

    Ok(QuenchResult {
        coords: x,
        energy,
        gradient,
        rms: final_rms,
        iterations,
        function_evaluations: evaluator.count,
        converged,
    })
}

type Trial = (Vec<f64>, f64, Vec<f64>);

/// `Ok(Ok(trial))` for an accepted trial, `Ok(Err(trial))` with the last trial when every
/// reduction was rejected.
fn backtrack<P: Potential>(
    evaluator: &mut Evaluator<'_, P>,
    x: &[f64],
    energy: f64,
    step: &[f64],
    config: &QuenchConfig,
) -> Result<Result<Trial, Trial>, EngineError> {
    let mut factor = 1.0;
    let mut reductions = 0;
    loop {
        let mut trial = x.to_vec();
        axpy(factor, step, &mut trial);
        let (e_trial, g_trial) = evaluator.evaluate(&trial)?;

        // NaN energies fail this comparison and are backtracked like any rise.
        if e_trial - energy < config.max_energy_rise {
            return Ok(Ok((trial, e_trial, g_trial)));
        }
        if reductions == config.max_backtracks {
            return Ok(Err((trial, e_trial, g_trial)));
        }
        debug!(
            "Energy rose by {:.3e} with step factor {:.0e}; shortening step.",
            e_trial - energy,
            factor
        );
        factor /= 10.0;
        reductions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::potentials::PotentialFunction;
    use crate::core::potentials::lj::LennardJones;
    use crate::core::potentials::rigid::RigidBodyPotential;
    use crate::core::rigidbody::RigidBodyTopologyBuilder;
    use crate::core::rigidbody::fragments::otp;
    use crate::engine::config::{LbfgsConfig, LbfgsConfigBuilder, QuenchConfigBuilder};
    use std::sync::{Arc, Mutex};

    fn lbfgs_config(max_step: f64) -> LbfgsConfig {
        LbfgsConfigBuilder::new()
            .history_size(10)
            .max_step(max_step)
            .initial_inverse_hessian(0.1)
            .build()
            .unwrap()
    }

    fn quench_config(lbfgs: LbfgsConfig, max_iterations: usize, max_backtracks: usize) -> QuenchConfig {
        QuenchConfigBuilder::new()
            .lbfgs(lbfgs)
            .max_iterations(max_iterations)
            .tolerance(1e-6)
            .max_energy_rise(1e-4)
            .max_backtracks(max_backtracks)
            .build()
            .unwrap()
    }

    fn bowl() -> PotentialFunction<impl Fn(&[f64]) -> f64, impl Fn(&[f64]) -> (f64, Vec<f64>)> {
        let curvatures = [1.0, 4.0, 9.0, 0.25, 2.0];
        PotentialFunction::new(
            move |x: &[f64]| -> f64 { x.iter().zip(curvatures).map(|(xi, a)| 0.5 * a * xi * xi).sum() },
            move |x: &[f64]| {
                let e: f64 = x.iter().zip(curvatures).map(|(xi, a)| 0.5 * a * xi * xi).sum();
                let g: Vec<f64> = x.iter().zip(curvatures).map(|(xi, a)| a * xi).collect();
                (e, g)
            },
        )
    }

    // E = 50 x^2 in one dimension; a unit step from x = 0.1 overshoots badly.
    fn stiff_parabola() -> PotentialFunction<impl Fn(&[f64]) -> f64, impl Fn(&[f64]) -> (f64, Vec<f64>)> {
        PotentialFunction::new(
            |x: &[f64]| 50.0 * x[0] * x[0],
            |x: &[f64]| (50.0 * x[0] * x[0], vec![100.0 * x[0]]),
        )
    }

    fn unscaled_lbfgs(h0: f64, max_step: f64) -> LbfgsConfig {
        LbfgsConfigBuilder::new()
            .history_size(5)
            .max_step(max_step)
            .initial_inverse_hessian(h0)
            .scale_inverse_hessian(false)
            .build()
            .unwrap()
    }

    #[test]
    fn quench_converges_on_quadratic_bowl() {
        let config = quench_config(lbfgs_config(0.5), 1000, 10);
        let initial = [1.0, -2.0, 0.5, 3.0, -1.5];
        let result = run(&bowl(), &initial, &config, &ProgressReporter::new()).unwrap();

        assert!(result.converged);
        assert!(result.rms <= 1e-6);
        assert!(result.energy < 1e-10);
        assert!(result.coords.iter().all(|x| x.abs() < 1e-5));
        assert!(result.function_evaluations > result.iterations);
    }

    #[test]
    fn quench_at_minimum_returns_immediately() {
        let config = quench_config(lbfgs_config(0.5), 1000, 10);
        let result = run(&bowl(), &[0.0; 5], &config, &ProgressReporter::new()).unwrap();
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.function_evaluations, 1);
        assert_eq!(result.energy, 0.0);
    }

    #[test]
    fn quench_reports_non_convergence_at_iteration_limit() {
        let config = quench_config(lbfgs_config(0.01), 3, 10);
        let result = run(&bowl(), &[1.0, -2.0, 0.5, 3.0, -1.5], &config, &ProgressReporter::new())
            .unwrap();
        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn backtracking_shortens_an_overshooting_step() {
        let config = quench_config(unscaled_lbfgs(1.0, 1.0), 1, 10);
        let result = run(&stiff_parabola(), &[0.1], &config, &ProgressReporter::new()).unwrap();

        // Full step lands at x = -0.9 (E = 40.5), one tenfold reduction lands at x = 0.
        assert_eq!(result.iterations, 1);
        assert_eq!(result.function_evaluations, 3);
        assert_eq!(result.coords, vec![0.0]);
        assert!(result.converged);
    }

    #[test]
    fn exhausted_backtracking_accepts_last_trial() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));
        let config = quench_config(unscaled_lbfgs(1.0, 1.0), 1, 0);
        let result = run(&stiff_parabola(), &[0.1], &config, &reporter).unwrap();

        assert_eq!(result.iterations, 1);
        assert_eq!(result.function_evaluations, 2);
        assert!((result.coords[0] + 0.9).abs() < 1e-12);
        assert!(!result.converged);
        assert!(events.lock().unwrap().contains(&Progress::HistoryReset {
            iteration: 1,
            reason: ResetReason::BacktrackingExhausted,
        }));
    }

    #[test]
    fn non_finite_initial_energy_is_an_error() {
        let pot = PotentialFunction::new(|_: &[f64]| f64::NAN, |x: &[f64]| (f64::NAN, vec![0.0; x.len()]));
        let config = quench_config(lbfgs_config(0.1), 10, 10);
        let result = run(&pot, &[1.0, 2.0], &config, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::NonFiniteEnergy { iteration: 0, .. })
        ));
    }

    #[test]
    fn potential_errors_are_propagated() {
        let topology = RigidBodyTopologyBuilder::new()
            .add_site(otp())
            .finalize_setup(false)
            .unwrap();
        let pot = RigidBodyPotential::new(&topology, LennardJones::default());
        let config = quench_config(lbfgs_config(0.1), 10, 10);
        let result = run(&pot, &[0.0; 3], &config, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Potential { .. })));
    }

    #[test]
    fn quench_lowers_energy_of_otp_cluster() {
        let topology = RigidBodyTopologyBuilder::new()
            .add_sites((0..3).map(|_| otp()))
            .finalize_setup(true)
            .unwrap();
        let pot = RigidBodyPotential::new(&topology, LennardJones::default());
        let initial = vec![
            0.0, 0.0, 0.0, 0.1, 0.2, 0.3, //
            2.2, 0.3, 0.2, -0.4, 1.2, 0.6, //
            0.4, 2.1, -1.2, 2.0, -0.3, 0.9,
        ];
        let (e0, g0) = pot.energy_gradient(&initial).unwrap();

        let config = QuenchConfigBuilder::new()
            .lbfgs(lbfgs_config(0.1))
            .max_iterations(2000)
            .tolerance(1e-4)
            .max_energy_rise(1e-4)
            .max_backtracks(10)
            .build()
            .unwrap();
        let result = run(&pot, &initial, &config, &ProgressReporter::new()).unwrap();

        assert!(result.energy < e0, "{} !< {}", result.energy, e0);
        assert!(result.rms < rms(&g0));
        assert_eq!(result.coords.len(), initial.len());
        let (e_check, _) = pot.energy_gradient(&result.coords).unwrap();
        assert_eq!(e_check, result.energy);
    }

    #[test]
    fn quench_reports_progress_events_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));
        let config = quench_config(lbfgs_config(0.01), 4, 10);
        run(&bowl(), &[1.0, -2.0, 0.5, 3.0, -1.5], &config, &reporter).unwrap();

        let events = events.lock().unwrap();
        assert!(matches!(events.first(), Some(Progress::PhaseStart { name: "Quench" })));
        assert!(matches!(events[1], Progress::TaskStart { total_steps: 4 }));
        let iterations: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                Progress::Iteration { iteration, .. } => Some(*iteration),
                _ => None,
            })
            .collect();
        assert_eq!(iterations, vec![1, 2, 3, 4]);
        assert!(matches!(events.last(), Some(Progress::PhaseFinish)));
    }
}
