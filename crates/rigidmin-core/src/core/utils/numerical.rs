//! Finite-difference derivatives.
//!
//! These are public so that callers can check the analytic gradients of the
//! potentials they hand to the minimizer.

/// Central-difference stencil used for a numerical first derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivativeKind {
    /// `(f(x+h) - f(x-h)) / 2h`, error `O(h^2)`.
    Central3,
    /// Five-point stencil, error `O(h^4)`.
    #[default]
    Central5,
    /// Seven-point stencil, error `O(h^6)`.
    Central7,
}

impl DerivativeKind {
    fn stencil(self) -> (&'static [(f64, f64)], f64) {
        // (offset, coefficient) pairs and the denominator in units of the step.
        match self {
            DerivativeKind::Central3 => (&[(-1.0, -1.0), (1.0, 1.0)], 2.0),
            DerivativeKind::Central5 => (
                &[(-2.0, 1.0), (-1.0, -8.0), (1.0, 8.0), (2.0, -1.0)],
                12.0,
            ),
            DerivativeKind::Central7 => (
                &[
                    (-3.0, -1.0),
                    (-2.0, 9.0),
                    (-1.0, -45.0),
                    (1.0, 45.0),
                    (2.0, -9.0),
                    (3.0, 1.0),
                ],
                60.0,
            ),
        }
    }
}

/// Numerical derivative of a scalar function of one variable.
pub fn slope(step: f64, kind: DerivativeKind, point: f64, mut value_fn: impl FnMut(f64) -> f64) -> f64 {
    let (terms, denom) = kind.stencil();
    let numer: f64 = terms
        .iter()
        .map(|&(offset, coeff)| coeff * value_fn(point + offset * step))
        .sum();
    numer / (denom * step)
}

/// `slope` for functions that can fail.
pub fn try_slope<E, F>(step: f64, kind: DerivativeKind, point: f64, mut value_fn: F) -> Result<f64, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let (terms, denom) = kind.stencil();
    let mut numer = 0.0;
    for &(offset, coeff) in terms {
        numer += coeff * value_fn(point + offset * step)?;
    }
    Ok(numer / (denom * step))
}

/// Numerical gradient of a scalar function of many variables.
///
/// Each component is differentiated independently, so this costs
/// `point.len() * stencil_width` evaluations of `value_fn`.
pub fn try_gradient<E, F>(step: f64, kind: DerivativeKind, point: &[f64], mut value_fn: F) -> Result<Vec<f64>, E>
where
    F: FnMut(&[f64]) -> Result<f64, E>,
{
    let mut work = point.to_vec();
    let mut gradient = Vec::with_capacity(point.len());
    for i in 0..point.len() {
        let center = point[i];
        let d = try_slope(step, kind, center, |xi| {
            work[i] = xi;
            value_fn(&work)
        })?;
        work[i] = center;
        gradient.push(d);
    }
    Ok(gradient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn slope_of_cubic_is_exact_for_higher_order_stencils() {
        let f = |x: f64| x * x * x - 2.0 * x;
        let expected = 3.0 * 1.5 * 1.5 - 2.0;
        for kind in [DerivativeKind::Central5, DerivativeKind::Central7] {
            let d = slope(1e-2, kind, 1.5, f);
            assert!((d - expected).abs() < 1e-9, "{:?}: {} vs {}", kind, d, expected);
        }
    }

    #[test]
    fn central_difference_has_second_order_error() {
        let d = slope(1e-3, DerivativeKind::Central3, 0.3, f64::sin);
        assert!((d - 0.3f64.cos()).abs() < 1e-6);
    }

    #[test]
    fn try_slope_propagates_errors() {
        let result = try_slope(1e-3, DerivativeKind::default(), 0.0, |x| {
            if x > 0.0 { Err("positive") } else { Ok(x) }
        });
        assert_eq!(result, Err("positive"));
    }

    #[test]
    fn gradient_of_quadratic_form_matches_analytic_result() {
        let f = |x: &[f64]| Ok::<_, Infallible>(x[0] * x[0] + 3.0 * x[0] * x[1] - x[2]);
        let point = [1.0, -2.0, 0.5];
        let grad = try_gradient(1e-4, DerivativeKind::Central5, &point, f).unwrap();
        let expected = [2.0 * 1.0 + 3.0 * -2.0, 3.0 * 1.0, -1.0];
        for (g, e) in grad.iter().zip(expected.iter()) {
            assert!((g - e).abs() < 1e-8);
        }
    }
}
