use crate::factorial::LnFactorial;

/// Poisson pmf evaluated in log space, tolerating scores far beyond the reach
/// of integer factorials.
#[inline]
pub fn univariate(k: usize, lambda: f64, ln_factorial: &impl LnFactorial) -> f64 {
    if lambda <= 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    f64::exp(k as f64 * lambda.ln() - lambda - ln_factorial.ln_get(k))
}

/// The truncated pmf sequence `P(X = 0), P(X = 1), ..., P(X = max_score)`,
/// built by the multiplicative recurrence `p[k] = p[k - 1] · λ/k`. Sums to
/// one less the discarded tail beyond `max_score`.
pub fn mass_series(lambda: f64, max_score: usize) -> Vec<f64> {
    let mut series = Vec::with_capacity(max_score + 1);
    let mut mass = f64::exp(-lambda);
    series.push(mass);
    for k in 1..=max_score {
        mass *= lambda / k as f64;
        series.push(mass);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factorial::{Calculator, Lookup};
    use crate::probs::SliceExt;
    use crate::testing::assert_slice_f64_relative;
    use assert_float_eq::*;

    #[test]
    fn test_univariate() {
        assert_float_relative_eq!(0.36787944117144233, univariate(0, 1.0, &Calculator));
        assert_float_relative_eq!(0.36787944117144233, univariate(1, 1.0, &Calculator));
        assert_float_relative_eq!(0.18393972058572122, univariate(2, 1.0, &Calculator));
        assert_float_relative_eq!(0.0820849986238988, univariate(0, 2.5, &Calculator));
        assert_float_relative_eq!(0.205212496559747, univariate(1, 2.5, &Calculator));
        assert_float_relative_eq!(0.25651562069968387, univariate(2, 2.5, &Calculator));
    }

    #[test]
    fn test_univariate_large_rate() {
        let lookup = Lookup::default();
        assert_float_relative_eq!(0.043228963842010915, univariate(85, 85.0, &lookup));
        assert_float_relative_eq!(0.011398769060830342, univariate(100, 85.0, &lookup));
    }

    #[test]
    fn test_univariate_zero_rate() {
        assert_eq!(1.0, univariate(0, 0.0, &Calculator));
        assert_eq!(0.0, univariate(3, 0.0, &Calculator));
    }

    #[test]
    fn series_matches_univariate() {
        let series = mass_series(2.5, 3);
        assert_slice_f64_relative(
            &[
                0.0820849986238988,
                0.205212496559747,
                0.25651562069968387,
                0.2137630172497364,
            ],
            &series,
            1e-9,
        );
    }

    #[test]
    fn series_sums_to_one_when_tail_is_negligible() {
        let series = mass_series(85.0, 200);
        assert_float_absolute_eq!(1.0, series.sum(), 1e-9);
    }

    #[test]
    fn series_undercounts_with_a_tight_bound() {
        let series = mass_series(85.0, 120);
        assert_float_relative_eq!(0.9998624087218062, series.sum(), 1e-9);
    }
}
