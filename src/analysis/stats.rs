//! Descriptive statistics and significance tests
//!
//! Small free functions over `&[f64]`: mean, sample standard deviation,
//! Pearson correlation and a pooled two-sample t-test with the p-value
//! taken from the Student's t distribution.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Arithmetic mean; `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance; `None` below two observations
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Sample standard deviation
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Pearson correlation coefficient.
///
/// `None` when the slices differ in length, have fewer than two points,
/// or either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        let dx = a - mx;
        let dy = b - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}

/// Two-sided p-value of an independent two-sample t-test with pooled
/// (equal) variance.
///
/// `None` when either group has fewer than two observations or the
/// pooled variance is zero.
pub fn two_sample_t_test(a: &[f64], b: &[f64]) -> Option<f64> {
    let (na, nb) = (a.len(), b.len());
    if na < 2 || nb < 2 {
        return None;
    }
    let (ma, mb) = (mean(a)?, mean(b)?);
    let (va, vb) = (sample_variance(a)?, sample_variance(b)?);

    let df = (na + nb - 2) as f64;
    let pooled = ((na - 1) as f64 * va + (nb - 1) as f64 * vb) / df;
    if pooled <= 0.0 {
        return None;
    }

    let se = (pooled * (1.0 / na as f64 + 1.0 / nb as f64)).sqrt();
    let t = (ma - mb) / se;

    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some(2.0 * (1.0 - dist.cdf(t.abs())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0, 6.0]), Some(4.0));
        assert_eq!(sample_std(&[1.0]), None);
        // sample std of [2, 4, 4, 4, 5, 5, 7, 9] is ~2.138
        let s = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((s - 2.1381).abs() < 1e-4);
    }

    #[test]
    fn pearson_known_values() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let up = [2.0, 4.0, 6.0, 8.0, 10.0];
        let down = [10.0, 8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &down).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[1.0, 1.0, 1.0, 1.0, 1.0]), None);
        assert_eq!(pearson(&x, &up[..3]), None);
    }

    #[test]
    fn t_test_identical_groups_is_insignificant() {
        let a = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let p = two_sample_t_test(&a, &a).unwrap();
        assert!((p - 1.0).abs() < 1e-9);
    }

    #[test]
    fn t_test_separated_groups_is_significant() {
        let a = [1.0, 1.1, 0.9, 1.05, 0.95, 1.02];
        let b = [5.0, 5.1, 4.9, 5.05, 4.95, 5.02];
        let p = two_sample_t_test(&a, &b).unwrap();
        assert!(p < 1e-6);
    }

    #[test]
    fn t_test_degenerate_inputs() {
        assert_eq!(two_sample_t_test(&[1.0], &[1.0, 2.0]), None);
        assert_eq!(two_sample_t_test(&[1.0, 1.0], &[1.0, 1.0]), None);
    }
}
