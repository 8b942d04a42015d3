/// Rolling z-score of a series over a trailing inclusive window.
///
/// The output has the same length as the input. The first `window − 1`
/// entries are `None` (no valid rolling statistic yet); from then on the
/// value is `(x − mean) / std` with the sample standard deviation of the
/// trailing window. A zero-variance window yields the `Some(0.0)`
/// sentinel instead of dividing by zero.
pub fn rolling_zscore(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    if window < 2 || n < window {
        return out;
    }

    for i in (window - 1)..n {
        let trailing = &values[i + 1 - window..=i];
        let mean = trailing.iter().sum::<f64>() / window as f64;
        let variance = trailing.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / (window as f64 - 1.0);
        let std = variance.sqrt();
        out[i] = if std > 0.0 {
            Some((values[i] - mean) / std)
        } else {
            Some(0.0)
        };
    }

    out
}
