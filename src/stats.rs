//! Descriptive statistics over repeated timings.

use serde::{Deserialize, Serialize};

/// Summary of a set of millisecond samples after IQR outlier rejection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
    pub cv_percent: f64,
    pub sample_count: usize,
    pub outliers_removed: usize,
}

/// Compute [`Stats`] from raw samples.
///
/// Values outside `[Q1 - 1.5·IQR, Q3 + 1.5·IQR]` are dropped unless that would
/// leave fewer than two samples. `stddev` is the sample (n-1) deviation.
pub fn compute_stats(samples: &[f64]) -> Stats {
    match samples {
        [] => return Stats::default(),
        [only] => {
            return Stats {
                mean: *only,
                median: *only,
                min: *only,
                max: *only,
                sample_count: 1,
                ..Stats::default()
            }
        }
        _ => {}
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let fence = 1.5 * (q3 - q1);
    let kept: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|&v| v >= q1 - fence && v <= q3 + fence)
        .collect();
    let outliers_removed = sorted.len() - kept.len();
    let data = if kept.len() >= 2 { &kept } else { &sorted };

    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    Stats {
        mean,
        median: percentile(data, 50.0),
        min: data[0],
        max: data[data.len() - 1],
        stddev,
        cv_percent: if mean > 0.0 { stddev / mean * 100.0 } else { 0.0 },
        sample_count: data.len(),
        outliers_removed,
    }
}

/// Linear-interpolated percentile (0-100) of a sorted slice.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    match sorted {
        [] => 0.0,
        [only] => *only,
        _ => {
            let rank = pct / 100.0 * (sorted.len() - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let s = compute_stats(&[]);
        assert_eq!(s.sample_count, 0);
        assert_eq!(s.mean, 0.0);
    }

    #[test]
    fn test_single() {
        let s = compute_stats(&[4.5]);
        assert_eq!(s.mean, 4.5);
        assert_eq!(s.median, 4.5);
        assert_eq!(s.stddev, 0.0);
        assert_eq!(s.sample_count, 1);
    }

    #[test]
    fn test_basic() {
        let s = compute_stats(&[5.0, 1.0, 3.0, 2.0, 4.0]);
        assert!((s.mean - 3.0).abs() < 1e-12);
        assert!((s.median - 3.0).abs() < 1e-12);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 5.0);
        assert!((s.stddev - 2.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(s.outliers_removed, 0);
    }

    #[test]
    fn test_even_median() {
        let s = compute_stats(&[1.0, 2.0, 3.0, 4.0]);
        assert!((s.median - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_slow_first_run_rejected() {
        // a cold first iteration is the usual outlier
        let samples = [250.0, 10.0, 10.2, 9.9, 10.1, 10.0, 9.8, 10.0, 10.1, 9.9];
        let s = compute_stats(&samples);
        assert_eq!(s.outliers_removed, 1);
        assert!(s.max < 11.0);
        assert!(s.mean > 9.5 && s.mean < 10.5);
    }

    #[test]
    fn test_constant_samples_zero_cv() {
        let s = compute_stats(&[2.0; 6]);
        assert_eq!(s.stddev, 0.0);
        assert_eq!(s.cv_percent, 0.0);
    }

    #[test]
    fn test_cv_definition() {
        let s = compute_stats(&[10.0, 20.0]);
        assert!((s.cv_percent - s.stddev / s.mean * 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_percentile() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 25.0), 2.0);
        assert_eq!(percentile(&sorted, 100.0), 5.0);
        assert!((percentile(&[1.0, 2.0], 50.0) - 1.5).abs() < 1e-12);
    }
}
