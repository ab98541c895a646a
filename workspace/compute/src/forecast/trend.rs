//! Piecewise linear trend with rate changes at fixed changepoints.

/// `m + k·t + Σ δ_j·max(0, t − s_j)` over scaled time `t` (0 at the first
/// observation, 1 at the last).
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinear {
    /// Offset
    pub m: f64,
    /// Base growth rate
    pub k: f64,
    /// Changepoint positions in scaled time
    pub changepoints: Vec<f64>,
    /// Rate adjustments, one per changepoint
    pub deltas: Vec<f64>,
}

impl PiecewiseLinear {
    pub fn value(&self, t: f64) -> f64 {
        self.m + self.k * t + hinge_sum(t, &self.changepoints, &self.deltas)
    }

    /// Mean absolute rate adjustment, the scale of simulated future changes.
    pub fn mean_abs_delta(&self) -> f64 {
        if self.deltas.is_empty() {
            return 0.0;
        }
        self.deltas.iter().map(|d| d.abs()).sum::<f64>() / self.deltas.len() as f64
    }
}

/// `Σ δ_j·max(0, t − s_j)`
pub fn hinge_sum(t: f64, changepoints: &[f64], deltas: &[f64]) -> f64 {
    changepoints
        .iter()
        .zip(deltas)
        .map(|(s, delta)| delta * (t - s).max(0.0))
        .sum()
}

/// Places up to `requested` changepoints uniformly over the first
/// `range` share of the (sorted, scaled) history.
///
/// The count shrinks when the history is too short to hold it; fewer than
/// three observations in range yields no changepoints at all.
pub fn changepoint_positions(t: &[f64], requested: usize, range: f64) -> Vec<f64> {
    let hist_size = (t.len() as f64 * range).floor() as usize;
    let count = requested.min(hist_size.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }

    let last_index = (hist_size - 1) as f64;
    (1..=count)
        .map(|i| {
            let index = (last_index * i as f64 / count as f64).round() as usize;
            t[index]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaled(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 / (n - 1) as f64).collect()
    }

    #[test]
    fn test_value_bends_after_changepoint() {
        let trend = PiecewiseLinear {
            m: 1.0,
            k: 2.0,
            changepoints: vec![0.5],
            deltas: vec![-2.0],
        };

        assert!((trend.value(0.25) - 1.5).abs() < 1e-12);
        // Slope is zero after the changepoint.
        assert!((trend.value(0.75) - trend.value(1.0)).abs() < 1e-12);
        assert!((trend.mean_abs_delta() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_changepoints_cover_leading_share_of_history() {
        let t = scaled(1000);
        let cps = changepoint_positions(&t, 25, 0.8);

        assert_eq!(cps.len(), 25);
        assert!(cps.windows(2).all(|w| w[0] < w[1]));
        assert!(cps[0] > 0.0);
        assert!(*cps.last().unwrap() <= 0.8);
    }

    #[test]
    fn test_changepoints_shrink_for_short_history() {
        assert_eq!(changepoint_positions(&scaled(10), 25, 0.8).len(), 7);
        assert!(changepoint_positions(&scaled(2), 25, 0.8).is_empty());
    }
}
