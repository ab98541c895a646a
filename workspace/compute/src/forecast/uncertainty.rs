//! Simulation of uncertainty intervals.
//!
//! Future trend paths get new changepoints at the historical rate, with
//! Laplace distributed rate changes as large on average as the fitted ones.
//! Observation noise is added on top for the `yhat` interval. Intervals are
//! the empirical quantiles of the simulated values at every row, widened
//! where needed so they always contain the point estimate.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal, Poisson};

use crate::error::{ComputeError, Result};

/// Point components at every row of the prediction table, in scaled units.
#[derive(Debug, Clone, Copy)]
pub struct SimulationInput<'a> {
    /// Scaled time of every row
    pub t: &'a [f64],
    /// Fitted trend at every row
    pub trend: &'a [f64],
    /// Sum of seasonal components at every row
    pub seasonal: &'a [f64],
    /// Observation noise standard deviation
    pub sigma: f64,
    /// Number of changepoints in the fitted history
    pub n_changepoints: usize,
    /// Mean absolute fitted rate change
    pub delta_scale: f64,
}

/// Lower and upper interval bounds, in scaled units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intervals {
    pub trend_lower: Vec<f64>,
    pub trend_upper: Vec<f64>,
    pub yhat_lower: Vec<f64>,
    pub yhat_upper: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct TrendChange {
    position: f64,
    delta: f64,
}

/// Draws the changepoints of one simulated future trend path.
struct FutureChanges {
    t_end: f64,
    count: Option<Poisson<f64>>,
    magnitude: Exp<f64>,
}

impl FutureChanges {
    fn new(n_changepoints: usize, t_max: f64, scale: f64) -> Result<Self> {
        let rate = n_changepoints as f64 * (t_max - 1.0);
        let count = if rate > 0.0 {
            Some(Poisson::new(rate).map_err(|e| {
                ComputeError::Numerical(format!("changepoint rate {}: {}", rate, e))
            })?)
        } else {
            None
        };
        let magnitude = Exp::new(1.0 / scale).map_err(|e| {
            ComputeError::Numerical(format!("changepoint scale {}: {}", scale, e))
        })?;

        Ok(Self {
            t_end: t_max,
            count,
            magnitude,
        })
    }

    /// New changepoints in `(1, t_max)`, sorted by position.
    fn sample(&self, rng: &mut StdRng) -> Vec<TrendChange> {
        let Some(count) = &self.count else {
            return Vec::new();
        };

        let n = count.sample(rng) as usize;
        let mut changes: Vec<TrendChange> = (0..n)
            .map(|_| {
                // Laplace(0, scale) as an exponential magnitude with a random sign.
                let magnitude = self.magnitude.sample(rng);
                TrendChange {
                    position: 1.0 + rng.random::<f64>() * (self.t_end - 1.0),
                    delta: if rng.random::<bool>() { magnitude } else { -magnitude },
                }
            })
            .collect();
        changes.sort_by(|a, b| a.position.total_cmp(&b.position));
        changes
    }
}

pub fn simulate_intervals(
    input: SimulationInput<'_>,
    samples: usize,
    interval_width: f64,
    seed: u64,
) -> Result<Intervals> {
    let rows = input.t.len();
    let yhat: Vec<f64> = (0..rows).map(|i| input.trend[i] + input.seasonal[i]).collect();
    if samples == 0 {
        return Ok(Intervals {
            trend_lower: input.trend.to_vec(),
            trend_upper: input.trend.to_vec(),
            yhat_lower: yhat.clone(),
            yhat_upper: yhat,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let t_max = input.t.iter().copied().fold(0.0, f64::max);
    // Deltas are drawn with a small floor so an all-zero fit still varies.
    let future = FutureChanges::new(input.n_changepoints, t_max, input.delta_scale + 1e-8)?;
    let noise = Normal::new(0.0, input.sigma)
        .map_err(|e| ComputeError::Numerical(format!("noise scale {}: {}", input.sigma, e)))?;

    let mut order: Vec<usize> = (0..rows).collect();
    order.sort_by(|a, b| input.t[*a].total_cmp(&input.t[*b]));

    // Row-major: the draws of row `i` are `offsets[i * samples..(i + 1) * samples]`.
    let mut offsets = vec![0.0; rows * samples];
    for s in 0..samples {
        let changes = future.sample(&mut rng);
        for (i, offset) in path_offsets(input.t, &order, &changes).into_iter().enumerate() {
            offsets[i * samples + s] = offset;
        }
    }

    let lower_q = (1.0 - interval_width) / 2.0;
    let upper_q = (1.0 + interval_width) / 2.0;
    let mut intervals = Intervals::default();
    let mut trend_draws = vec![0.0; samples];
    let mut yhat_draws = vec![0.0; samples];

    for i in 0..rows {
        let row = &offsets[i * samples..(i + 1) * samples];
        for s in 0..samples {
            trend_draws[s] = input.trend[i] + row[s];
            yhat_draws[s] = trend_draws[s] + input.seasonal[i] + noise.sample(&mut rng);
        }
        trend_draws.sort_by(f64::total_cmp);
        yhat_draws.sort_by(f64::total_cmp);

        intervals.trend_lower.push(quantile(&trend_draws, lower_q).min(input.trend[i]));
        intervals.trend_upper.push(quantile(&trend_draws, upper_q).max(input.trend[i]));
        intervals.yhat_lower.push(quantile(&yhat_draws, lower_q).min(yhat[i]));
        intervals.yhat_upper.push(quantile(&yhat_draws, upper_q).max(yhat[i]));
    }

    Ok(intervals)
}

/// `Σ δ_j·max(0, t − s_j)` at every row for position-sorted `changes`.
///
/// Rows are visited in increasing `t` (as given by `order`) with a running
/// slope `Σ δ_j` and offset `Σ δ_j·s_j` over the changes passed so far.
fn path_offsets(t: &[f64], order: &[usize], changes: &[TrendChange]) -> Vec<f64> {
    let mut offsets = vec![0.0; t.len()];
    let (mut slope, mut intercept, mut next) = (0.0, 0.0, 0);
    for &i in order {
        while next < changes.len() && changes[next].position <= t[i] {
            slope += changes[next].delta;
            intercept += changes[next].delta * changes[next].position;
            next += 1;
        }
        offsets[i] = slope * t[i] - intercept;
    }
    offsets
}

/// Linearly interpolated quantile of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let position = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let below = position.floor() as usize;
            let above = position.ceil() as usize;
            let weight = position - below as f64;
            sorted[below] * (1.0 - weight) + sorted[above] * weight
        }
    }
}
