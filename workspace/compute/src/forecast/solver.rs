//! Penalised least squares via Cholesky factorisation of the normal equations.

use crate::error::{ComputeError, Result};

/// Solves `min ‖y − Xw‖² + Σ penalty_j·w_j²` for `w`.
///
/// `rows` holds the design matrix row by row; every row must have
/// `penalties.len()` columns.
pub fn ridge_solve(rows: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    let p = penalties.len();
    if rows.len() != y.len() {
        return Err(ComputeError::Numerical(format!(
            "design has {} rows but target has {}",
            rows.len(),
            y.len()
        )));
    }

    let mut gram = vec![0.0; p * p];
    let mut rhs = vec![0.0; p];
    for (row, target) in rows.iter().zip(y) {
        if row.len() != p {
            return Err(ComputeError::Numerical(format!(
                "design row has {} columns, expected {}",
                row.len(),
                p
            )));
        }
        for i in 0..p {
            if row[i] == 0.0 {
                continue;
            }
            rhs[i] += row[i] * target;
            for j in 0..=i {
                gram[i * p + j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        gram[i * p + i] += penalties[i];
    }

    let lower = cholesky(&gram, p)?;
    Ok(cholesky_solve(&lower, p, &rhs))
}

/// Lower-triangular factor of a symmetric positive definite matrix whose
/// lower triangle is stored row-major in `a`.
fn cholesky(a: &[f64], n: usize) -> Result<Vec<f64>> {
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let dot: f64 = (0..j).map(|k| l[i * n + k] * l[j * n + k]).sum();
            if i == j {
                let pivot = a[i * n + i] - dot;
                // Relative threshold so rounding noise on a singular system
                // is not mistaken for a tiny positive pivot.
                if !(pivot > a[i * n + i].abs() * 1e-12) || !pivot.is_finite() {
                    return Err(ComputeError::Numerical(format!(
                        "normal equations are not positive definite at column {}",
                        i
                    )));
                }
                l[i * n + i] = pivot.sqrt();
            } else {
                l[i * n + j] = (a[i * n + j] - dot) / l[j * n + j];
            }
        }
    }
    Ok(l)
}

fn cholesky_solve(l: &[f64], n: usize, b: &[f64]) -> Vec<f64> {
    // Forward substitution: L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let dot: f64 = (0..i).map(|k| l[i * n + k] * z[k]).sum();
        z[i] = (b[i] - dot) / l[i * n + i];
    }
    // Back substitution: Lᵀ w = z
    let mut w = vec![0.0; n];
    for i in (0..n).rev() {
        let dot: f64 = (i + 1..n).map(|k| l[k * n + i] * w[k]).sum();
        w[i] = (z[i] - dot) / l[i * n + i];
    }
    w
}
