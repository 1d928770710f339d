//! Small dense least-squares solver
//!
//! Builds the normal equations `(XᵀX + diag(λ)) β = Xᵀy` and solves them with
//! a Cholesky factorisation. Sizes here are tens of columns, so dense
//! row-major `Vec<Vec<f64>>` is plenty.

use crate::{MathError, Result};

/// Fit `y ≈ X β` with a per-column ridge penalty.
///
/// `rows` are the design-matrix rows, `penalties[j]` is added to the `j`-th
/// diagonal entry of `XᵀX`.
pub fn ridge_regression(rows: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    if rows.is_empty() {
        return Err(MathError::InsufficientData(
            "Regression needs at least one observation".to_string(),
        ));
    }
    if rows.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Design matrix has {} rows but target has {} values",
            rows.len(),
            y.len()
        )));
    }

    let k = penalties.len();
    if let Some(bad) = rows.iter().position(|r| r.len() != k) {
        return Err(MathError::InvalidInput(format!(
            "Row {} has {} columns, expected {}",
            bad,
            rows[bad].len(),
            k
        )));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];

    for (row, &target) in rows.iter().zip(y) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in i..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    for i in 0..k {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
        xtx[i][i] += penalties[i];
    }

    solve_symmetric(&xtx, &xty).ok_or_else(|| {
        MathError::CalculationError(
            "Normal equations are not positive definite".to_string(),
        )
    })
}

/// Solve `A x = b` for symmetric positive definite `A` (Cholesky).
pub fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // A = L Lᵀ
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            if i == j {
                let diag = a[i][i] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[i][j] = diag.sqrt();
            } else {
                l[i][j] = (a[i][j] - sum) / l[j][j];
            }
        }
    }

    // L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| l[i][k] * z[k]).sum();
        z[i] = (b[i] - sum) / l[i][i];
    }

    // Lᵀ x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|k| l[k][i] * x[k]).sum();
        x[i] = (z[i] - sum) / l[i][i];
    }

    Some(x)
}
