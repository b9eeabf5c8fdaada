//! Symmetric linear solves for covariance systems

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::error::SingularMatrixError;

/// Condition number of a symmetric matrix, `|λ|max / |λ|min`
///
/// Returns `Singular` when every eigenvalue is zero or the smallest one is,
/// and `NonFinite` when the matrix holds NaN or infinity.
pub fn condition_number(matrix: &DMatrix<f64>) -> Result<f64, SingularMatrixError> {
    if matrix.is_empty() {
        return Err(SingularMatrixError::Empty);
    }
    if !matrix.is_square() {
        return Err(SingularMatrixError::DimensionMismatch {
            means: matrix.nrows(),
            rows: matrix.nrows(),
            cols: matrix.ncols(),
        });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(SingularMatrixError::NonFinite);
    }

    let eigenvalues = SymmetricEigen::new(matrix.clone()).eigenvalues;

    let mut min_abs = f64::INFINITY;
    let mut max_abs = 0.0f64;
    for &ev in eigenvalues.iter() {
        if !ev.is_finite() {
            return Err(SingularMatrixError::NonFinite);
        }
        min_abs = min_abs.min(ev.abs());
        max_abs = max_abs.max(ev.abs());
    }

    if max_abs == 0.0 || min_abs == 0.0 {
        return Err(SingularMatrixError::Singular);
    }

    Ok(max_abs / min_abs)
}

/// Solve `A·x = b` for symmetric `A` without inverting it
///
/// Refuses matrices whose condition number exceeds `max_condition`. Uses
/// Cholesky when `A` is positive definite and pivoted LU otherwise.
pub fn solve_symmetric(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    max_condition: f64,
) -> Result<DVector<f64>, SingularMatrixError> {
    if a.nrows() != a.ncols() || a.nrows() != b.len() {
        return Err(SingularMatrixError::DimensionMismatch {
            means: b.len(),
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    if b.iter().any(|v| !v.is_finite()) {
        return Err(SingularMatrixError::NonFinite);
    }

    let condition = condition_number(a)?;
    if condition > max_condition {
        return Err(SingularMatrixError::IllConditioned {
            condition_number: condition,
            limit: max_condition,
        });
    }

    let x = match a.clone().cholesky() {
        Some(chol) => chol.solve(b),
        None => {
            tracing::debug!("Cholesky failed (matrix not positive definite), using LU");
            a.clone().lu().solve(b).ok_or(SingularMatrixError::Singular)?
        }
    };

    if x.iter().any(|v| !v.is_finite()) {
        return Err(SingularMatrixError::Singular);
    }

    Ok(x)
}
