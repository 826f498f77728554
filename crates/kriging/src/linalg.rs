//! Dense linear algebra routines needed by the Kriging system.
//!
//! The augmented variogram matrix of ordinary Kriging is symmetric but not
//! positive definite (its last diagonal entry is zero), so Cholesky does not
//! apply. It is factorized with a LU decomposition with partial pivoting
//! `P.A = L.U` which is computed once and then reused to solve the system
//! for as many right-hand sides as there are query points.

use crate::errors::{KrigingError, Result};
use linfa::Float;
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, Zip};

/// LU decomposition with partial pivoting of a square matrix.
#[derive(Debug, Clone)]
pub struct LuDecomposition<F: Float> {
    /// Unit lower triangle L (below the diagonal) and upper triangle U packed together
    lu: Array2<F>,
    /// Row `i` of `L.U` is row `perm[i]` of the decomposed matrix
    perm: Vec<usize>,
}

impl<F: Float> LuDecomposition<F> {
    /// Decompose the square matrix `a`.
    ///
    /// A pivot is considered to vanish when its magnitude is not greater than
    /// `tolerance` times the largest absolute entry of `a`, in which case
    /// [`KrigingError::SingularSystem`] is returned with the failing step.
    /// Matrices holding NaN or infinite entries are not checked: these
    /// values propagate into the solutions.
    pub fn new(a: &ArrayBase<impl Data<Elem = F>, Ix2>, tolerance: F) -> Result<Self> {
        let n = a.nrows();
        if n != a.ncols() {
            return Err(KrigingError::InvalidValueError(format!(
                "LU decomposition expects a square matrix, got ({}, {})",
                n,
                a.ncols()
            )));
        }
        if n == 0 {
            return Err(KrigingError::InsufficientData(0));
        }

        let checked = a.iter().all(|v| v.is_finite());
        let scale = a
            .iter()
            .fold(F::zero(), |acc, &v| acc.max(num_traits::Float::abs(v)));
        let threshold = if scale > F::zero() {
            tolerance * scale
        } else {
            tolerance
        };

        let mut lu = a.to_owned();
        let mut perm: Vec<usize> = (0..n).collect();
        for k in 0..n {
            let (p, pmax) = lu
                .slice(s![k.., k])
                .iter()
                .enumerate()
                .fold((k, F::zero()), |(p, pmax), (i, &v)| {
                    let v = num_traits::Float::abs(v);
                    if v > pmax {
                        (k + i, v)
                    } else {
                        (p, pmax)
                    }
                });
            // written negated so that a NaN column is rejected as well
            if checked && !(pmax > threshold) {
                return Err(KrigingError::SingularSystem {
                    pivot: k,
                    value: pmax.to_f64().unwrap_or(f64::NAN),
                });
            }
            if p != k {
                let (row_k, row_p) = lu.multi_slice_mut((s![k, ..], s![p, ..]));
                Zip::from(row_k)
                    .and(row_p)
                    .for_each(|a, b| std::mem::swap(a, b));
                perm.swap(k, p);
            }

            let (upper, mut lower) = lu.view_mut().split_at(Axis(0), k + 1);
            let pivot_row = upper.row(k);
            let pivot = pivot_row[k];
            for mut row in lower.rows_mut() {
                let factor = row[k] / pivot;
                row[k] = factor;
                if factor != F::zero() {
                    row.slice_mut(s![k + 1..])
                        .scaled_add(-factor, &pivot_row.slice(s![k + 1..]));
                }
            }
        }

        Ok(LuDecomposition { lu, perm })
    }

    /// Dimension of the decomposed matrix
    pub fn dim(&self) -> usize {
        self.lu.nrows()
    }

    /// Row permutation applied by partial pivoting
    pub fn permutation(&self) -> &[usize] {
        &self.perm
    }

    /// Solve `A.x = b` by forward then backward substitution.
    ///
    /// *Panics* if `b` length differs from the matrix dimension.
    pub fn solve(&self, b: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        let n = self.dim();
        assert_eq!(
            b.len(),
            n,
            "right-hand side length should match matrix dimension"
        );

        let mut x: Array1<F> = self.perm.iter().map(|&p| b[p]).collect();
        // L has a unit diagonal
        for i in 1..n {
            let acc = self.lu.slice(s![i, ..i]).dot(&x.slice(s![..i]));
            x[i] -= acc;
        }
        for i in (0..n).rev() {
            let acc = self.lu.slice(s![i, i + 1..]).dot(&x.slice(s![i + 1..]));
            x[i] = (x[i] - acc) / self.lu[[i, i]];
        }
        x
    }
}
