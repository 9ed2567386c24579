//! Dense LU factorization with partial pivoting.
//!
//! The simplex engine refactorizes its basis from scratch at every
//! iteration, so all that is needed here is a compact factorization of a
//! small square matrix together with solves against the matrix and its
//! transpose (for the primal step and for the dual values).

use derive_more::{Display, Error};
use faer::Mat;

use crate::{E, I};

#[derive(Debug, Display, Error, PartialEq)]
pub enum LinalgError {
    #[display("matrix is singular to working precision")]
    Singular,

    #[display("matrix is not square")]
    NotSquare,
}

/// A partial-pivoting LU factorization `PA = LU` of a square matrix.
#[derive(Debug)]
pub struct DenseLu {
    /// Combined factors: strictly lower part of `L` (unit diagonal
    /// implied) and `U` on and above the diagonal.
    lu: Mat<E>,
    /// `perm[k]` is the original row moved into position `k`.
    perm: Vec<I>,
    n: I,
}

impl DenseLu {
    const PIVOT_TOL: E = 1.0e-12;

    pub fn factorize(a: &Mat<E>) -> Result<Self, LinalgError> {
        if a.nrows() != a.ncols() {
            return Err(LinalgError::NotSquare);
        }
        let n = a.nrows();
        let mut lu = a.clone();
        let mut perm: Vec<I> = (0..n).collect();

        for k in 0..n {
            let mut pivot_row = k;
            let mut pivot_abs = lu[(k, k)].abs();
            for i in k + 1..n {
                let v = lu[(i, k)].abs();
                if v > pivot_abs {
                    pivot_abs = v;
                    pivot_row = i;
                }
            }
            if pivot_abs < Self::PIVOT_TOL {
                return Err(LinalgError::Singular);
            }
            if pivot_row != k {
                for j in 0..n {
                    let tmp = lu[(k, j)];
                    lu[(k, j)] = lu[(pivot_row, j)];
                    lu[(pivot_row, j)] = tmp;
                }
                perm.swap(k, pivot_row);
            }
            let pivot = lu[(k, k)];
            for i in k + 1..n {
                let factor = lu[(i, k)] / pivot;
                lu[(i, k)] = factor;
                for j in k + 1..n {
                    let delta = factor * lu[(k, j)];
                    lu[(i, j)] -= delta;
                }
            }
        }

        Ok(Self { lu, perm, n })
    }

    pub fn n(&self) -> I {
        self.n
    }

    /// Solves `A x = b`.
    pub fn solve(&self, b: &[E]) -> Vec<E> {
        let n = self.n;
        assert_eq!(b.len(), n, "DenseLu::solve: dimension mismatch");
        let mut x: Vec<E> = (0..n).map(|k| b[self.perm[k]]).collect();
        // L y = P b
        for k in 0..n {
            for j in 0..k {
                x[k] -= self.lu[(k, j)] * x[j];
            }
        }
        // U x = y
        for k in (0..n).rev() {
            for j in k + 1..n {
                x[k] -= self.lu[(k, j)] * x[j];
            }
            x[k] /= self.lu[(k, k)];
        }
        x
    }

    /// Solves `A^T x = c`.
    pub fn solve_transposed(&self, c: &[E]) -> Vec<E> {
        let n = self.n;
        assert_eq!(c.len(), n, "DenseLu::solve_transposed: dimension mismatch");
        // U^T z = c
        let mut z = vec![0.0; n];
        for k in 0..n {
            let mut v = c[k];
            for j in 0..k {
                v -= self.lu[(j, k)] * z[j];
            }
            z[k] = v / self.lu[(k, k)];
        }
        // L^T w = z
        let mut w = vec![0.0; n];
        for k in (0..n).rev() {
            let mut v = z[k];
            for j in k + 1..n {
                v -= self.lu[(j, k)] * w[j];
            }
            w[k] = v;
        }
        // x = P^T w
        let mut x = vec![0.0; n];
        for k in 0..n {
            x[self.perm[k]] = w[k];
        }
        x
    }
}
