//! Truncated singular-value decomposition via subspace iteration.
//!
//! Block power iteration on `AᵀA` converges to the top right-singular
//! vectors `V` of `A`; projecting the rows through them, `A·V = UΣ`,
//! gives the latent representation of each row without ever forming
//! `AᵀA` densely. Good enough for the ten or so components the item
//! similarity model uses, where exact singular values do not matter,
//! only the geometry of the latent rows.

use crate::sparse::CsrMatrix;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Truncated SVD over a sparse matrix
#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    n_components: usize,
    n_iterations: usize,
    seed: u64,
}

impl Default for TruncatedSvd {
    fn default() -> Self {
        Self {
            n_components: 10,
            n_iterations: 30,
            seed: 42,
        }
    }
}

impl TruncatedSvd {
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            ..Self::default()
        }
    }

    /// Override the iteration count (default: 30)
    pub fn with_iterations(mut self, n_iterations: usize) -> Self {
        self.n_iterations = n_iterations;
        self
    }

    /// Override the random seed used for the starting subspace
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Project the rows of `a` into the top-k latent space, returning
    /// an `n_rows × k` matrix (`UΣ`). The component count is clamped to
    /// `min(n_rows, n_cols)`.
    pub fn fit_transform(&self, a: &CsrMatrix) -> Array2<f32> {
        let k = self.n_components.min(a.n_rows()).min(a.n_cols());
        if k == 0 {
            return Array2::zeros((a.n_rows(), 0));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut q = Array2::from_shape_fn((a.n_cols(), k), |_| rng.random_range(-1.0f32..1.0));
        orthonormalize_columns(&mut q);

        for iteration in 0..self.n_iterations {
            // q ← orth(AᵀA q)
            let projected = a.mul_dense(&q);
            q = a.transpose_mul_dense(&projected);
            orthonormalize_columns(&mut q);

            if iteration == self.n_iterations - 1 {
                debug!(
                    components = k,
                    iterations = self.n_iterations,
                    "subspace iteration finished"
                );
            }
        }

        a.mul_dense(&q)
    }
}

/// Modified Gram-Schmidt over the columns of `q`, in place.
/// A column that collapses to (numerical) zero is left as zeros.
fn orthonormalize_columns(q: &mut Array2<f32>) {
    let k = q.ncols();
    for j in 0..k {
        for i in 0..j {
            let prior = q.column(i).to_owned();
            let proj = prior.dot(&q.column(j));
            q.column_mut(j).zip_mut_with(&prior, |x, &y| *x -= proj * y);
        }
        let norm = q.column(j).dot(&q.column(j)).sqrt();
        if norm > 1e-8 {
            q.column_mut(j).mapv_inplace(|x| x / norm);
        } else {
            q.column_mut(j).fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::cosine_similarity;

    fn latent_row(factors: &Array2<f32>, i: usize) -> Vec<f32> {
        factors.row(i).to_vec()
    }

    #[test]
    fn test_components_clamped_to_matrix_shape() {
        let a = CsrMatrix::from_triplets(2, 3, vec![(0, 0, 1.0), (1, 2, 2.0)]);
        let factors = TruncatedSvd::new(10).fit_transform(&a);
        assert_eq!(factors.nrows(), 2);
        assert_eq!(factors.ncols(), 2);
    }

    #[test]
    fn test_full_rank_projection_preserves_angles() {
        // With k = min(rows, cols) the projection is a rotation, so
        // latent cosines must match the raw row cosines.
        let a = CsrMatrix::from_triplets(
            3,
            3,
            vec![
                (0, 0, 5.0),
                (0, 1, 4.0),
                (1, 0, 5.0),
                (1, 1, 5.0),
                (2, 2, 3.0),
            ],
        );
        let factors = TruncatedSvd::new(3).fit_transform(&a);

        let sim_01 = cosine_similarity(&latent_row(&factors, 0), &latent_row(&factors, 1));
        let sim_02 = cosine_similarity(&latent_row(&factors, 0), &latent_row(&factors, 2));

        let raw_01 = a.row_cosine(0, 1);
        assert!((sim_01 - raw_01).abs() < 1e-3, "{sim_01} vs {raw_01}");
        assert!(sim_02.abs() < 1e-3);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = CsrMatrix::from_triplets(
            4,
            3,
            vec![(0, 0, 1.0), (1, 1, 2.0), (2, 2, 3.0), (3, 0, 4.0)],
        );
        let first = TruncatedSvd::new(2).with_seed(7).fit_transform(&a);
        let second = TruncatedSvd::new(2).with_seed(7).fit_transform(&a);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_matrix_zero_components() {
        let a = CsrMatrix::from_triplets(0, 0, vec![]);
        let factors = TruncatedSvd::default().fit_transform(&a);
        assert_eq!(factors.nrows(), 0);
    }
}
