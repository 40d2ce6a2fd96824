//! Compressed sparse row matrix for rating data.
//!
//! Rating matrices are extremely sparse (most users rate a handful of
//! items), so the factorization code never materializes a dense matrix.
//! The CSR layout gives cheap row iteration and the two dense-block
//! products the truncated SVD needs, `A·M` and `Aᵀ·M`.

use ndarray::Array2;

/// Sparse matrix in compressed sparse row form.
///
/// Column indices within each row are sorted ascending. Duplicate
/// (row, col) triplets are summed at construction.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f32>,
}

impl CsrMatrix {
    /// Build from (row, col, value) triplets, summing duplicates
    pub fn from_triplets(
        n_rows: usize,
        n_cols: usize,
        mut triplets: Vec<(usize, usize, f32)>,
    ) -> Self {
        triplets.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut row_ptr = vec![0usize; n_rows + 1];
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());

        let mut prev: Option<(usize, usize)> = None;
        for (row, col, value) in triplets {
            debug_assert!(row < n_rows && col < n_cols);
            if prev == Some((row, col)) {
                // Duplicate of the previous sorted entry: fold into it
                if let Some(last) = values.last_mut() {
                    *last += value;
                }
                continue;
            }
            col_idx.push(col);
            values.push(value);
            row_ptr[row + 1] += 1;
            prev = Some((row, col));
        }

        for row in 0..n_rows {
            row_ptr[row + 1] += row_ptr[row];
        }

        Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Column indices and values of one row, indices ascending
    pub fn row(&self, row: usize) -> (&[usize], &[f32]) {
        let span = self.row_ptr[row]..self.row_ptr[row + 1];
        (&self.col_idx[span.clone()], &self.values[span])
    }

    /// Non-zero count per column, e.g. ratings per item
    pub fn col_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_cols];
        for &col in &self.col_idx {
            counts[col] += 1;
        }
        counts
    }

    /// Dense product `A · M`, where `M` is `n_cols × k`
    pub fn mul_dense(&self, m: &Array2<f32>) -> Array2<f32> {
        let k = m.ncols();
        let mut out = Array2::zeros((self.n_rows, k));
        for row in 0..self.n_rows {
            let (cols, vals) = self.row(row);
            for (&col, &value) in cols.iter().zip(vals) {
                for j in 0..k {
                    out[[row, j]] += value * m[[col, j]];
                }
            }
        }
        out
    }

    /// Dense product `Aᵀ · M`, where `M` is `n_rows × k`
    pub fn transpose_mul_dense(&self, m: &Array2<f32>) -> Array2<f32> {
        let k = m.ncols();
        let mut out = Array2::zeros((self.n_cols, k));
        for row in 0..self.n_rows {
            let (cols, vals) = self.row(row);
            for (&col, &value) in cols.iter().zip(vals) {
                for j in 0..k {
                    out[[col, j]] += value * m[[row, j]];
                }
            }
        }
        out
    }

    /// Transposed copy in CSR form
    pub fn transpose(&self) -> CsrMatrix {
        let mut triplets = Vec::with_capacity(self.values.len());
        for row in 0..self.n_rows {
            let (cols, vals) = self.row(row);
            for (&col, &value) in cols.iter().zip(vals) {
                triplets.push((col, row, value));
            }
        }
        CsrMatrix::from_triplets(self.n_cols, self.n_rows, triplets)
    }

    /// Cosine similarity between two sparse rows, treating missing
    /// entries as zero. Returns 0.0 when either row is empty.
    pub fn row_cosine(&self, a: usize, b: usize) -> f32 {
        let (cols_a, vals_a) = self.row(a);
        let (cols_b, vals_b) = self.row(b);

        let mut dot = 0.0f32;
        let (mut i, mut j) = (0, 0);
        while i < cols_a.len() && j < cols_b.len() {
            match cols_a[i].cmp(&cols_b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += vals_a[i] * vals_b[j];
                    i += 1;
                    j += 1;
                }
            }
        }

        let norm_a: f32 = vals_a.iter().map(|v| v * v).sum::<f32>().sqrt();
        let norm_b: f32 = vals_b.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

/// Cosine similarity over dense slices, 0.0 for zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
