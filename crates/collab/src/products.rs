//! Item-item collaborative recommender over product ratings.
//!
//! Products and users carry opaque string ids. The model factorizes the
//! user×item rating matrix with a truncated SVD and compares items by
//! the cosine of their latent rows. The factorization runs once at
//! construction; queries only read the cached factors, so repeated
//! lookups never repeat the linear algebra.

use crate::error::{CollabError, Result};
use crate::sparse::{CsrMatrix, cosine_similarity};
use crate::svd::TruncatedSvd;
use data_loader::ProductRating;
use ndarray::Array2;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Collaborative recommender for string-keyed product ratings
#[derive(Debug)]
pub struct ProductRecommender {
    /// Sorted unique ids; position is the dense matrix index
    product_ids: Vec<String>,
    user_ids: Vec<String>,
    product_index: HashMap<String, usize>,
    user_index: HashMap<String, usize>,

    /// user×item rating matrix
    ratings: CsrMatrix,

    /// items×k latent factors, fixed at construction
    item_factors: Array2<f32>,
}

impl ProductRecommender {
    /// Build the rating matrix and the latent item factors.
    #[instrument(skip(ratings), fields(ratings = ratings.len()))]
    pub fn new(ratings: &[ProductRating], n_components: usize) -> Result<Self> {
        if ratings.is_empty() {
            return Err(CollabError::EmptyTrainingSet);
        }

        let user_ids = sorted_unique(ratings.iter().map(|r| r.user_id.as_str()));
        let product_ids = sorted_unique(ratings.iter().map(|r| r.product_id.as_str()));
        let user_index = index_of(&user_ids);
        let product_index = index_of(&product_ids);

        let triplets = ratings
            .iter()
            .map(|r| {
                (
                    user_index[&r.user_id],
                    product_index[&r.product_id],
                    r.rating,
                )
            })
            .collect();
        let matrix = CsrMatrix::from_triplets(user_ids.len(), product_ids.len(), triplets);

        // Latent item rows come from factorizing the item×user view
        let item_factors = TruncatedSvd::new(n_components).fit_transform(&matrix.transpose());

        debug!(
            users = user_ids.len(),
            products = product_ids.len(),
            components = item_factors.ncols(),
            "built product recommender"
        );

        Ok(Self {
            product_ids,
            user_ids,
            product_index,
            user_index,
            ratings: matrix,
            item_factors,
        })
    }

    /// Up to `top_n` products most similar to `product_id`, most
    /// similar first, by latent-factor cosine. The query product is
    /// excluded.
    pub fn recommend(&self, product_id: &str, top_n: usize) -> Result<Vec<String>> {
        let query_idx =
            *self
                .product_index
                .get(product_id)
                .ok_or_else(|| CollabError::ItemNotFound {
                    item_id: product_id.to_string(),
                })?;

        let query_row = self.item_factors.row(query_idx).to_vec();
        let mut scored: Vec<(usize, f32)> = (0..self.product_ids.len())
            .filter(|&idx| idx != query_idx)
            .map(|idx| {
                let row = self.item_factors.row(idx).to_vec();
                (idx, cosine_similarity(&query_row, &row))
            })
            .collect();

        sort_by_score_desc(&mut scored);
        scored.truncate(top_n);

        Ok(scored
            .into_iter()
            .map(|(idx, _)| self.product_ids[idx].clone())
            .collect())
    }

    /// Products ranked by how many ratings they received, most first.
    /// Ties keep the sorted-id order of the grouping.
    pub fn get_popular_products(&self, top_n: usize) -> Vec<String> {
        let counts = self.ratings.col_counts();
        let mut ranked: Vec<(usize, usize)> = counts.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(top_n);
        ranked
            .into_iter()
            .map(|(idx, _)| self.product_ids[idx].clone())
            .collect()
    }

    /// Up to `top_n` users whose full rating vectors (missing entries
    /// as zero) are closest to `user_id` by cosine. The query user is
    /// excluded.
    pub fn get_similar_users(&self, user_id: &str, top_n: usize) -> Result<Vec<String>> {
        let query_idx = *self
            .user_index
            .get(user_id)
            .ok_or_else(|| CollabError::UserNotFound {
                user_id: user_id.to_string(),
            })?;

        let mut scored: Vec<(usize, f32)> = (0..self.user_ids.len())
            .filter(|&idx| idx != query_idx)
            .map(|idx| (idx, self.ratings.row_cosine(query_idx, idx)))
            .collect();

        sort_by_score_desc(&mut scored);
        scored.truncate(top_n);

        Ok(scored
            .into_iter()
            .map(|(idx, _)| self.user_ids[idx].clone())
            .collect())
    }
}

fn sorted_unique<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = ids.map(str::to_string).collect();
    out.sort_unstable();
    out.dedup();
    out
}

fn index_of(ids: &[String]) -> HashMap<String, usize> {
    ids.iter()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect()
}

/// Stable descending sort, so score ties keep ascending-index order
fn sort_by_score_desc(scored: &mut [(usize, f32)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
