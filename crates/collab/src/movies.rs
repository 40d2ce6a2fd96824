//! Rating prediction via biased SGD matrix factorization.
//!
//! ## Model
//! A rating is estimated as
//!
//! ```text
//! r̂(u, i) = μ + b_u + b_i + p_u · q_i
//! ```
//!
//! where `μ` is the global mean and the biases and factor rows are
//! learned by stochastic gradient descent over the training ratings.
//! Users or items unseen at prediction time fall back to whichever
//! components are known, bottoming out at the global mean. Estimates
//! are clipped to the rating scale.

use crate::error::{CollabError, Result};
use data_loader::{MovieId, Rating, UserId};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// SGD hyperparameters
#[derive(Debug, Clone)]
pub struct SvdConfig {
    pub n_factors: usize,
    pub n_epochs: usize,
    pub learning_rate: f32,
    pub regularization: f32,
    pub seed: u64,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            n_factors: 100,
            n_epochs: 20,
            learning_rate: 0.005,
            regularization: 0.02,
            seed: 42,
        }
    }
}

/// Closed rating interval; predictions are clipped to it
#[derive(Debug, Clone, Copy)]
pub struct RatingScale {
    pub min: f32,
    pub max: f32,
}

impl Default for RatingScale {
    fn default() -> Self {
        Self { min: 1.0, max: 5.0 }
    }
}

impl RatingScale {
    fn clip(&self, estimate: f32) -> f32 {
        estimate.clamp(self.min, self.max)
    }
}

/// Trained factorization model
#[derive(Debug)]
pub struct SvdModel {
    scale: RatingScale,
    global_mean: f32,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<MovieId, usize>,
    user_bias: Vec<f32>,
    item_bias: Vec<f32>,
    user_factors: Array2<f32>,
    item_factors: Array2<f32>,
}

impl SvdModel {
    /// Train on the given ratings with SGD.
    #[instrument(skip(ratings, config), fields(ratings = ratings.len()))]
    pub fn fit(ratings: &[Rating], config: &SvdConfig, scale: RatingScale) -> Result<Self> {
        if ratings.is_empty() {
            return Err(CollabError::EmptyTrainingSet);
        }

        // Dense indices in first-occurrence order
        let mut user_index: HashMap<UserId, usize> = HashMap::new();
        let mut item_index: HashMap<MovieId, usize> = HashMap::new();
        for r in ratings {
            let next_user = user_index.len();
            user_index.entry(r.user_id).or_insert(next_user);
            let next_item = item_index.len();
            item_index.entry(r.movie_id).or_insert(next_item);
        }
        let n_users = user_index.len();
        let n_items = item_index.len();

        let global_mean =
            ratings.iter().map(|r| r.rating).sum::<f32>() / ratings.len() as f32;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut user_factors = Array2::from_shape_fn((n_users, config.n_factors), |_| {
            rng.random_range(-0.1f32..0.1)
        });
        let mut item_factors = Array2::from_shape_fn((n_items, config.n_factors), |_| {
            rng.random_range(-0.1f32..0.1)
        });
        let mut user_bias = vec![0.0f32; n_users];
        let mut item_bias = vec![0.0f32; n_items];

        let lr = config.learning_rate;
        let reg = config.regularization;

        for epoch in 0..config.n_epochs {
            let mut squared_error = 0.0f64;

            for r in ratings {
                let u = user_index[&r.user_id];
                let i = item_index[&r.movie_id];

                let mut dot = 0.0f32;
                for f in 0..config.n_factors {
                    dot += user_factors[[u, f]] * item_factors[[i, f]];
                }
                let err = r.rating - (global_mean + user_bias[u] + item_bias[i] + dot);
                squared_error += (err as f64) * (err as f64);

                user_bias[u] += lr * (err - reg * user_bias[u]);
                item_bias[i] += lr * (err - reg * item_bias[i]);

                for f in 0..config.n_factors {
                    let puf = user_factors[[u, f]];
                    let qif = item_factors[[i, f]];
                    user_factors[[u, f]] += lr * (err * qif - reg * puf);
                    item_factors[[i, f]] += lr * (err * puf - reg * qif);
                }
            }

            debug!(
                epoch,
                rmse = (squared_error / ratings.len() as f64).sqrt(),
                "training epoch complete"
            );
        }

        Ok(Self {
            scale,
            global_mean,
            user_index,
            item_index,
            user_bias,
            item_bias,
            user_factors,
            item_factors,
        })
    }

    /// Predict a rating, clipped to the scale. Unknown users or items
    /// contribute nothing beyond the components the model does know.
    pub fn predict(&self, user_id: UserId, movie_id: MovieId) -> f32 {
        let user = self.user_index.get(&user_id).copied();
        let item = self.item_index.get(&movie_id).copied();

        let mut estimate = self.global_mean;
        if let Some(u) = user {
            estimate += self.user_bias[u];
        }
        if let Some(i) = item {
            estimate += self.item_bias[i];
        }
        if let (Some(u), Some(i)) = (user, item) {
            estimate += self.user_factors.row(u).dot(&self.item_factors.row(i));
        }
        self.scale.clip(estimate)
    }

    pub fn knows_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }
}

/// One recommendation for a user
#[derive(Debug, Clone)]
pub struct MovieRecommendation {
    pub movie_id: MovieId,
    pub title: Option<String>,
    pub estimate: f32,
}

/// Per-fold cross-validation metrics
#[derive(Debug, Clone, Copy)]
pub struct FoldMetrics {
    pub rmse: f64,
    pub mae: f64,
}

/// Collaborative recommender over the movie ratings table
pub struct MovieRecommender {
    ratings: Vec<Rating>,
    titles: HashMap<MovieId, String>,
    config: SvdConfig,
    scale: RatingScale,
    model: Option<SvdModel>,
}

impl MovieRecommender {
    pub fn new(ratings: Vec<Rating>, titles: HashMap<MovieId, String>) -> Self {
        Self {
            ratings,
            titles,
            config: SvdConfig::default(),
            scale: RatingScale::default(),
            model: None,
        }
    }

    /// Override the training hyperparameters
    pub fn with_config(mut self, config: SvdConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the rating scale (default: 1.0 to 5.0)
    pub fn with_scale(mut self, scale: RatingScale) -> Self {
        self.scale = scale;
        self
    }

    /// Fit the factorization on the full ratings table
    pub fn train(&mut self) -> Result<()> {
        self.model = Some(SvdModel::fit(&self.ratings, &self.config, self.scale)?);
        Ok(())
    }

    /// Up to `top_n` movies the user has not rated, highest estimated
    /// rating first. Candidates keep first-occurrence order on ties.
    pub fn recommend(&self, user_id: UserId, top_n: usize) -> Result<Vec<MovieRecommendation>> {
        let model = self.model.as_ref().ok_or(CollabError::ModelNotTrained)?;
        if !model.knows_user(user_id) {
            return Err(CollabError::UserNotFound {
                user_id: user_id.to_string(),
            });
        }

        let rated: HashSet<MovieId> = self
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.movie_id)
            .collect();

        let mut seen: HashSet<MovieId> = HashSet::new();
        let mut candidates: Vec<MovieRecommendation> = self
            .ratings
            .iter()
            .filter(|r| !rated.contains(&r.movie_id))
            .filter(|r| seen.insert(r.movie_id))
            .map(|r| MovieRecommendation {
                movie_id: r.movie_id,
                title: self.titles.get(&r.movie_id).cloned(),
                estimate: model.predict(user_id, r.movie_id),
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.estimate
                .partial_cmp(&a.estimate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(top_n);
        Ok(candidates)
    }
}

/// K-fold cross-validated RMSE/MAE over a ratings table.
///
/// Purely a reporting tool: each fold trains a throwaway model on the
/// other folds and scores the held-out one. Requires at least `k`
/// ratings and `k >= 2`.
pub fn cross_validate(
    ratings: &[Rating],
    k: usize,
    config: &SvdConfig,
    scale: RatingScale,
    seed: u64,
) -> Result<Vec<FoldMetrics>> {
    if k < 2 || ratings.len() < k {
        return Err(CollabError::EmptyTrainingSet);
    }

    let mut indices: Vec<usize> = (0..ratings.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    // First `len % k` folds take one extra rating, so exactly k folds
    // always come out.
    let base = ratings.len() / k;
    let remainder = ratings.len() % k;
    let mut start = 0;
    let mut metrics = Vec::with_capacity(k);

    for fold in 0..k {
        let size = base + usize::from(fold < remainder);
        let test_indices = &indices[start..start + size];
        start += size;
        let held_out: HashSet<usize> = test_indices.iter().copied().collect();
        let train: Vec<Rating> = indices
            .iter()
            .filter(|&&idx| !held_out.contains(&idx))
            .map(|&idx| ratings[idx])
            .collect();

        let model = SvdModel::fit(&train, config, scale)?;

        let mut squared = 0.0f64;
        let mut absolute = 0.0f64;
        for &idx in test_indices {
            let r = &ratings[idx];
            let err = (model.predict(r.user_id, r.movie_id) - r.rating) as f64;
            squared += err * err;
            absolute += err.abs();
        }
        let n = test_indices.len() as f64;
        let fold_metrics = FoldMetrics {
            rmse: (squared / n).sqrt(),
            mae: absolute / n,
        };
        debug!(fold, rmse = fold_metrics.rmse, mae = fold_metrics.mae, "fold scored");
        metrics.push(fold_metrics);
    }

    Ok(metrics)
}
