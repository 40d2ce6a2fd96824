//! # Collab Crate
//!
//! Collaborative-filtering recommenders built on the ratings tables:
//!
//! - **sparse**: compressed sparse row matrix and cosine helpers
//! - **svd**: truncated SVD via seeded subspace iteration
//! - **products**: item-item recommender over string-keyed product
//!   ratings, plus popularity and similar-user queries
//! - **movies**: biased SGD matrix factorization for rating
//!   prediction, with k-fold cross-validation
//! - **error**: Error types for training and queries

// Public modules
pub mod error;
pub mod movies;
pub mod products;
pub mod sparse;
pub mod svd;

// Re-export commonly used types for convenience
pub use error::{CollabError, Result};
pub use movies::{
    FoldMetrics, MovieRecommendation, MovieRecommender, RatingScale, SvdConfig, SvdModel,
    cross_validate,
};
pub use products::ProductRecommender;
pub use sparse::{CsrMatrix, cosine_similarity};
pub use svd::TruncatedSvd;
