//! # Recommenders Crate
//!
//! Table-driven recommenders over the normalized movie table:
//!
//! - **demographic**: IMDB-style weighted ratings, a single global
//!   ranking that needs no query context
//! - **content**: TF-IDF over overview text with an all-pairs cosine
//!   similarity matrix, queried by title
//! - **error**: Error types for recommendation queries
//!
//! Both recommenders share the table behind an `Arc` and never mutate
//! it, so one loaded dataset can back any number of them.

// Public modules
pub mod content;
pub mod demographic;
pub mod error;

// Re-export commonly used types for convenience
pub use content::ContentRecommender;
pub use demographic::{DemographicRanker, ScoredMovie};
pub use error::{RecommendError, Result};
