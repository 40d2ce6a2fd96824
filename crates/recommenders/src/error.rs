//! Error types for the table-driven recommenders.

use thiserror::Error;

/// Failures a recommender reports back to the caller.
///
/// A lookup miss is a distinguishable error, not an empty result: asking
/// for a title the table does not hold signals caller misuse, while a
/// valid query with no matches returns an empty (or short) ranking.
#[derive(Error, Debug)]
pub enum RecommendError {
    /// The queried title is not present in the movie table
    #[error("Title '{title}' not found in the dataset")]
    TitleNotFound { title: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, RecommendError>;
