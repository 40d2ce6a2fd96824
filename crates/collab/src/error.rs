//! Error types for the collaborative recommenders.

use thiserror::Error;

/// Failures from model training and recommendation queries
#[derive(Error, Debug)]
pub enum CollabError {
    /// The queried product id never appeared in the ratings data
    #[error("Product '{item_id}' not found in the ratings data")]
    ItemNotFound { item_id: String },

    /// The queried user id never appeared in the ratings data
    #[error("User '{user_id}' not found in the ratings data")]
    UserNotFound { user_id: String },

    /// Training was attempted with no usable ratings
    #[error("Cannot train on an empty ratings set")]
    EmptyTrainingSet,

    /// A recommendation was requested before the model was trained
    #[error("Model has not been trained yet")]
    ModelNotTrained,
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CollabError>;
