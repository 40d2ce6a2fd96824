//! # Data Loader Crate
//!
//! Loads and normalizes the tabular datasets behind the recommenders:
//! the TMDB-style movie metadata + credits pair, the movie ratings
//! table, and the beauty product ratings table.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, MovieTable, Rating, ProductRating)
//! - **parser**: CSV parsing and the movies ⟕ credits left join
//! - **normalize**: Field decoding, median imputation, row-drop policy
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{load_raw, normalize};
//! use std::path::Path;
//!
//! let raw = load_raw(
//!     Path::new("data/tmdb_5000_movies.csv"),
//!     Path::new("data/tmdb_5000_credits.csv"),
//! )?;
//! let (table, report) = normalize(raw);
//!
//! println!("{} movies, {} rows dropped", table.len(), report.rows_dropped);
//! ```
//!
//! The table that comes out of [`normalize`] is immutable from the
//! recommenders' point of view: they hold it behind an `Arc` and only
//! read it.

// Public modules
pub mod error;
pub mod normalize;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use normalize::{NormalizeReport, normalize};
pub use parser::{RawMovie, load_product_ratings, load_ratings, load_raw};
pub use types::{Movie, MovieId, MovieTable, ProductRating, Rating, UserId};
