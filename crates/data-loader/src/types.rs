//! Core domain types for the movie and product rating datasets.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with movie IDs

/// Unique identifier for a movie (TMDB id)
pub type MovieId = u32;

/// Unique identifier for a user in the movie-rating dataset
pub type UserId = u32;

// =============================================================================
// Movie Types
// =============================================================================

/// A movie record after normalization.
///
/// Invariant: every numeric field is present (median-imputed where the
/// source was missing), `title` is non-empty, and `release_date` is
/// `Some`; rows that could not satisfy this were dropped by
/// [`crate::normalize::normalize`]. The record is read-only input to the
/// scorers; nothing mutates it after normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Free-text synopsis; empty string when the source had none
    pub overview: String,
    pub tagline: String,
    pub status: String,
    /// Genre names extracted from the serialized genre records
    pub genres: Vec<String>,
    /// Keyword names extracted from the serialized keyword records
    pub keywords: Vec<String>,
    /// Cast member names, in billing order
    pub cast: Vec<String>,
    /// First crew member credited with the job "Director".
    ///
    /// `None` means no director was credited (or the crew field was
    /// unparseable), distinct from an empty string.
    pub director: Option<String>,
    pub popularity: f64,
    pub release_date: Option<NaiveDate>,
    pub vote_average: f64,
    pub vote_count: f64,
    pub budget: f64,
    pub revenue: f64,
    pub runtime: f64,
}

/// The normalized movie table.
///
/// Movies sit at dense indices 0..len with no gaps; downstream similarity
/// matrices use these positions as row/column indices, so the table must
/// not be reordered after construction.
#[derive(Debug, Default)]
pub struct MovieTable {
    movies: Vec<Movie>,
    /// Title -> dense index; first occurrence wins (titles are not unique)
    title_index: HashMap<String, usize>,
}

impl MovieTable {
    /// Build a table from normalized movies, indexing titles as we go.
    pub fn new(movies: Vec<Movie>) -> Self {
        let mut title_index = HashMap::with_capacity(movies.len());
        for (idx, movie) in movies.iter().enumerate() {
            title_index.entry(movie.title.clone()).or_insert(idx);
        }
        Self {
            movies,
            title_index,
        }
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Get a movie by dense index
    pub fn get(&self, idx: usize) -> Option<&Movie> {
        self.movies.get(idx)
    }

    /// Look up the dense index of a title (first occurrence)
    pub fn index_of_title(&self, title: &str) -> Option<usize> {
        self.title_index.get(title).copied()
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Movie> {
        self.movies.iter()
    }
}

// =============================================================================
// Rating Types
// =============================================================================

/// A single movie rating from a user
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value on the 1.0-5.0 scale
    pub rating: f32,
    /// Unix timestamp when the rating was made (parsed but unused)
    pub timestamp: i64,
}

/// A single product rating from the beauty dataset.
///
/// Both identifiers are opaque strings in the source data (Amazon-style
/// reviewer and ASIN codes), so no numeric aliases apply here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRating {
    pub user_id: String,
    pub product_id: String,
    pub rating: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            overview: String::new(),
            tagline: String::new(),
            status: "Released".to_string(),
            genres: vec![],
            keywords: vec![],
            cast: vec![],
            director: None,
            popularity: 1.0,
            release_date: NaiveDate::from_ymd_opt(2000, 1, 1),
            vote_average: 5.0,
            vote_count: 10.0,
            budget: 1_000_000.0,
            revenue: 2_000_000.0,
            runtime: 100.0,
        }
    }

    #[test]
    fn test_title_index_first_occurrence_wins() {
        let table = MovieTable::new(vec![
            movie(1, "Alpha"),
            movie(2, "Beta"),
            movie(3, "Alpha"),
        ]);

        assert_eq!(table.index_of_title("Alpha"), Some(0));
        assert_eq!(table.index_of_title("Beta"), Some(1));
        assert_eq!(table.index_of_title("Gamma"), None);
    }

    #[test]
    fn test_empty_table() {
        let table = MovieTable::new(vec![]);
        assert!(table.is_empty());
        assert!(table.get(0).is_none());
    }
}
