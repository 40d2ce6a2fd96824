//! Demographic scoring: popularity-adjusted weighted ratings.
//!
//! ## Algorithm
//! For every movie with `v` votes and average rating `R`:
//!
//! ```text
//! score = v/(v+m) * R + m/(m+v) * C
//! ```
//!
//! where `C` is the mean rating across the table and `m` is the 90th
//! percentile of vote counts. A movie with few votes is pulled toward
//! the dataset mean, so a single 5.0 rating cannot outrank thousands of
//! consistent 4.x ratings. Both `C` and `m` are recomputed from the
//! current table on every call rather than frozen at construction.

use data_loader::{Movie, MovieTable};
use std::sync::Arc;
use tracing::debug;

/// A movie together with its weighted rating
#[derive(Debug, Clone)]
pub struct ScoredMovie {
    pub movie: Movie,
    pub score: f64,
}

/// Ranks the whole table by weighted rating
pub struct DemographicRanker {
    /// Shared reference to the normalized table (read-only)
    table: Arc<MovieTable>,

    /// Quantile of vote counts used as the minimum-votes threshold
    vote_quantile: f64,
}

impl DemographicRanker {
    pub fn new(table: Arc<MovieTable>) -> Self {
        Self {
            table,
            vote_quantile: 0.90,
        }
    }

    /// Configure the vote-count quantile (default: 0.90)
    pub fn with_vote_quantile(mut self, q: f64) -> Self {
        self.vote_quantile = q;
        self
    }

    /// Score every movie and return the top `top_n`, best first.
    /// An empty table yields an empty ranking; there is no failure mode.
    pub fn rank(&self, top_n: usize) -> Vec<ScoredMovie> {
        if self.table.is_empty() {
            return Vec::new();
        }

        let mean_vote = self
            .table
            .iter()
            .map(|m| m.vote_average)
            .sum::<f64>()
            / self.table.len() as f64;

        let mut vote_counts: Vec<f64> = self.table.iter().map(|m| m.vote_count).collect();
        let min_votes = quantile(&mut vote_counts, self.vote_quantile);

        debug!(
            mean_vote,
            min_votes, "computed demographic scoring thresholds"
        );

        let mut scored: Vec<ScoredMovie> = self
            .table
            .iter()
            .map(|movie| ScoredMovie {
                score: weighted_rating(movie.vote_count, movie.vote_average, min_votes, mean_vote),
                movie: movie.clone(),
            })
            .collect();

        // Stable sort: score ties keep table order
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_n);
        scored
    }
}

/// The IMDB-style weighted rating formula
fn weighted_rating(votes: f64, rating: f64, min_votes: f64, mean_vote: f64) -> f64 {
    (votes / (votes + min_votes)) * rating + (min_votes / (min_votes + votes)) * mean_vote
}

/// Quantile with linear interpolation between order statistics,
/// matching the reference table library. Sorts in place.
fn quantile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = (values.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        values[lo]
    } else {
        values[lo] + (values[hi] - values[lo]) * (pos - lo as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use data_loader::MovieId;

    fn movie(id: MovieId, title: &str, vote_average: f64, vote_count: f64) -> Movie {
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
            vote_average,
            vote_count,
            budget: 0.0,
            revenue: 0.0,
            runtime: 100.0,
        }
    }

    #[test]
    fn test_empty_table_empty_ranking() {
        let ranker = DemographicRanker::new(Arc::new(MovieTable::new(vec![])));
        assert!(ranker.rank(10).is_empty());
    }

    #[test]
    fn test_votes_outweigh_raw_rating() {
        // One perfect rating from a single vote vs. a solid rating from
        // thousands: the weighted formula must prefer the latter.
        let table = Arc::new(MovieTable::new(vec![
            movie(1, "One Perfect Vote", 10.0, 1.0),
            movie(2, "Crowd Favourite", 8.0, 5000.0),
            movie(3, "Filler A", 5.0, 100.0),
            movie(4, "Filler B", 5.5, 200.0),
            movie(5, "Filler C", 6.0, 300.0),
        ]));

        let ranked = DemographicRanker::new(table).rank(5);
        assert_eq!(ranked[0].movie.title, "Crowd Favourite");
        assert!(ranked[0].score > ranked.last().unwrap().score);

        let one_vote = ranked
            .iter()
            .find(|s| s.movie.title == "One Perfect Vote")
            .unwrap();
        assert!(one_vote.score < ranked[0].score);
    }

    #[test]
    fn test_score_monotone_in_votes_above_mean() {
        // Same above-mean rating, more votes -> score must not decrease
        let table = Arc::new(MovieTable::new(vec![
            movie(1, "Few Votes", 8.0, 10.0),
            movie(2, "Many Votes", 8.0, 1000.0),
            movie(3, "Baseline", 5.0, 100.0),
        ]));

        let ranked = DemographicRanker::new(table).rank(3);
        let few = ranked.iter().find(|s| s.movie.id == 1).unwrap().score;
        let many = ranked.iter().find(|s| s.movie.id == 2).unwrap().score;
        assert!(many >= few);
    }

    #[test]
    fn test_rank_respects_limit() {
        let movies = (0..20)
            .map(|i| movie(i, &format!("M{i}"), 6.0, 100.0 + i as f64))
            .collect();
        let ranked = DemographicRanker::new(Arc::new(MovieTable::new(movies)))
            .rank(5);
        assert_eq!(ranked.len(), 5);
    }

    #[test]
    fn test_quantile_interpolates() {
        let mut values = vec![1.0, 2.0, 3.0, 4.0];
        // pos = 3 * 0.9 = 2.7 -> 3.0 + 0.7 * (4.0 - 3.0)
        assert!((quantile(&mut values, 0.90) - 3.7).abs() < 1e-9);

        let mut single = vec![5.0];
        assert!((quantile(&mut single, 0.90) - 5.0).abs() < 1e-9);
    }
}
