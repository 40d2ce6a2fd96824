//! End-to-end tests: build a small movie table and run both
//! recommenders against it through the public API only.

use chrono::NaiveDate;
use data_loader::{Movie, MovieId, MovieTable};
use recommenders::{ContentRecommender, DemographicRanker, RecommendError};
use std::sync::Arc;

fn movie(id: MovieId, title: &str, overview: &str, vote_average: f64, vote_count: f64) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        overview: overview.to_string(),
        tagline: String::new(),
        status: "Released".to_string(),
        genres: vec!["Drama".to_string()],
        keywords: vec![],
        cast: vec![],
        director: None,
        popularity: 10.0,
        release_date: NaiveDate::from_ymd_opt(2010, 6, 1),
        vote_average,
        vote_count,
        budget: 1_000_000.0,
        revenue: 5_000_000.0,
        runtime: 110.0,
    }
}

fn catalog() -> Arc<MovieTable> {
    Arc::new(MovieTable::new(vec![
        movie(
            10,
            "Starfall",
            "a space adventure about a lost crew drifting between stars",
            8.1,
            4200.0,
        ),
        movie(
            11,
            "Beyond Orbit",
            "another space adventure where a crew repairs a dying station",
            7.4,
            3100.0,
        ),
        movie(
            12,
            "Courtroom Echoes",
            "a lawyer defends an innocent man against a hostile jury",
            7.9,
            2800.0,
        ),
        movie(
            13,
            "Silent Kitchen",
            "a chef rebuilds a failing restaurant one dish at a time",
            6.8,
            900.0,
        ),
        movie(14, "Unreleased Cut", "", 9.9, 3.0),
    ]))
}

#[test]
fn test_demographic_ranking_prefers_well_voted_movies() {
    let ranked = DemographicRanker::new(catalog()).rank(5);

    assert_eq!(ranked.len(), 5);
    // A 9.9 average from 3 votes must not beat an 8.1 from thousands
    assert_eq!(ranked[0].movie.title, "Starfall");
    assert_ne!(ranked[0].movie.title, "Unreleased Cut");

    // Scores come back best first
    for pair in ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_content_recommends_overlapping_overviews() {
    let rec = ContentRecommender::new(catalog());
    let results = rec.recommend("Starfall", 2).unwrap();

    // The other space movie shares the most vocabulary
    assert_eq!(results[0].title, "Beyond Orbit");
    assert!(results.iter().all(|m| m.title != "Starfall"));
    assert!(results.len() <= 2);
}

#[test]
fn test_content_similarity_is_symmetric() {
    let rec = ContentRecommender::new(catalog());
    let n = catalog().len();
    for i in 0..n {
        for j in 0..n {
            let forward = rec.similarity(i, j).unwrap();
            let backward = rec.similarity(j, i).unwrap();
            assert!((forward - backward).abs() < 1e-6);
        }
    }
}

#[test]
fn test_empty_overview_never_recommended_over_matches() {
    let rec = ContentRecommender::new(catalog());
    let results = rec.recommend("Beyond Orbit", 1).unwrap();
    assert_ne!(results[0].title, "Unreleased Cut");
}

#[test]
fn test_unknown_title_is_reported() {
    let rec = ContentRecommender::new(catalog());
    let err = rec.recommend("No Such Film", 5).unwrap_err();
    assert!(matches!(err, RecommendError::TitleNotFound { .. }));
    assert!(err.to_string().contains("No Such Film"));
}

#[test]
fn test_both_recommenders_share_one_table() {
    let table = catalog();
    let ranker = DemographicRanker::new(Arc::clone(&table));
    let content = ContentRecommender::new(Arc::clone(&table));

    assert_eq!(ranker.rank(10).len(), table.len());
    assert!(content.recommend("Silent Kitchen", 3).is_ok());
}
