//! Benchmarks for the content similarity engine
//!
//! Run with: cargo bench --package recommenders
//!
//! Uses a synthetic catalog so the benchmark needs no dataset on disk.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{Movie, MovieTable};
use recommenders::ContentRecommender;
use std::sync::Arc;

const WORDS: &[&str] = &[
    "space", "crew", "adventure", "detective", "murder", "city", "love", "war", "family",
    "journey", "robot", "island", "secret", "heist", "dragon", "kingdom", "agent", "storm",
];

fn synthetic_table(n: usize) -> Arc<MovieTable> {
    let movies = (0..n)
        .map(|i| {
            let overview: Vec<&str> = (0..12)
                .map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()])
                .collect();
            Movie {
                id: i as u32,
                title: format!("Movie {i}"),
                overview: overview.join(" "),
                tagline: String::new(),
                status: "Released".to_string(),
                genres: vec![],
                keywords: vec![],
                cast: vec![],
                director: None,
                popularity: 1.0,
                release_date: NaiveDate::from_ymd_opt(2005, 1, 1),
                vote_average: 6.5,
                vote_count: 100.0,
                budget: 0.0,
                revenue: 0.0,
                runtime: 100.0,
            }
        })
        .collect();
    Arc::new(MovieTable::new(movies))
}

fn bench_build_similarity_matrix(c: &mut Criterion) {
    let table = synthetic_table(500);

    c.bench_function("build_similarity_matrix_500", |b| {
        b.iter(|| {
            let rec = ContentRecommender::new(black_box(Arc::clone(&table)));
            black_box(rec)
        })
    });
}

fn bench_recommend(c: &mut Criterion) {
    let table = synthetic_table(500);
    let rec = ContentRecommender::new(table);

    c.bench_function("recommend_top_10", |b| {
        b.iter(|| {
            let results = rec.recommend(black_box("Movie 42"), black_box(10)).unwrap();
            black_box(results)
        })
    });
}

criterion_group!(benches, bench_build_similarity_matrix, bench_recommend);
criterion_main!(benches);
