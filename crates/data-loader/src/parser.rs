//! CSV parsing and the movies ⟕ credits join.
//!
//! Three input shapes are handled here:
//! - movie metadata (`tmdb_5000_movies.csv` layout): one row per movie,
//!   with genre/keyword lists embedded as serialized record arrays
//! - movie credits (`tmdb_5000_credits.csv` layout): cast and crew
//!   record arrays keyed by `movie_id`
//! - rating tables for both domains (movie ratings keyed by numeric ids,
//!   product ratings keyed by opaque string ids)
//!
//! Parsing stops at raw field extraction; decoding the embedded record
//! arrays and imputing missing values belongs to [`crate::normalize`].

use crate::error::{DataLoadError, Result};
use crate::types::{MovieId, ProductRating, Rating};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// A movie row joined with its credits, before normalization.
///
/// Every field except the id is optional: the loader keeps whatever the
/// source had and leaves the missing-value policy to the normalizer.
/// Rows present only in the movies file keep `None` cast/crew.
#[derive(Debug, Clone, Default)]
pub struct RawMovie {
    pub id: MovieId,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    /// Serialized array of `{name}` records
    pub genres: Option<String>,
    /// Serialized array of `{name}` records
    pub keywords: Option<String>,
    /// Serialized array of `{name}` records, from the credits file
    pub cast: Option<String>,
    /// Serialized array of `{name, job}` records, from the credits file
    pub crew: Option<String>,
    pub popularity: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<String>,
    pub vote_count: Option<String>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub runtime: Option<String>,
}

/// The fixed projection of the movies file. Columns outside this set
/// (homepage, production companies, spoken languages, ...) are dropped
/// by virtue of never being deserialized.
#[derive(Debug, Deserialize)]
struct MovieRecord {
    id: MovieId,
    title: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    status: Option<String>,
    genres: Option<String>,
    keywords: Option<String>,
    popularity: Option<String>,
    release_date: Option<String>,
    vote_average: Option<String>,
    vote_count: Option<String>,
    budget: Option<String>,
    revenue: Option<String>,
    runtime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreditRecord {
    movie_id: MovieId,
    cast: Option<String>,
    crew: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId")]
    user_id: u32,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: f32,
    timestamp: i64,
}

/// Product rating rows are lenient: rows with any missing field are
/// dropped during cleaning instead of failing the load.
#[derive(Debug, Deserialize)]
struct ProductRatingRecord {
    #[serde(rename = "UserId")]
    user_id: Option<String>,
    #[serde(rename = "ProductId")]
    product_id: Option<String>,
    #[serde(rename = "Rating")]
    rating: Option<f32>,
    /// Only participates in duplicate detection; not retained
    #[serde(rename = "Timestamp")]
    timestamp: Option<String>,
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(csv::Reader::from_path(path)?)
}

/// Fail early with a clear error if the join key is absent, rather than
/// surfacing a serde message about a missing field mid-file.
fn require_column(reader: &mut csv::Reader<std::fs::File>, file: &Path, column: &str) -> Result<()> {
    let headers = reader.headers()?;
    if headers.iter().any(|h| h == column) {
        Ok(())
    } else {
        Err(DataLoadError::MissingColumn {
            file: file.display().to_string(),
            column: column.to_string(),
        })
    }
}

fn parse_movie_records(path: &Path) -> Result<Vec<MovieRecord>> {
    let mut reader = open_reader(path)?;
    require_column(&mut reader, path, "id")?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: MovieRecord = result?;
        records.push(record);
    }
    Ok(records)
}

fn parse_credit_records(path: &Path) -> Result<Vec<CreditRecord>> {
    let mut reader = open_reader(path)?;
    require_column(&mut reader, path, "movie_id")?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: CreditRecord = result?;
        records.push(record);
    }
    Ok(records)
}

/// Load the movie metadata and credits files and left-join credits onto
/// movies by id. Output preserves the movies-file row order.
pub fn load_raw(movies_path: &Path, credits_path: &Path) -> Result<Vec<RawMovie>> {
    // The two files are independent, so parse them in parallel
    let (movies, credits) = rayon::join(
        || parse_movie_records(movies_path),
        || parse_credit_records(credits_path),
    );
    let movies = movies?;
    let credits = credits?;

    debug!(
        movies = movies.len(),
        credits = credits.len(),
        "parsed movie and credit files"
    );

    let mut credits_by_id: HashMap<MovieId, CreditRecord> = credits
        .into_iter()
        .map(|record| (record.movie_id, record))
        .collect();

    let joined = movies
        .into_iter()
        .map(|m| {
            let credit = credits_by_id.remove(&m.id);
            let (cast, crew) = match credit {
                Some(c) => (c.cast, c.crew),
                None => (None, None),
            };
            RawMovie {
                id: m.id,
                title: m.title,
                overview: m.overview,
                tagline: m.tagline,
                status: m.status,
                genres: m.genres,
                keywords: m.keywords,
                cast,
                crew,
                popularity: m.popularity,
                release_date: m.release_date,
                vote_average: m.vote_average,
                vote_count: m.vote_count,
                budget: m.budget,
                revenue: m.revenue,
                runtime: m.runtime,
            }
        })
        .collect();

    Ok(joined)
}

/// Load the movie ratings table (`userId,movieId,rating,timestamp`).
pub fn load_ratings(path: &Path) -> Result<Vec<Rating>> {
    let mut reader = open_reader(path)?;
    require_column(&mut reader, path, "userId")?;

    let mut ratings = Vec::new();
    for result in reader.deserialize() {
        let record: RatingRecord = result?;
        ratings.push(Rating {
            user_id: record.user_id,
            movie_id: record.movie_id,
            rating: record.rating,
            timestamp: record.timestamp,
        });
    }
    debug!(ratings = ratings.len(), "loaded movie ratings");
    Ok(ratings)
}

/// Load the beauty product ratings table (`UserId,ProductId,Rating,Timestamp`).
///
/// Cleaning matches the source pipeline: exact duplicate rows and rows
/// with any missing field are removed; first-occurrence order is kept.
/// The timestamp column is not retained.
pub fn load_product_ratings(path: &Path) -> Result<Vec<ProductRating>> {
    let mut reader = open_reader(path)?;
    require_column(&mut reader, path, "UserId")?;

    let mut ratings = Vec::new();
    let mut seen: HashSet<(String, String, u32, String)> = HashSet::new();
    let mut dropped = 0usize;

    for result in reader.deserialize() {
        let record: ProductRatingRecord = result?;
        let (user_id, product_id, rating) = match (record.user_id, record.product_id, record.rating)
        {
            (Some(u), Some(p), Some(r)) if !u.is_empty() && !p.is_empty() => (u, p, r),
            _ => {
                dropped += 1;
                continue;
            }
        };
        // Duplicates are full-row duplicates, timestamp included
        let timestamp = record.timestamp.unwrap_or_default();
        if seen.insert((user_id.clone(), product_id.clone(), rating.to_bits(), timestamp)) {
            ratings.push(ProductRating {
                user_id,
                product_id,
                rating,
            });
        } else {
            dropped += 1;
        }
    }

    debug!(
        ratings = ratings.len(),
        dropped, "loaded product ratings"
    );
    Ok(ratings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    const MOVIES_CSV: &str = "\
budget,genres,id,keywords,overview,popularity,release_date,revenue,runtime,status,tagline,title,vote_average,vote_count
1000,\"[{\"\"id\"\": 28, \"\"name\"\": \"\"Action\"\"}]\",1,[],An action movie,5.5,2001-06-01,2000,120,Released,Boom,First Movie,7.1,100
0,[],2,[],,1.2,1999-01-15,0,90,Released,,Second Movie,6.0,50
";

    const CREDITS_CSV: &str = "\
movie_id,title,cast,crew
1,First Movie,\"[{\"\"name\"\": \"\"Jane Lead\"\"}]\",\"[{\"\"name\"\": \"\"Sam Dir\"\", \"\"job\"\": \"\"Director\"\"}]\"
";

    #[test]
    fn test_left_join_keeps_movies_without_credits() {
        let dir = tempfile::tempdir().unwrap();
        let movies = write_file(&dir, "movies.csv", MOVIES_CSV);
        let credits = write_file(&dir, "credits.csv", CREDITS_CSV);

        let raw = load_raw(&movies, &credits).unwrap();
        assert_eq!(raw.len(), 2);

        // Movie 1 picked up its credits
        assert!(raw[0].cast.is_some());
        assert!(raw[0].crew.is_some());

        // Movie 2 has no credits row and keeps absent cast/crew
        assert_eq!(raw[1].id, 2);
        assert!(raw[1].cast.is_none());
        assert!(raw[1].crew.is_none());
    }

    #[test]
    fn test_missing_join_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let movies = write_file(&dir, "movies.csv", "foo,bar\n1,2\n");
        let credits = write_file(&dir, "credits.csv", CREDITS_CSV);

        let err = load_raw(&movies, &credits).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { .. }));
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let credits = write_file(&dir, "credits.csv", CREDITS_CSV);

        let err = load_raw(&dir.path().join("nope.csv"), &credits).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_movie_ratings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "ratings.csv",
            "userId,movieId,rating,timestamp\n1,10,4.5,964982703\n2,10,3.0,964982931\n",
        );

        let ratings = load_ratings(&path).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].user_id, 1);
        assert_eq!(ratings[0].movie_id, 10);
        assert!((ratings[0].rating - 4.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_product_ratings_dedup_and_dropna() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "beauty.csv",
            "UserId,ProductId,Rating,Timestamp\n\
             u1,p1,5.0,1\n\
             u1,p1,5.0,1\n\
             ,p2,4.0,3\n\
             u2,p2,4.0,4\n",
        );

        let ratings = load_product_ratings(&path).unwrap();
        // Duplicate (u1,p1,5.0) and the row with a missing user are gone
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].user_id, "u1");
        assert_eq!(ratings[1].product_id, "p2");
    }
}
