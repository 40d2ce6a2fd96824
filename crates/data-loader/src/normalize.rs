//! Field normalization: raw joined rows → the immutable [`MovieTable`].
//!
//! Normalization is a pure transformation in two stages:
//! 1. field parsing: decode the serialized record lists (genres,
//!    keywords, cast, crew), extract the director, parse numerics and
//!    the release date. Unparseable list fields degrade to empty lists
//!    and are counted; nothing here can fail the run.
//! 2. imputation and row policy: median-impute missing numerics
//!    (budget/revenue treat a stored zero as missing), fill text fields
//!    with empty strings, then drop any row still missing a title or a
//!    release date and re-index densely from zero.
//!
//! The imputation order matters: medians are computed over the values
//! present before any fill, and the row drop runs only after every
//! recoverable field has been resolved.

use crate::parser::RawMovie;
use crate::types::{Movie, MovieId, MovieTable};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

/// Counts of best-effort degradations taken during normalization.
///
/// Parse failures never abort the table; they stay observable here.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeReport {
    pub malformed_genres: usize,
    pub malformed_keywords: usize,
    pub malformed_cast: usize,
    pub malformed_crew: usize,
    /// Rows removed for missing title or release date
    pub rows_dropped: usize,
}

impl NormalizeReport {
    pub fn malformed_total(&self) -> usize {
        self.malformed_genres + self.malformed_keywords + self.malformed_cast + self.malformed_crew
    }
}

/// One record of a serialized name list, e.g. `{"id": 28, "name": "Action"}`.
/// Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct NamedRecord {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CrewRecord {
    name: String,
    job: String,
}

/// Decode a serialized array of `{name}` records into a list of names.
/// Returns `None` when the text is present but unparseable.
fn parse_name_list(text: &str) -> Option<Vec<String>> {
    let records: Vec<NamedRecord> = serde_json::from_str(text).ok()?;
    Some(records.into_iter().map(|r| r.name).collect())
}

/// Scan crew records for the first member whose job is exactly
/// "Director". `Ok(None)` means no director was credited; `Err(())`
/// means the crew text itself was unparseable.
fn extract_director(text: &str) -> std::result::Result<Option<String>, ()> {
    let records: Vec<CrewRecord> = serde_json::from_str(text).map_err(|_| ())?;
    Ok(records
        .into_iter()
        .find(|r| r.job == "Director")
        .map(|r| r.name))
}

/// Intermediate row shape between field parsing and imputation. Numeric
/// fields are still optional here; the final [`Movie`] has them all
/// resolved.
#[derive(Debug, Clone)]
struct ParsedMovie {
    id: MovieId,
    title: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    status: Option<String>,
    genres: Vec<String>,
    keywords: Vec<String>,
    cast: Vec<String>,
    director: Option<String>,
    popularity: Option<f64>,
    release_date: Option<NaiveDate>,
    vote_average: Option<f64>,
    vote_count: Option<f64>,
    budget: Option<f64>,
    revenue: Option<f64>,
    runtime: Option<f64>,
}

impl From<&Movie> for ParsedMovie {
    /// Lift an already-normalized movie back into the intermediate
    /// shape. Used to check that normalization is idempotent.
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: Some(movie.title.clone()),
            overview: Some(movie.overview.clone()),
            tagline: Some(movie.tagline.clone()),
            status: Some(movie.status.clone()),
            genres: movie.genres.clone(),
            keywords: movie.keywords.clone(),
            cast: movie.cast.clone(),
            director: movie.director.clone(),
            popularity: Some(movie.popularity),
            release_date: movie.release_date,
            vote_average: Some(movie.vote_average),
            vote_count: Some(movie.vote_count),
            budget: Some(movie.budget),
            revenue: Some(movie.revenue),
            runtime: Some(movie.runtime),
        }
    }
}

fn parse_numeric(text: &Option<String>) -> Option<f64> {
    text.as_deref().and_then(|s| s.trim().parse().ok())
}

fn parse_fields(raw: Vec<RawMovie>) -> (Vec<ParsedMovie>, NormalizeReport) {
    let mut report = NormalizeReport::default();

    let parsed = raw
        .into_iter()
        .map(|row| {
            let genres = match row.genres.as_deref() {
                Some(text) => parse_name_list(text).unwrap_or_else(|| {
                    report.malformed_genres += 1;
                    Vec::new()
                }),
                None => Vec::new(),
            };
            let keywords = match row.keywords.as_deref() {
                Some(text) => parse_name_list(text).unwrap_or_else(|| {
                    report.malformed_keywords += 1;
                    Vec::new()
                }),
                None => Vec::new(),
            };
            let cast = match row.cast.as_deref() {
                Some(text) => parse_name_list(text).unwrap_or_else(|| {
                    report.malformed_cast += 1;
                    Vec::new()
                }),
                None => Vec::new(),
            };
            let director = match row.crew.as_deref() {
                Some(text) => match extract_director(text) {
                    Ok(director) => director,
                    Err(()) => {
                        report.malformed_crew += 1;
                        None
                    }
                },
                None => None,
            };

            let release_date = row
                .release_date
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());

            ParsedMovie {
                id: row.id,
                title: row.title.filter(|t| !t.is_empty()),
                overview: row.overview,
                tagline: row.tagline,
                status: row.status,
                genres,
                keywords,
                cast,
                director,
                popularity: parse_numeric(&row.popularity),
                release_date,
                vote_average: parse_numeric(&row.vote_average),
                vote_count: parse_numeric(&row.vote_count),
                budget: parse_numeric(&row.budget),
                revenue: parse_numeric(&row.revenue),
                runtime: parse_numeric(&row.runtime),
            }
        })
        .collect();

    (parsed, report)
}

/// Median over the present values, averaging the two middles for even
/// counts (matching the reference table library). Empty input → 0.0.
fn median(values: &mut Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

fn column_median<F>(rows: &[ParsedMovie], field: F) -> f64
where
    F: Fn(&ParsedMovie) -> Option<f64>,
{
    let mut values: Vec<f64> = rows.iter().filter_map(&field).collect();
    median(&mut values)
}

/// Budget and revenue treat a stored zero as missing: a zero is a data
/// entry placeholder in this domain, not a real figure.
fn column_median_nonzero<F>(rows: &[ParsedMovie], field: F) -> f64
where
    F: Fn(&ParsedMovie) -> Option<f64>,
{
    let mut values: Vec<f64> = rows.iter().filter_map(&field).filter(|&v| v != 0.0).collect();
    median(&mut values)
}

fn impute_and_drop(rows: Vec<ParsedMovie>) -> (Vec<Movie>, usize) {
    let popularity_median = column_median(&rows, |r| r.popularity);
    let vote_average_median = column_median(&rows, |r| r.vote_average);
    let vote_count_median = column_median(&rows, |r| r.vote_count);
    let runtime_median = column_median(&rows, |r| r.runtime);
    let budget_median = column_median_nonzero(&rows, |r| r.budget);
    let revenue_median = column_median_nonzero(&rows, |r| r.revenue);

    let total = rows.len();
    let movies: Vec<Movie> = rows
        .into_iter()
        .filter_map(|row| {
            // Unrecoverable rows: no title or no parseable release date
            let title = row.title?;
            let release_date = row.release_date?;

            let budget = match row.budget {
                Some(v) if v != 0.0 => v,
                _ => budget_median,
            };
            let revenue = match row.revenue {
                Some(v) if v != 0.0 => v,
                _ => revenue_median,
            };

            Some(Movie {
                id: row.id,
                title,
                overview: row.overview.unwrap_or_default(),
                tagline: row.tagline.unwrap_or_default(),
                status: row.status.unwrap_or_default(),
                genres: row.genres,
                keywords: row.keywords,
                cast: row.cast,
                director: row.director,
                popularity: row.popularity.unwrap_or(popularity_median),
                release_date: Some(release_date),
                vote_average: row.vote_average.unwrap_or(vote_average_median),
                vote_count: row.vote_count.unwrap_or(vote_count_median),
                budget,
                revenue,
                runtime: row.runtime.unwrap_or(runtime_median),
            })
        })
        .collect();

    let dropped = total - movies.len();
    (movies, dropped)
}

/// Normalize raw joined rows into the final table.
///
/// Consumes the input and returns a fresh table; nothing is mutated in
/// place, so a caller holding the raw rows elsewhere is unaffected.
pub fn normalize(raw: Vec<RawMovie>) -> (MovieTable, NormalizeReport) {
    let (parsed, mut report) = parse_fields(raw);
    let (movies, dropped) = impute_and_drop(parsed);
    report.rows_dropped = dropped;

    if report.malformed_total() > 0 || report.rows_dropped > 0 {
        warn!(
            malformed = report.malformed_total(),
            dropped = report.rows_dropped,
            "normalization degraded some rows"
        );
    }
    debug!(movies = movies.len(), "normalized movie table");

    (MovieTable::new(movies), report)
}
