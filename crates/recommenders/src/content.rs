//! Content-based recommendations from overview text.
//!
//! ## Algorithm
//! 1. Tokenize every overview (lowercase, alphanumeric runs of 2+
//!    characters, English stopwords removed)
//! 2. Build TF-IDF vectors with smoothed IDF and L2 row normalization,
//!    so cosine similarity reduces to a sparse dot product
//! 3. Compute the full n×n cosine matrix once at construction and cache
//!    it for the recommender's lifetime; this is the expensive step
//!    (quadratic in movie count) and must not run per query
//! 4. A query looks up a title's dense row, ranks every other movie by
//!    similarity, and returns the top N records
//!
//! An empty overview produces a zero vector: such a movie is similar to
//! nothing, and nothing ranks it above genuinely-matching text.

use crate::error::{RecommendError, Result};
use data_loader::{Movie, MovieTable};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// English stopwords excluded from the term vocabulary
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "both", "bottom", "but", "by", "call", "can", "cannot", "could", "did", "do",
    "does", "doing", "done", "down", "due", "during", "each", "either", "else", "elsewhere",
    "empty", "enough", "even", "ever", "every", "everyone", "everything", "everywhere", "except",
    "few", "first", "for", "former", "formerly", "from", "front", "full", "further", "get",
    "give", "go", "had", "has", "have", "he", "hence", "her", "here", "hereafter", "hereby",
    "herein", "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "if",
    "in", "indeed", "into", "is", "it", "its", "itself", "last", "latter", "latterly", "least",
    "less", "made", "many", "may", "me", "meanwhile", "might", "mine", "more", "moreover",
    "most", "mostly", "much", "must", "my", "myself", "namely", "neither", "never",
    "nevertheless", "next", "no", "nobody", "none", "nor", "not", "nothing", "now", "nowhere",
    "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others",
    "otherwise", "our", "ours", "ourselves", "out", "over", "own", "per", "perhaps", "please",
    "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "several", "she",
    "should", "since", "so", "some", "somehow", "someone", "something", "sometime", "sometimes",
    "somewhere", "still", "such", "than", "that", "the", "their", "them", "themselves", "then",
    "thence", "there", "thereafter", "thereby", "therefore", "therein", "thereupon", "these",
    "they", "this", "those", "though", "through", "throughout", "thru", "thus", "to",
    "together", "too", "top", "toward", "towards", "under", "until", "up", "upon", "us",
    "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Sparse TF-IDF row: (term index, weight) pairs sorted by term index,
/// L2-normalized. An empty overview is an empty row.
type SparseRow = Vec<(u32, f32)>;

/// Cached all-pairs cosine similarity, symmetric n×n
struct SimilarityMatrix {
    n: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i < self.n && j < self.n {
            Some(self.values[i * self.n + j])
        } else {
            None
        }
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.n..(i + 1) * self.n]
    }
}

/// Content-based recommender over the normalized movie table
pub struct ContentRecommender {
    table: Arc<MovieTable>,
    similarity: SimilarityMatrix,
}

impl ContentRecommender {
    /// Build TF-IDF vectors and the full similarity matrix.
    ///
    /// Construction cost is O(n²) in movie count; queries afterwards
    /// only read a cached row.
    #[instrument(skip(table), fields(movies = table.len()))]
    pub fn new(table: Arc<MovieTable>) -> Self {
        let rows = build_tfidf_rows(&table);
        let n = rows.len();

        // Unit-length rows make cosine a plain sparse dot product.
        // Each output row is independent, so compute them in parallel.
        let values: Vec<f32> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                let rows = &rows;
                (0..n).map(move |j| sparse_dot(&rows[i], &rows[j]))
            })
            .collect();

        debug!(movies = n, "built content similarity matrix");

        Self {
            table,
            similarity: SimilarityMatrix { n, values },
        }
    }

    /// Cosine similarity between two dense table indices
    pub fn similarity(&self, i: usize, j: usize) -> Option<f32> {
        self.similarity.get(i, j)
    }

    /// Recommend up to `top_n` movies most similar to `title`.
    ///
    /// The query movie itself is excluded (it is trivially its own best
    /// match). Ties are broken by table order: the sort is stable over
    /// candidates listed in ascending index order.
    pub fn recommend(&self, title: &str, top_n: usize) -> Result<Vec<Movie>> {
        let query_idx =
            self.table
                .index_of_title(title)
                .ok_or_else(|| RecommendError::TitleNotFound {
                    title: title.to_string(),
                })?;

        let scores = self.similarity.row(query_idx);
        let mut candidates: Vec<(usize, f32)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|&(idx, _)| idx != query_idx)
            .collect();

        candidates.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(top_n);

        Ok(candidates
            .into_iter()
            .filter_map(|(idx, _)| self.table.get(idx).cloned())
            .collect())
    }
}

/// Lowercase alphanumeric tokens of 2+ characters, stopwords removed
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2 && !STOPWORDS.contains(token))
        .map(|token| token.to_string())
        .collect()
}

/// Build L2-normalized TF-IDF rows for every overview in the table.
///
/// IDF is smoothed, `ln((1+n)/(1+df)) + 1`, so terms appearing in every
/// document still carry a positive weight and no division hits zero.
fn build_tfidf_rows(table: &MovieTable) -> Vec<SparseRow> {
    let docs: Vec<Vec<String>> = table.iter().map(|m| tokenize(&m.overview)).collect();

    // Vocabulary and document frequencies
    let mut vocab: HashMap<String, u32> = HashMap::new();
    let mut doc_freq: HashMap<u32, u32> = HashMap::new();
    for tokens in &docs {
        let mut seen: HashSet<u32> = HashSet::new();
        for token in tokens {
            let next_id = vocab.len() as u32;
            let term_id = *vocab.entry(token.clone()).or_insert(next_id);
            if seen.insert(term_id) {
                *doc_freq.entry(term_id).or_insert(0) += 1;
            }
        }
    }

    let n_docs = docs.len() as f32;
    docs.iter()
        .map(|tokens| {
            let mut counts: HashMap<u32, f32> = HashMap::new();
            for token in tokens {
                *counts.entry(vocab[token]).or_insert(0.0) += 1.0;
            }

            let mut row: SparseRow = counts
                .into_iter()
                .map(|(term_id, count)| {
                    let df = doc_freq[&term_id] as f32;
                    let idf = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;
                    (term_id, count * idf)
                })
                .collect();
            row.sort_unstable_by_key(|&(term_id, _)| term_id);

            let norm: f32 = row.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt();
            if norm > 0.0 {
                for entry in row.iter_mut() {
                    entry.1 /= norm;
                }
            }
            row
        })
        .collect()
}

/// Dot product of two index-sorted sparse rows
fn sparse_dot(a: &SparseRow, b: &SparseRow) -> f32 {
    let mut sum = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use data_loader::MovieId;

    fn movie(id: MovieId, title: &str, overview: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            overview: overview.to_string(),
            tagline: String::new(),
            status: "Released".to_string(),
            genres: vec![],
            keywords: vec![],
            cast: vec![],
            director: None,
            popularity: 1.0,
            release_date: NaiveDate::from_ymd_opt(2000, 1, 1),
            vote_average: 7.0,
            vote_count: 100.0,
            budget: 0.0,
            revenue: 0.0,
            runtime: 100.0,
        }
    }

    fn test_table() -> Arc<MovieTable> {
        Arc::new(MovieTable::new(vec![
            movie(1, "Robot Quest", "space adventure with robots"),
            movie(2, "Paris Nights", "romantic comedy in Paris"),
            movie(3, "Alien Quest", "another space adventure with aliens"),
            movie(4, "Blank", ""),
        ]))
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let rec = ContentRecommender::new(test_table());
        for i in 0..4 {
            for j in 0..4 {
                let a = rec.similarity(i, j).unwrap();
                let b = rec.similarity(j, i).unwrap();
                assert!((a - b).abs() < 1e-6, "sim[{i}][{j}] != sim[{j}][{i}]");
            }
        }
        // Non-empty overviews are perfectly similar to themselves
        for i in 0..3 {
            assert!((rec.similarity(i, i).unwrap() - 1.0).abs() < 1e-5);
        }
        // The empty overview is a zero vector, even against itself
        assert!(rec.similarity(3, 3).unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_shared_vocabulary_ranks_first() {
        let rec = ContentRecommender::new(test_table());
        let results = rec.recommend("Robot Quest", 3).unwrap();

        // "another space adventure with aliens" shares "space adventure"
        assert_eq!(results[0].title, "Alien Quest");
    }

    #[test]
    fn test_query_movie_excluded_and_count_respected() {
        let rec = ContentRecommender::new(test_table());
        let results = rec.recommend("Robot Quest", 2).unwrap();

        assert!(results.len() <= 2);
        assert!(results.iter().all(|m| m.title != "Robot Quest"));
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let rec = ContentRecommender::new(test_table());
        let err = rec.recommend("Nonexistent", 5).unwrap_err();
        assert!(matches!(err, RecommendError::TitleNotFound { .. }));
    }

    #[test]
    fn test_empty_overview_similar_to_nothing() {
        let rec = ContentRecommender::new(test_table());
        for j in 0..3 {
            assert!(rec.similarity(3, j).unwrap().abs() < 1e-6);
        }
    }

    #[test]
    fn test_tokenizer_drops_stopwords_and_short_tokens() {
        let tokens = tokenize("The robots, a robot: I saw!");
        assert_eq!(tokens, vec!["robots", "robot", "saw"]);
    }
}
