//! Similarity retrieval
//!
//! Resolves a query title to a corpus row, scores every other row by cosine
//! similarity in fixed-size batches, and ranks the result. Unmatched queries
//! and empty candidate sets fall back to the head of the corpus.

use crate::index::FeatureMatrix;
use crate::normalize::normalize;
use crate::{Error, Item, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, warn};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

pub const NOTE_QUERY_NOT_FOUND: &str = "fallback (query not found)";
pub const NOTE_NO_SIMILAR_ITEMS: &str = "fallback (no similar items found)";

/// One recommended book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub image_url: Option<String>,
    pub similarity_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Recommendation {
    fn from_item(item: &Item, score: f32, note: Option<&str>) -> Self {
        let score = f64::from(score);
        Self {
            title: item.title().to_string(),
            author: item.author().to_string(),
            year: item.year(),
            image_url: item.image_url().map(str::to_string),
            similarity_score: if score.is_finite() { score } else { 0.0 },
            note: note.map(str::to_string),
        }
    }
}

/// Result of resolving a query title against a corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found(usize),
    NotFound,
}

/// Normalize a query title, rejecting input that leaves nothing to match.
pub fn normalize_query(query_title: &str) -> Result<String> {
    let normalized = normalize(query_title);
    if normalized.trim().is_empty() {
        return Err(Error::InvalidInput("Book title is required".to_string()));
    }
    Ok(normalized)
}

/// First corpus row whose normalized title contains `normalized_query`
pub fn lookup(corpus: &[Item], normalized_query: &str) -> Lookup {
    corpus
        .iter()
        .position(|item| item.title_contains(normalized_query))
        .map_or(Lookup::NotFound, Lookup::Found)
}

/// Cosine similarity of two sparse rows given their norms; 0 for zero vectors
#[inline]
pub fn cosine(dot: f32, norm_a: f32, norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Batched cosine retriever
#[derive(Debug, Clone, Copy)]
pub struct Retriever {
    batch_size: usize,
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl Retriever {
    /// `batch_size` of 0 is treated as 1
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size: batch_size.max(1) }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Recommend up to `top_n` items similar to `query_title`.
    ///
    /// `matrix` must have been built from `corpus`.
    pub fn recommend(
        &self,
        matrix: &FeatureMatrix,
        corpus: &[Item],
        query_title: &str,
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        let query = normalize_query(query_title)?;
        if top_n == 0 {
            return Ok(Vec::new());
        }

        let q = match lookup(corpus, &query) {
            Lookup::Found(row) => row,
            Lookup::NotFound => {
                debug!("Book '{}' not found in corpus", query);
                return Ok(fallback(corpus, top_n, None, NOTE_QUERY_NOT_FOUND));
            }
        };

        let mut candidates = self.score_all(matrix, q);
        if candidates.is_empty() {
            debug!("No similar books found for '{}'", query);
            return Ok(fallback(corpus, top_n, Some(q), NOTE_NO_SIMILAR_ITEMS));
        }

        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        candidates.truncate(top_n);

        Ok(candidates
            .into_iter()
            .map(|(idx, score)| Recommendation::from_item(&corpus[idx], score, None))
            .collect())
    }

    /// Score every row except `q`. Batches that fail are logged and skipped.
    pub fn score_all(&self, matrix: &FeatureMatrix, q: usize) -> Vec<(usize, f32)> {
        let rows = matrix.rows();
        let mut query = Vec::new();
        matrix.densify_into(q, &mut query);
        let query_norm = matrix.norm(q);

        let mut candidates = Vec::with_capacity(rows.saturating_sub(1));
        let mut scores = Vec::with_capacity(self.batch_size.min(rows));

        for (batch, start) in (0..rows).step_by(self.batch_size).enumerate() {
            let range = start..(start + self.batch_size).min(rows);
            match score_batch(matrix, &query, query_norm, range.clone(), &mut scores) {
                Ok(()) => candidates.extend(
                    range
                        .zip(scores.iter().copied())
                        .filter(|&(idx, _)| idx != q),
                ),
                Err(e) => {
                    warn!(batch, error = %e, "Skipping batch {}..{}", range.start, range.end);
                }
            }
        }

        candidates
    }
}

/// Fill `scores` with the cosine similarity of each row in `range` against the
/// dense query row. `scores` is cleared first and reused across batches.
fn score_batch(
    matrix: &FeatureMatrix,
    query: &[f32],
    query_norm: f32,
    range: Range<usize>,
    scores: &mut Vec<f32>,
) -> Result<()> {
    let batch = range.start;
    scores.clear();

    for row in range {
        let view = matrix.row(row);
        let mut dot = 0.0f32;
        for (&col, &w) in view.indices.iter().zip(view.values) {
            let q = query.get(col as usize).ok_or_else(|| Error::BatchCompute {
                batch,
                reason: format!("row {} references column {} outside vocabulary", row, col),
            })?;
            dot += q * w;
        }

        let score = cosine(dot, query_norm, matrix.norm(row));
        if !score.is_finite() {
            return Err(Error::BatchCompute {
                batch,
                reason: format!("non-finite similarity for row {}", row),
            });
        }
        scores.push(score);
    }

    Ok(())
}

/// Head of the corpus with score 0.0, minus `exclude`
fn fallback(corpus: &[Item], top_n: usize, exclude: Option<usize>, note: &str) -> Vec<Recommendation> {
    corpus
        .iter()
        .take(top_n)
        .enumerate()
        .filter(|&(idx, _)| Some(idx) != exclude)
        .map(|(_, item)| Recommendation::from_item(item, 0.0, Some(note)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books() -> Vec<Item> {
        vec![
            Item::new("the hobbit", "tolkien"),
            Item::new("fellowship of the ring", "tolkien"),
            Item::new("pride and prejudice", "austen"),
        ]
    }

    fn titles(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_hobbit_scenario() {
        let corpus = books();
        let matrix = FeatureMatrix::build(&corpus, 3000).unwrap();
        let recs = Retriever::default().recommend(&matrix, &corpus, "hobbit", 2).unwrap();

        assert_eq!(titles(&recs), vec!["fellowship of the ring", "pride and prejudice"]);
        assert!(recs[0].similarity_score > recs[1].similarity_score);
        assert_eq!(recs[1].similarity_score, 0.0);
        assert!(recs.iter().all(|r| r.note.is_none()));
    }

    #[test]
    fn test_query_is_normalized() {
        let corpus = books();
        let matrix = FeatureMatrix::build(&corpus, 3000).unwrap();
        let recs = Retriever::default().recommend(&matrix, &corpus, "The HOBBIT!", 1).unwrap();
        assert_eq!(titles(&recs), vec!["fellowship of the ring"]);
        assert!(recs[0].note.is_none());
    }

    #[test]
    fn test_padded_query_keeps_whitespace() {
        // surrounding whitespace survives normalization, so no title contains it
        let corpus = books();
        let matrix = FeatureMatrix::build(&corpus, 3000).unwrap();
        let recs = Retriever::default().recommend(&matrix, &corpus, "  The HOBBIT!", 1).unwrap();
        assert_eq!(titles(&recs), vec!["the hobbit"]);
        assert_eq!(recs[0].note.as_deref(), Some(NOTE_QUERY_NOT_FOUND));
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let corpus = books();
        let matrix = FeatureMatrix::build(&corpus, 3000).unwrap();
        for q in ["", "   ", "?!"] {
            let err = Retriever::default().recommend(&matrix, &corpus, q, 5).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
    }

    #[test]
    fn test_zero_top_n_is_empty() {
        let corpus = books();
        let matrix = FeatureMatrix::build(&corpus, 3000).unwrap();
        assert!(Retriever::default().recommend(&matrix, &corpus, "hobbit", 0).unwrap().is_empty());
    }

    #[test]
    fn test_fallback_when_not_found() {
        let corpus = books();
        let matrix = FeatureMatrix::build(&corpus, 3000).unwrap();
        let recs = Retriever::default()
            .recommend(&matrix, &corpus, "zzzznomatch1234", 10)
            .unwrap();

        assert_eq!(recs.len(), 3);
        assert_eq!(titles(&recs), vec!["the hobbit", "fellowship of the ring", "pride and prejudice"]);
        assert!(recs.iter().all(|r| r.similarity_score == 0.0));
        assert!(recs.iter().all(|r| r.note.as_deref() == Some(NOTE_QUERY_NOT_FOUND)));
    }

    #[test]
    fn test_fallback_single_item_corpus() {
        let corpus = vec![Item::new("dune", "herbert")];
        let matrix = FeatureMatrix::build(&corpus, 3000).unwrap();
        let recs = Retriever::default().recommend(&matrix, &corpus, "dune", 5).unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_self_is_never_recommended() {
        let corpus = books();
        let matrix = FeatureMatrix::build(&corpus, 3000).unwrap();
        for (query, own) in [("hobbit", "the hobbit"), ("ring", "fellowship of the ring"), ("pride", "pride and prejudice")] {
            let recs = Retriever::default().recommend(&matrix, &corpus, query, 10).unwrap();
            assert_eq!(recs.len(), 2);
            assert!(!titles(&recs).contains(&own));
        }
    }

    #[test]
    fn test_ties_break_by_row_index() {
        let corpus = vec![
            Item::new("alpha", "smith"),
            Item::new("beta", "jones"),
            Item::new("gamma", "brown"),
            Item::new("delta", "green"),
        ];
        let matrix = FeatureMatrix::build(&corpus, 3000).unwrap();
        let recs = Retriever::default().recommend(&matrix, &corpus, "gamma", 3).unwrap();
        assert_eq!(titles(&recs), vec!["alpha", "beta", "delta"]);
    }

    #[test]
    fn test_batch_size_does_not_change_result() {
        let corpus: Vec<Item> = (0..120)
            .map(|i| Item::new(format!("saga volume {} part {}", i % 7, i % 5), format!("writer {}", i % 11)))
            .collect();
        let matrix = FeatureMatrix::build(&corpus, 3000).unwrap();

        let expected = Retriever::new(corpus.len()).recommend(&matrix, &corpus, "saga volume 3", 15).unwrap();
        for batch_size in [1, 7, 50, 1000] {
            let recs = Retriever::new(batch_size).recommend(&matrix, &corpus, "saga volume 3", 15).unwrap();
            assert_eq!(recs, expected, "batch size {}", batch_size);
        }
    }

    #[test]
    fn test_failing_batch_is_skipped() {
        // rows: 0 = query, 1 = NaN weight, 2 and 3 are fine
        let vocabulary = vec!["a".to_string(), "b".to_string()];
        let matrix = FeatureMatrix::from_parts(
            vocabulary,
            vec![0, 1, 2, 3, 4],
            vec![0, 0, 0, 1],
            vec![1.0, f32::NAN, 1.0, 1.0],
        );
        let corpus = vec![
            Item::new("query", "x"),
            Item::new("broken", "x"),
            Item::new("match", "x"),
            Item::new("other", "x"),
        ];

        let recs = Retriever::new(2).recommend(&matrix, &corpus, "query", 10).unwrap();
        // first batch (rows 0..2) is dropped with the broken row
        assert_eq!(titles(&recs), vec!["match", "other"]);
        assert!((recs[0].similarity_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_all_batches_failing_falls_back() {
        let matrix = FeatureMatrix::from_parts(
            vec!["a".to_string()],
            vec![0, 1, 2],
            vec![0, 5],
            vec![1.0, 1.0],
        );
        let corpus = vec![Item::new("query", "x"), Item::new("other", "y")];

        let recs = Retriever::new(1).recommend(&matrix, &corpus, "query", 5).unwrap();
        assert_eq!(titles(&recs), vec!["other"]);
        assert_eq!(recs[0].note.as_deref(), Some(NOTE_NO_SIMILAR_ITEMS));
    }

    #[test]
    fn test_cosine_zero_vectors() {
        assert_eq!(cosine(0.0, 0.0, 1.0), 0.0);
        assert_eq!(cosine(0.0, 0.0, 0.0), 0.0);
        assert!((cosine(0.5, 1.0, 0.5) - 1.0).abs() < 1e-6);
    }
}
