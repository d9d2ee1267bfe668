//! TF-IDF feature index
//!
//! Builds a fixed-vocabulary, row-normalized TF-IDF matrix over the combined
//! feature text of a working corpus. Rows are stored sparse (CSR) with `f32`
//! weights; row `i` is item `i` of the corpus it was built from.

use crate::stopwords::is_stop_word;
use crate::{Error, Item, Result};
use ahash::AHashMap;
use rayon::prelude::*;
use std::ops::Range;
use tracing::info;

/// Tokenize feature text: lowercase, split on non-word characters,
/// drop single characters and stop words.
#[inline]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| s.chars().count() > 1 && !is_stop_word(s))
        .map(str::to_string)
        .collect()
}

/// Borrowed view of one sparse row
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    pub indices: &'a [u32],
    pub values: &'a [f32],
}

impl RowView<'_> {
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }
}

/// Immutable sparse TF-IDF matrix
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    vocabulary: Vec<String>,
    idf: Vec<f32>,
    indptr: Vec<usize>,
    indices: Vec<u32>,
    values: Vec<f32>,
    norms: Vec<f32>,
}

impl FeatureMatrix {
    /// Build the matrix over `corpus`, keeping at most `max_features` terms.
    ///
    /// Terms are ranked by total occurrence count across the corpus, ties by
    /// lexical order. Weights are raw count times smoothed IDF
    /// `ln((1 + n) / (1 + df)) + 1`, then each row is L2-normalized.
    pub fn build(corpus: &[Item], max_features: usize) -> Result<Self> {
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let docs: Vec<AHashMap<String, u32>> = corpus
            .par_iter()
            .map(|item| {
                let mut counts = AHashMap::new();
                for token in tokenize(item.features()) {
                    *counts.entry(token).or_insert(0u32) += 1;
                }
                counts
            })
            .collect();

        // term -> (total count, document frequency)
        let mut stats: AHashMap<&str, (u64, u32)> = AHashMap::new();
        for doc in &docs {
            for (term, &count) in doc {
                let entry = stats.entry(term.as_str()).or_insert((0, 0));
                entry.0 += u64::from(count);
                entry.1 += 1;
            }
        }
        if stats.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let mut ranked: Vec<(&str, u64, u32)> =
            stats.into_iter().map(|(t, (total, df))| (t, total, df)).collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_features);
        ranked.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let n = corpus.len() as f64;
        let vocabulary: Vec<String> = ranked.iter().map(|(t, _, _)| (*t).to_string()).collect();
        let idf: Vec<f32> = ranked
            .iter()
            .map(|&(_, _, df)| (((1.0 + n) / (1.0 + f64::from(df))).ln() + 1.0) as f32)
            .collect();
        let columns: AHashMap<&str, u32> = vocabulary
            .iter()
            .enumerate()
            .map(|(col, t)| (t.as_str(), col as u32))
            .collect();

        let mut indptr = Vec::with_capacity(docs.len() + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();
        let mut norms = Vec::with_capacity(docs.len());
        indptr.push(0);

        for doc in &docs {
            let mut row: Vec<(u32, f32)> = doc
                .iter()
                .filter_map(|(term, &count)| {
                    columns
                        .get(term.as_str())
                        .map(|&col| (col, count as f32 * idf[col as usize]))
                })
                .collect();
            row.sort_unstable_by_key(|&(col, _)| col);

            let norm = row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            if norm > 0.0 {
                for (_, w) in &mut row {
                    *w /= norm;
                }
            }
            norms.push(row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt());

            for (col, w) in row {
                indices.push(col);
                values.push(w);
            }
            indptr.push(indices.len());
        }

        info!(
            "Feature index built: {} rows, {} features, {} non-zeros",
            docs.len(),
            vocabulary.len(),
            values.len()
        );

        Ok(Self { vocabulary, idf, indptr, indices, values, norms })
    }

    /// Assemble a matrix from raw CSR parts. Row norms are computed here.
    pub fn from_parts(
        vocabulary: Vec<String>,
        indptr: Vec<usize>,
        indices: Vec<u32>,
        values: Vec<f32>,
    ) -> Self {
        let norms = indptr
            .windows(2)
            .map(|w| values[w[0]..w[1]].iter().map(|v| v * v).sum::<f32>().sqrt())
            .collect();
        let idf = vec![1.0; vocabulary.len()];
        Self { vocabulary, idf, indptr, indices, values, norms }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.norms.len()
    }

    #[inline]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn row(&self, row: usize) -> RowView<'_> {
        let range: Range<usize> = self.indptr[row]..self.indptr[row + 1];
        RowView {
            indices: &self.indices[range.clone()],
            values: &self.values[range],
        }
    }

    #[inline]
    pub fn norm(&self, row: usize) -> f32 {
        self.norms[row]
    }

    /// Scatter `row` into a dense buffer of vocabulary size
    pub fn densify_into(&self, row: usize, dense: &mut Vec<f32>) {
        dense.clear();
        dense.resize(self.vocabulary.len(), 0.0);
        let view = self.row(row);
        for (&col, &w) in view.indices.iter().zip(view.values) {
            if let Some(slot) = dense.get_mut(col as usize) {
                *slot = w;
            }
        }
    }
}
