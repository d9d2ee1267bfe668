use crate::index::FeatureMatrix;
use crate::retriever::{lookup, Lookup, Recommendation, Retriever};
use crate::{sampler, EngineConfig, Item, Result};
use std::collections::BTreeSet;
use tracing::info;

/// An immutable working corpus together with the index built over it
///
/// Row `i` of `matrix` is `corpus[i]`. Sessions are never mutated; a rebuild
/// produces a new one.
#[derive(Debug)]
pub struct Session {
    corpus: Vec<Item>,
    matrix: FeatureMatrix,
    titles: Vec<String>,
    forced: Vec<String>,
}

impl Session {
    /// Sample `catalog`, keeping matches for `forced`, and index the result
    pub fn build(catalog: &[Item], config: &EngineConfig, forced: &[String]) -> Result<Self> {
        let corpus = sampler::sample(catalog, config.sample_size, forced, config.seed);
        Self::from_corpus(corpus, config.max_features, config.title_limit, forced.to_vec())
    }

    /// Index an already selected corpus
    pub fn from_corpus(
        corpus: Vec<Item>,
        max_features: usize,
        title_limit: usize,
        forced: Vec<String>,
    ) -> Result<Self> {
        let matrix = FeatureMatrix::build(&corpus, max_features)?;

        let titles: Vec<String> = corpus
            .iter()
            .map(|item| item.title().to_string())
            .filter(|t| !t.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(title_limit)
            .collect();

        info!(
            "Session ready: {} books, {} features, {} titles",
            corpus.len(),
            matrix.vocabulary_size(),
            titles.len()
        );

        Ok(Self { corpus, matrix, titles, forced })
    }

    pub fn corpus(&self) -> &[Item] {
        &self.corpus
    }

    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    /// Sorted, de-duplicated titles, truncated to the configured limit
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Queries that were forced into this session's corpus
    pub fn forced(&self) -> &[String] {
        &self.forced
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Resolve an already normalized query
    pub fn lookup(&self, normalized_query: &str) -> Lookup {
        lookup(&self.corpus, normalized_query)
    }

    pub fn recommend(&self, query_title: &str, top_n: usize, batch_size: usize) -> Result<Vec<Recommendation>> {
        Retriever::new(batch_size).recommend(&self.matrix, &self.corpus, query_title, top_n)
    }
}
