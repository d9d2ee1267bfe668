use crate::retriever::{normalize_query, Lookup, Recommendation};
use crate::{EngineConfig, Item, RebuildPolicy, Result, Session};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// Summary of the currently served session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub catalog_size: usize,
    pub corpus_size: usize,
    pub vocabulary_size: usize,
    pub cached_sessions: usize,
}

/// Bounded FIFO of sessions built with a forced query, keyed by the
/// normalized query
///
/// `generation` advances on every clear. A session built against an older
/// generation belongs to a replaced catalog and is refused.
struct RebuildCache {
    capacity: usize,
    generation: u64,
    entries: VecDeque<(String, Arc<Session>)>,
}

impl RebuildCache {
    fn new(capacity: usize) -> Self {
        Self { capacity, generation: 0, entries: VecDeque::new() }
    }

    fn get(&self, key: &str) -> Option<Arc<Session>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, s)| s.clone())
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false when `generation` is stale and nothing was stored
    fn insert(&mut self, generation: u64, key: String, session: Arc<Session>) -> bool {
        if generation != self.generation {
            return false;
        }
        if self.capacity == 0 {
            return true;
        }
        self.entries.retain(|(k, _)| *k != key);
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, session));
        true
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Recommendation engine
///
/// Holds the full catalog and the session built from it at startup. Readers
/// take an `Arc<Session>` snapshot per call; reloads swap the pointer and
/// never touch a session that is being read.
pub struct Engine {
    config: EngineConfig,
    catalog: RwLock<Arc<Vec<Item>>>,
    base: RwLock<Arc<Session>>,
    rebuilt: Mutex<RebuildCache>,
}

impl Engine {
    pub fn new(catalog: Vec<Item>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        info!("Initializing recommendation engine over {} books", catalog.len());

        let base = Session::build(&catalog, &config, &[])?;
        let rebuilt = RebuildCache::new(config.rebuild_cache_size);

        Ok(Self {
            config,
            catalog: RwLock::new(Arc::new(catalog)),
            base: RwLock::new(Arc::new(base)),
            rebuilt: Mutex::new(rebuilt),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of the base session
    pub fn session(&self) -> Arc<Session> {
        self.base.read().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.session().titles().to_vec()
    }

    pub fn stats(&self) -> EngineStats {
        let session = self.session();
        let catalog_size = self.catalog.read().len();
        let cached_sessions = self.rebuilt.lock().len();
        EngineStats {
            catalog_size,
            corpus_size: session.len(),
            vocabulary_size: session.matrix().vocabulary_size(),
            cached_sessions,
        }
    }

    /// Rebuild the base session from the current catalog and swap it in
    pub fn reload(&self) -> Result<EngineStats> {
        let catalog = self.catalog.read().clone();
        self.install(catalog)
    }

    /// Replace the catalog, rebuild, and swap both in together
    pub fn reload_with(&self, catalog: Vec<Item>) -> Result<EngineStats> {
        self.install(Arc::new(catalog))
    }

    fn install(&self, catalog: Arc<Vec<Item>>) -> Result<EngineStats> {
        let session = Arc::new(Session::build(&catalog, &self.config, &[])?);
        {
            let mut base = self.base.write();
            let mut current = self.catalog.write();
            *base = session;
            *current = catalog;
        }
        self.rebuilt.lock().clear();
        info!("Engine reloaded");
        Ok(self.stats())
    }

    /// Recommend up to `top_n` books similar to `query_title`
    pub fn recommend(&self, query_title: &str, top_n: usize) -> Result<Vec<Recommendation>> {
        let query = normalize_query(query_title)?;
        if top_n == 0 {
            return Ok(Vec::new());
        }

        let session = self.session_for(&query)?;
        session.recommend(query_title, top_n, self.config.batch_size)
    }

    /// Pick the session that should serve `query` under the rebuild policy
    fn session_for(&self, query: &str) -> Result<Arc<Session>> {
        let base = self.session();
        match self.config.rebuild_policy {
            RebuildPolicy::Static => Ok(base),
            RebuildPolicy::OnMiss => {
                if base.lookup(query) != Lookup::NotFound {
                    return Ok(base);
                }
                Ok(self.forced_session(query)?.unwrap_or(base))
            }
            RebuildPolicy::PerRequest => Ok(self.forced_session(query)?.unwrap_or(base)),
        }
    }

    /// Session with `query` forced into the corpus, from cache or freshly
    /// built. `None` when the catalog has no matching title.
    fn forced_session(&self, query: &str) -> Result<Option<Arc<Session>>> {
        // generation is read before the catalog: install swaps the catalog first
        let generation = {
            let cache = self.rebuilt.lock();
            if let Some(session) = cache.get(query) {
                debug!("Reusing session rebuilt for {:?}", session.forced());
                return Ok(Some(session));
            }
            cache.generation()
        };

        let catalog = self.catalog.read().clone();
        if !catalog.iter().any(|item| item.title_contains(query)) {
            debug!("No catalog match for '{}', serving base session", query);
            return Ok(None);
        }

        info!("Rebuilding session with '{}' forced", query);
        let session = Arc::new(Session::build(&catalog, &self.config, &[query.to_string()])?);
        self.cache_rebuilt(generation, query, session.clone());
        Ok(Some(session))
    }

    /// Store a rebuilt session unless the catalog was replaced since
    /// `generation` was read
    fn cache_rebuilt(&self, generation: u64, query: &str, session: Arc<Session>) -> bool {
        let stored = self.rebuilt.lock().insert(generation, query.to_string(), session);
        if !stored {
            debug!("Catalog reloaded while rebuilding for '{}', result not cached", query);
        }
        stored
    }
}
