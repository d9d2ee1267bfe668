//! # booksim
//!
//! Content-based book recommendations over a small REST API.
//!
//! booksim indexes the title, author and publisher of every book in a working
//! corpus with TF-IDF, and answers "books like this one" queries by cosine
//! similarity, computed in fixed-size batches to bound memory.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! cargo install booksim
//! booksim --catalog books.json --http-port 5000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use booksim::prelude::*;
//!
//! let catalog = load_catalog("books.json").unwrap();
//! let engine = Engine::new(catalog, EngineConfig::default()).unwrap();
//!
//! for rec in engine.recommend("Lord of the Rings", 5).unwrap() {
//!     println!("{} by {} ({:.4})", rec.title, rec.author, rec.similarity_score);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - [`booksim-core`](https://docs.rs/booksim-core) - Normalizer, sampler, feature index, retriever, engine
//! - [`booksim-api`](https://docs.rs/booksim-api) - REST API
//!
//! ## Features
//!
//! - **Seeded sampling**: bounded working corpus that always keeps query matches
//! - **TF-IDF index**: fixed vocabulary, stop words removed, `f32` weights
//! - **Batched cosine retrieval**: deterministic ranking, self-exclusion, fallbacks
//! - **Rebuild policies**: static, on-miss, or per-request query-forced sessions

// Re-export core types
pub use booksim_core::{
    Engine, EngineConfig, EngineStats, RebuildPolicy,
    Session, FeatureMatrix, Retriever, Lookup,
    Item, Recommendation, CatalogRecord,
    load_catalog, normalize,
    Error, Result,
};

// Re-export API
pub use booksim_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Engine, EngineConfig, RebuildPolicy,
        Item, Recommendation,
        load_catalog,
        Error, Result,
        RestApi,
    };
}
