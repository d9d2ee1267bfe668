//! # booksim Core
//!
//! Core library for the booksim recommendation service.
//!
//! This crate provides the content-based retrieval engine:
//!
//! - [`normalize`] - Text canonicalization shared by indexing and queries
//! - [`sampler`] - Bounded, seeded corpus sampling with forced query matches
//! - [`FeatureMatrix`] - Sparse TF-IDF index over title, author and publisher
//! - [`Retriever`] - Batched cosine similarity ranking with fallbacks
//! - [`Session`] / [`Engine`] - Immutable snapshots and the rebuild policy
//!
//! ## Example
//!
//! ```rust
//! use booksim_core::{Engine, EngineConfig, Item};
//!
//! let catalog = vec![
//!     Item::new("The Hobbit", "J.R.R. Tolkien"),
//!     Item::new("The Fellowship of the Ring", "J.R.R. Tolkien"),
//!     Item::new("Pride and Prejudice", "Jane Austen"),
//! ];
//! let engine = Engine::new(catalog, EngineConfig::default()).unwrap();
//!
//! let recs = engine.recommend("hobbit", 2).unwrap();
//! assert_eq!(recs[0].title, "The Fellowship of the Ring");
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod item;
pub mod normalize;
pub mod retriever;
pub mod sampler;
pub mod session;
mod stopwords;

pub use catalog::{load_catalog, CatalogRecord};
pub use config::{EngineConfig, RebuildPolicy};
pub use engine::{Engine, EngineStats};
pub use error::{Error, Result};
pub use index::FeatureMatrix;
pub use item::Item;
pub use normalize::normalize;
pub use retriever::{Lookup, Recommendation, Retriever};
pub use session::Session;
