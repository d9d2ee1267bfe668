//! # booksim API
//!
//! REST endpoints over a shared [`booksim_core::Engine`].

pub mod rest;

pub use rest::{routes, ApiError, RestApi};
