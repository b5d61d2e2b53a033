//! # Device Watch Core
//!
//! Shared logic for Device Watch with no network or database I/O:
//! approval models, openFDA search expression building, per-year chunk
//! planning, result normalization, the cache store trait, and reader-side
//! view filtering.
//!
//! This crate contains no tokio, sqlx, or reqwest dependencies.

pub mod chunk;
pub mod models;
pub mod normalize;
pub mod query;
pub mod store;
pub mod view;
