//! Adapters - implementations of the ports defined in `crate::ports`.
//!
//! - `http`: axum routes, extractors, and DTOs
//! - `memory`: in-process implementations for tests and the dedup guard
//! - `postgres`: sqlx-backed persistent storage

pub mod http;
pub mod memory;
pub mod postgres;
