//! Command and query handlers.
//!
//! One handler per operation; handlers hold their ports behind `Arc<dyn ...>`
//! and carry no HTTP concerns.

pub mod access;
pub mod admin;
pub mod purchase;
pub mod webhook;
