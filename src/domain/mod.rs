//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `purchase` - Purchase lifecycle, audit log, and access control
//! - `webhook` - Payment provider event verification and typing

pub mod foundation;
pub mod purchase;
pub mod webhook;
