//! TrailPass - Purchase lifecycle and payment-webhook reconciliation
//!
//! This crate implements the purchase engine for a platform selling
//! premium trip content: a purchase state machine with an append-only
//! audit trail, a signature-verified webhook gateway that reconciles
//! payment events, and the access checks that gate premium content.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
