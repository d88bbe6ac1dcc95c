//! Access decision query handler.

mod check_access;

pub use check_access::{AccessDecision, AccessReason, CheckAccessHandler, CheckAccessQuery};
