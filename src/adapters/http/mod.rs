//! HTTP adapter - REST API for the purchase engine.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::api_router;
