//! HTTP layer: Axum router, handlers, request validation, and responses.
//!
//! Exposes student CRUD under `/students`, mark statistics at `/stats`, and a
//! health check at `/`. Every error is a 404 with an `{"error": ...}` body.

mod error;
mod handlers;
mod state;
mod validation;


pub use handlers::router;
pub use state::AppState;
