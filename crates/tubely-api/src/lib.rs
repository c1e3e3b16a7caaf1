//! Tubely API Library
//!
//! This crate provides the HTTP handlers, authentication, error rendering and application
//! setup for the video service.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
pub mod telemetry;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
