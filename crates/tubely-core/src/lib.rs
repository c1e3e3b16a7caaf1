//! Tubely Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! every Tubely component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, LogFormat, VideoServiceConfig};
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel};
