//! HTTP surface constants

/// Prefix of every authenticated route
pub const API_PREFIX: &str = "/api";
