//! Tubely Storage Library
//!
//! This crate provides the object storage abstraction used by the video pipeline and its
//! S3 implementation.
//!
//! # Object key format
//!
//! Video objects are stored as `{prefix}/{random}{ext}`, where `prefix` is derived from the
//! video's aspect ratio (`landscape`, `portrait` or `other`), `random` is 32 bytes from a
//! CSPRNG encoded as unpadded URL-safe base64 and `ext` comes from the media subtype. Key
//! generation lives in the `keys` module.

pub mod factory;
pub mod keys;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::KeyDeriver;
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
