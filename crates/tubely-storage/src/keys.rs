//! Object key derivation for stored videos.
//!
//! Key format: `{aspect_prefix}/{random}{ext}`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use tubely_core::models::AspectRatio;

/// Number of random bytes behind every key
pub const KEY_BYTES: usize = 32;

/// Extension used when the media type has no usable subtype
const FALLBACK_EXTENSION: &str = ".bin";

/// Derives unguessable object keys for uploaded videos.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyDeriver;

impl KeyDeriver {
    pub fn new() -> Self {
        KeyDeriver
    }

    /// 32 bytes from the thread-local CSPRNG, URL-safe base64 without padding (43 chars).
    pub fn generate_key(&self) -> String {
        let mut bytes = [0u8; KEY_BYTES];
        rand::rng().fill(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Full object key for a video of the given geometry and media type.
    pub fn object_key(&self, aspect: AspectRatio, media_type: &str) -> String {
        format!(
            "{}/{}{}",
            aspect.key_prefix(),
            self.generate_key(),
            extension_for_media_type(media_type)
        )
    }
}

/// File extension for a `type/subtype` media type: `video/mp4` becomes `.mp4`.
pub fn extension_for_media_type(media_type: &str) -> String {
    let mut parts = media_type.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(kind), Some(subtype), None)
            if !kind.trim().is_empty()
                && !subtype.trim().is_empty()
                && subtype
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '+')) =>
        {
            format!(".{}", subtype.trim().to_lowercase())
        }
        _ => FALLBACK_EXTENSION.to_string(),
    }
}
