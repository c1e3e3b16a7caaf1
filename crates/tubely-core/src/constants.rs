//! Constants shared across crates.

use std::time::Duration;

/// Validity window of every signed retrieval URL handed to clients.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(60);

/// Separator between bucket and object key in a stored video reference.
pub const VIDEO_REFERENCE_SEPARATOR: char = ',';

/// Multipart field carrying the video body.
pub const VIDEO_FORM_FIELD: &str = "video";

/// Multipart field carrying the thumbnail body.
pub const THUMBNAIL_FORM_FIELD: &str = "thumbnail";

/// Prefix for staged upload files in the temp directory.
pub const STAGED_FILE_PREFIX: &str = "tubely-upload";

/// Multipart framing allowance on top of the largest accepted file. A declared request
/// length can exceed the file ceiling by this much before it is rejected up front.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;
