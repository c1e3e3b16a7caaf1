use tubely_core::AppError;

/// Default allow-list of media type tokens for video uploads
pub const DEFAULT_VIDEO_TYPES: &[&str] = &["mp4", "mkv"];

/// Characters RFC 2045 excludes from tokens besides space and controls
const TSPECIALS: &[char] = &[
    '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=',
];

fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii() && !c.is_ascii_control() && c != ' ' && !TSPECIALS.contains(&c))
}

fn is_valid_parameter(param: &str) -> bool {
    let Some((name, value)) = param.split_once('=') else {
        return false;
    };
    let value = value.trim();
    let quoted = value.len() >= 2 && value.starts_with('"') && value.ends_with('"');
    is_token(name.trim()) && (quoted || is_token(value))
}

/// Split on `;` outside quoted strings. `None` when a quoted string is left open.
fn split_sections(header: &str) -> Option<Vec<&str>> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in header.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                sections.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_quotes {
        return None;
    }
    sections.push(&header[start..]);
    Some(sections)
}

/// Parse a part's `Content-Type` into a bare, lower-cased `type/subtype`.
///
/// Parameters are validated and dropped. Trailing semicolons are ignored.
pub fn parse_media_type(header: Option<&str>) -> Result<String, AppError> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing Content-Type for video".to_string()))?;

    let invalid = || AppError::BadRequest(format!("Invalid Content-Type: {}", header));

    let sections = split_sections(header).ok_or_else(invalid)?;
    let mut sections = sections.into_iter();
    let essence = sections.next().unwrap_or_default().trim();

    let (kind, subtype) = essence.split_once('/').ok_or_else(invalid)?;
    if !is_token(kind) || !is_token(subtype) {
        return Err(invalid());
    }

    for param in sections.map(str::trim).filter(|p| !p.is_empty()) {
        if !is_valid_parameter(param) {
            return Err(invalid());
        }
    }

    Ok(format!("{}/{}", kind, subtype).to_lowercase())
}

/// Decides which declared media types the video pipeline accepts.
#[derive(Debug, Clone)]
pub struct MediaTypeClassifier {
    allowed: Vec<String>,
}

impl MediaTypeClassifier {
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed: allowed.into_iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    pub fn parse_media_type(&self, header: Option<&str>) -> Result<String, AppError> {
        parse_media_type(header)
    }

    /// A media type is supported when it contains any allow-listed token.
    pub fn is_supported(&self, media_type: &str) -> bool {
        let media_type = media_type.to_lowercase();
        self.allowed
            .iter()
            .any(|token| media_type.contains(token.as_str()))
    }
}

impl Default for MediaTypeClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_VIDEO_TYPES.iter().map(|t| t.to_string()).collect())
    }
}
