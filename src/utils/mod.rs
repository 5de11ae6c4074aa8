use regex::Regex;

use crate::domain::MediaFile;

/// Extension used when a derived filename has none.
pub const DEFAULT_EXTENSION: &str = "m4a";

/// Display name that means the filename is not known.
const UNKNOWN_FILENAME: &str = "Unknown";

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect()
}

/// Pick the local filename for a media file that has a remote path.
pub fn derive_filename(file: &MediaFile, remote_path: &str) -> String {
    let mut filename = match file.filename.as_deref() {
        Some(name) if !name.is_empty() && name != UNKNOWN_FILENAME => name.to_string(),
        _ => match remote_path.rsplit('/').next() {
            Some(segment) if !segment.is_empty() => segment.to_string(),
            _ => format!("{}.{}", file.verse_reference, DEFAULT_EXTENSION),
        },
    };

    if !filename.contains('.') {
        filename.push('.');
        filename.push_str(DEFAULT_EXTENSION);
    }

    sanitize_filename(&filename)
}

/// Loose shape check done before sending credentials anywhere.
pub fn is_valid_email(email: &str) -> bool {
    match Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$") {
        Ok(re) => re.is_match(email.trim()),
        Err(_) => false,
    }
}
