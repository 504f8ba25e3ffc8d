//! YouTube URL utilities
//!
//! Extraction of the 11-character platform video identifier from the URL
//! forms users actually paste (share links, short links, embed links), plus
//! the deterministic thumbnail URL template. No network access here.

use lazy_static::lazy_static;
use regex::Regex;

use crate::constants::{THUMBNAIL_BASE_URL, THUMBNAIL_VARIANT, VIDEO_ID_LENGTH};

lazy_static! {
    /// Recognizes `youtu.be/`, `v/`, `u/<char>/`, `embed/`, `watch?v=` and
    /// `&v=` URL forms; the identifier runs until `#`, `&` or `?`.
    static ref VIDEO_ID_RE: Regex =
        Regex::new(r"^.*(?:youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*)")
            .expect("VIDEO_ID_RE should compile - this is a bug");
}

/// Extract the platform video identifier from a URL.
///
/// Returns `None` unless the captured segment is exactly 11 characters.
///
/// # Examples
///
/// ```
/// use repflow_domain::utils::youtube::extract_video_id;
///
/// let id = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
/// assert_eq!(id.as_deref(), Some("dQw4w9WgXcQ"));
/// assert_eq!(extract_video_id("not a url"), None);
/// ```
#[must_use]
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| id.len() == VIDEO_ID_LENGTH)
        .map(std::string::ToString::to_string)
}

/// Thumbnail URL for a video identifier. Purely a template; the URL is not
/// validated against the network.
#[must_use]
pub fn thumbnail_url(video_id: &str) -> String {
    format!("{THUMBNAIL_BASE_URL}/{video_id}/{THUMBNAIL_VARIANT}")
}
