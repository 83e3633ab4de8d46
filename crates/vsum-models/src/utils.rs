//! Utility functions for URL parsing and article paths.
//!
//! Shared by the API (request validation) and the pipeline (article paths).

use thiserror::Error;

/// Errors that can occur during YouTube ID extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YoutubeIdError {
    /// Input is neither a YouTube URL nor a bare video ID
    #[error("URL is not a valid YouTube URL")]
    InvalidYoutubeUrl,
    /// Video ID has invalid format
    #[error("Video ID has invalid format")]
    InvalidVideoId,
    /// Video ID not found in URL
    #[error("Video ID not found in URL")]
    VideoIdNotFound,
}

/// Result type for YouTube ID extraction.
pub type YoutubeIdResult<T> = Result<T, YoutubeIdError>;

/// Length of every YouTube video ID.
pub const YOUTUBE_ID_LEN: usize = 11;

/// Extract a YouTube video ID from a URL or a bare ID.
///
/// Supports:
/// - a bare 11-character ID
/// - https://www.youtube.com/watch?v=VIDEO_ID (also `&v=`)
/// - https://youtu.be/VIDEO_ID
/// - https://youtube.com/embed/VIDEO_ID
/// - https://youtube.com/v/VIDEO_ID, /shorts/VIDEO_ID, /live/VIDEO_ID
/// - percent-encoded variants such as `youtube.com%2Fembed%2FVIDEO_ID`
///
/// Returns the 11-character YouTube video ID or an error.
pub fn extract_youtube_id(input: &str) -> YoutubeIdResult<String> {
    let decoded = urlencoding::decode(input.trim())
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| input.trim().to_string());
    let url = decoded.trim();

    if url.is_empty() {
        return Err(YoutubeIdError::VideoIdNotFound);
    }

    if is_valid_youtube_id(url) {
        return Ok(url.to_string());
    }

    if !is_youtube_domain(url) {
        return Err(YoutubeIdError::InvalidYoutubeUrl);
    }

    // Try different extraction strategies in order of preference
    let strategies: [fn(&str) -> Option<String>; 4] = [
        extract_from_watch_url,
        extract_from_short_url,
        |url| extract_after(url, "/embed/"),
        extract_from_path_prefixes,
    ];

    for strategy in strategies {
        if let Some(id) = strategy(url) {
            return validate_youtube_id(id);
        }
    }

    Err(YoutubeIdError::VideoIdNotFound)
}

/// Convert a title into a URL path segment.
///
/// Lower-cases, turns spaces into `-` and drops every character outside
/// `[a-z0-9-]`. The result is stable: `slugify(slugify(t)) == slugify(t)`.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            'a'..='z' | '0'..='9' | '-' => Some(c),
            _ => None,
        })
        .collect()
}

/// Check if string is a well-formed video ID.
pub fn is_valid_youtube_id(s: &str) -> bool {
    s.len() == YOUTUBE_ID_LEN && is_valid_youtube_id_chars(s)
}

/// Check if URL is from a YouTube domain
fn is_youtube_domain(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    url.contains("youtube.com") || url.contains("youtu.be")
}

/// Extract ID from youtube.com/watch?v=VIDEO_ID
fn extract_from_watch_url(url: &str) -> Option<String> {
    ["?v=", "&v="]
        .iter()
        .find_map(|marker| url.find(marker).map(|pos| pos + marker.len()))
        .and_then(|start| extract_id_from_segment(&url[start..]))
}

/// Extract ID from youtu.be/VIDEO_ID
fn extract_from_short_url(url: &str) -> Option<String> {
    extract_after(url, "youtu.be/")
}

/// Extract ID from /v/, /shorts/ and /live/ paths
fn extract_from_path_prefixes(url: &str) -> Option<String> {
    ["/v/", "/shorts/", "/live/"]
        .iter()
        .find_map(|marker| extract_after(url, marker))
}

fn extract_after(url: &str, marker: &str) -> Option<String> {
    let start = url.find(marker)? + marker.len();
    if start < url.len() {
        extract_id_from_segment(&url[start..])
    } else {
        None
    }
}

/// Extract the first valid ID segment from a string
fn extract_id_from_segment(segment: &str) -> Option<String> {
    let delimiters = ['&', '#', '?', '/'];
    let end = segment
        .find(|c| delimiters.contains(&c))
        .unwrap_or(segment.len());
    Some(segment[..end].trim().to_string())
}

/// Check if string contains only valid YouTube ID characters
fn is_valid_youtube_id_chars(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validate YouTube video ID format and return it
fn validate_youtube_id(id: String) -> YoutubeIdResult<String> {
    if is_valid_youtube_id(&id) {
        Ok(id)
    } else {
        Err(YoutubeIdError::InvalidVideoId)
    }
}
