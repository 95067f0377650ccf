//! Derivations from project metadata: channel slugs, channel topics and
//! download-link validation.

use thiserror::Error;
use url::Url;

/// Literal a leader passes as the new download link to remove it.
pub const DOWNLOAD_CLEAR_SENTINEL: &str = "REMOVE";

/// Separator substituted for each run of non-alphanumeric characters.
const SLUG_SEPARATOR: char = '-';

/// Returned when a download link is not an absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The specified download link is invalid: {0}")]
pub struct InvalidDownload(pub String);

/// Requested change to a project's download link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadChange {
    Set(String),
    Clear,
}

impl DownloadChange {
    /// Interpret raw user input, validating it unless it is the clear sentinel.
    pub fn parse(raw: &str) -> Result<Self, InvalidDownload> {
        if raw == DOWNLOAD_CLEAR_SENTINEL {
            return Ok(Self::Clear);
        }
        validate_download(raw).map(Self::Set)
    }
}

/// Accept `raw` only if it parses as an absolute URL with an http or https scheme.
pub fn validate_download(raw: &str) -> Result<String, InvalidDownload> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(raw.to_string())
        }
        _ => Err(InvalidDownload(raw.to_string())),
    }
}

/// Channel-safe name for a project.
///
/// Lower-cases the name and collapses every run of non-alphanumeric characters
/// into a single `-`. Leading and trailing separators are dropped since the
/// directory strips them from channel names.
pub fn channel_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(SLUG_SEPARATOR);
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Topic shown on a project's channel.
pub fn channel_topic(description: &str, download: Option<&str>) -> String {
    match download {
        Some(link) => format!("{}\n\n**Download link:** {}", description, link),
        None => description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_lowercases() {
        assert_eq!(channel_slug("Foo"), "foo");
        assert_eq!(channel_slug("FooBar2"), "foobar2");
    }

    #[test]
    fn test_slug_collapses_runs() {
        assert_eq!(channel_slug("Foo  Bar"), "foo-bar");
        assert_eq!(channel_slug("Foo -- Bar!!Baz"), "foo-bar-baz");
        assert_eq!(channel_slug("foo-old"), "foo-old");
    }

    #[test]
    fn test_slug_trims_edges() {
        assert_eq!(channel_slug("  (Foo) "), "foo");
        assert_eq!(channel_slug("!!!"), "");
    }

    #[test]
    fn test_topic_without_download() {
        assert_eq!(channel_topic("desc", None), "desc");
    }

    #[test]
    fn test_topic_with_download() {
        assert_eq!(
            channel_topic("desc", Some("https://example.com/dl")),
            "desc\n\n**Download link:** https://example.com/dl"
        );
    }

    #[test]
    fn test_validate_download_accepts_http_and_https() {
        assert!(validate_download("http://example.com").is_ok());
        assert!(validate_download("https://example.com/file.zip?x=1").is_ok());
    }

    #[test]
    fn test_validate_download_rejects_other_schemes_and_relative() {
        assert!(validate_download("ftp://x").is_err());
        assert!(validate_download("example.com").is_err());
        assert!(validate_download("/relative/path").is_err());
        assert!(validate_download("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_download_change_sentinel_clears() {
        assert_eq!(DownloadChange::parse("REMOVE"), Ok(DownloadChange::Clear));
        assert!(DownloadChange::parse("remove").is_err());
        assert_eq!(
            DownloadChange::parse("https://example.com"),
            Ok(DownloadChange::Set("https://example.com".to_string()))
        );
    }
}
