//! Default output name derived from the URL.

/// Decoded last non-empty path segment of `url`, usable as a file name.
///
/// `None` when the URL does not parse, has no path, or the segment decodes to
/// something that cannot name a file in the current directory (`.`, `..`, a
/// separator, a NUL, or only whitespace).
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let raw = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = urlencoding::decode(raw).ok()?;
    let name = decoded.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    if name.contains(['/', '\\', '\0']) {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(url: &str) -> Option<String> {
        filename_from_url_path(url)
    }

    #[test]
    fn last_segment_wins() {
        assert_eq!(name("https://example.com/a/b/file.iso").as_deref(), Some("file.iso"));
        assert_eq!(name("https://example.com/pub/dir/").as_deref(), Some("dir"));
        assert_eq!(name("https://example.com/f.zip?token=abc#x").as_deref(), Some("f.zip"));
    }

    #[test]
    fn segment_is_percent_decoded() {
        assert_eq!(
            name("https://example.com/files/release%20notes%202.txt").as_deref(),
            Some("release notes 2.txt")
        );
        assert_eq!(name("https://example.com/caf%C3%A9.tar").as_deref(), Some("café.tar"));
    }

    #[test]
    fn unusable_names_are_rejected() {
        assert_eq!(name("https://example.com/"), None);
        assert_eq!(name("https://example.com"), None);
        assert_eq!(name("not a url"), None);
        assert_eq!(name("https://example.com/a/..%2F..%2Fetc%2Fpasswd"), None);
        assert_eq!(name("https://example.com/%2E%2E"), None);
        assert_eq!(name("https://example.com/%20%20"), None);
        assert_eq!(name("https://example.com/bad%FF"), None);
    }
}
