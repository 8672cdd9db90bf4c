//! Parse HTTP response header lines into a ResponseHead.

/// Headers of the final response in a (possibly redirected) exchange.
///
/// libcurl hands over the header block of every hop when following
/// redirects; `push_line` starts over at each status line so only the last
/// response is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    /// Status code from the `HTTP/x y` line.
    pub status: Option<u32>,
    /// Raw `Content-Length` value.
    pub content_length: Option<String>,
    /// Raw `Accept-Ranges` value.
    pub accept_ranges: Option<String>,
    /// Raw `Content-Range` value.
    pub content_range: Option<String>,
}

impl ResponseHead {
    pub fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if line.starts_with("HTTP/") {
            *self = ResponseHead {
                status: line
                    .split_whitespace()
                    .nth(1)
                    .and_then(|code| code.parse().ok()),
                ..Default::default()
            };
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim().to_string();
            if name.eq_ignore_ascii_case("content-length") {
                self.content_length = Some(value);
            } else if name.eq_ignore_ascii_case("accept-ranges") {
                self.accept_ranges = Some(value);
            } else if name.eq_ignore_ascii_case("content-range") {
                self.content_range = Some(value);
            }
        }
    }

    /// Feed a raw header chunk as delivered by libcurl.
    pub fn push_bytes(&mut self, data: &[u8]) {
        if let Ok(s) = std::str::from_utf8(data) {
            self.push_line(s);
        }
    }

    /// `Content-Length` as a number, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length.as_deref()?.parse().ok()
    }

    /// True if the server sent `Accept-Ranges: bytes`.
    pub fn accepts_byte_ranges(&self) -> bool {
        self.accept_ranges
            .as_deref()
            .map(|v| v.eq_ignore_ascii_case("bytes"))
            .unwrap_or(false)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }
}
