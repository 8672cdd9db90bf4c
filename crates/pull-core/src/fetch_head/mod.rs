//! HTTP HEAD / capability probing.
//!
//! Uses the curl crate (libcurl) to fetch response headers and confirm
//! `Content-Length` and `Accept-Ranges: bytes` before any data moves.

mod parse;

pub use parse::ResponseHead;

use curl::easy::{Easy2, Handler};

use crate::control::CancelToken;
use crate::downloader::TransferOptions;
use crate::error::PullError;
use crate::job::RequestHeaders;

/// What the probe learned about the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Total size in bytes; always > 0.
    pub total_size: u64,
    /// Always true for a descriptor returned by `probe`.
    pub supports_ranges: bool,
}

/// Collects header lines; HEAD responses have no body to write.
/// Aborts from the progress callback once `cancel` is set.
struct HeadCollector {
    head: ResponseHead,
    cancel: CancelToken,
}

impl Handler for HeadCollector {
    fn header(&mut self, data: &[u8]) -> bool {
        self.head.push_bytes(data);
        true
    }

    fn progress(&mut self, _dltotal: f64, _dlnow: f64, _ultotal: f64, _ulnow: f64) -> bool {
        !self.cancel.is_cancelled()
    }
}

/// Performs a HEAD request and validates that the resource can be fetched in chunks.
///
/// Follows redirects. Blocks the current thread; call from `spawn_blocking`
/// when used from async code. Setting `cancel` aborts a probe that is still
/// connecting or waiting for the response with `Cancelled`.
pub fn probe(
    url: &str,
    headers: &RequestHeaders,
    opts: &TransferOptions,
    cancel: &CancelToken,
) -> Result<ResourceDescriptor, PullError> {
    if cancel.is_cancelled() {
        return Err(PullError::Cancelled);
    }
    let transport = |source| PullError::Transport { chunk: None, source };

    let mut easy = Easy2::new(HeadCollector {
        head: ResponseHead::default(),
        cancel: cancel.clone(),
    });
    easy.url(url).map_err(transport)?;
    easy.nobody(true).map_err(transport)?;
    opts.configure(&mut easy).map_err(transport)?;
    easy.http_headers(headers.to_curl_list().map_err(transport)?)
        .map_err(transport)?;
    // The progress callback also runs while idle, which is where a hung probe sees the cancel.
    easy.progress(true).map_err(transport)?;

    if let Err(source) = easy.perform() {
        if cancel.is_cancelled() {
            return Err(PullError::Cancelled);
        }
        return Err(transport(source));
    }

    let head = &easy.get_ref().head;
    tracing::debug!(url, ?head, "probe response");
    descriptor_from_head(url, head)
}

/// Turns probe headers into a descriptor. Length is checked before range support.
pub(crate) fn descriptor_from_head(
    url: &str,
    head: &ResponseHead,
) -> Result<ResourceDescriptor, PullError> {
    if !head.is_success() {
        return Err(PullError::HttpStatus {
            chunk: None,
            code: head.status.unwrap_or(0),
        });
    }

    let total_size = match head.content_length() {
        Some(n) if n > 0 => n,
        _ => {
            return Err(PullError::InvalidLength {
                url: url.to_string(),
                value: head.content_length.clone(),
            })
        }
    };

    if !head.accepts_byte_ranges() {
        return Err(PullError::UnsupportedResource {
            url: url.to_string(),
        });
    }

    Ok(ResourceDescriptor {
        total_size,
        supports_ranges: true,
    })
}
