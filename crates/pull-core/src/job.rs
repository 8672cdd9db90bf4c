//! The immutable description of one download, as handed over by the CLI.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Default identifying client header value.
pub const DEFAULT_USER_AGENT: &str = concat!("pull/", env!("CARGO_PKG_VERSION"));

/// Ordered request headers sent with the probe and every chunk request.
///
/// Names compare case-insensitively; setting a name that is already present
/// replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(String, String)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base header set: just the client identifier.
    pub fn with_user_agent(user_agent: &str) -> Self {
        let mut h = Self::new();
        h.set("User-Agent", user_agent);
        h
    }

    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.trim();
        let value = value.trim();
        match self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a `"Name: Value"` argument. Splits at the first colon so values may contain colons.
    pub fn parse_header_arg(arg: &str) -> Result<(String, String), String> {
        let (name, value) = arg
            .split_once(':')
            .ok_or_else(|| format!("header '{}' is not of the form 'Name: Value'", arg))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("header '{}' has an empty name", arg));
        }
        Ok((name.to_string(), value.trim().to_string()))
    }

    /// Build a libcurl header list (`Name: value` lines).
    pub fn to_curl_list(&self) -> Result<curl::easy::List, curl::Error> {
        let mut list = curl::easy::List::new();
        for (k, v) in self.iter() {
            list.append(&format!("{}: {}", k, v))?;
        }
        Ok(list)
    }
}

/// One download: a single URL fetched in `concurrency` chunks into `output_path`.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: String,
    pub output_path: PathBuf,
    pub concurrency: NonZeroUsize,
    pub headers: RequestHeaders,
    /// Suppresses progress rendering; errors are still reported.
    pub silent: bool,
}

impl DownloadJob {
    pub fn new(url: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output_path: output_path.into(),
            concurrency: default_concurrency(),
            headers: RequestHeaders::with_user_agent(DEFAULT_USER_AGENT),
            silent: false,
        }
    }

    pub fn concurrency(mut self, n: NonZeroUsize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = headers;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Temp file for chunk `index`: `<output>.p<index>`.
    pub fn chunk_temp_path(&self, index: usize) -> PathBuf {
        chunk_temp_path(&self.output_path, index)
    }
}

/// Path of the temp file holding chunk `index` of `output` (e.g. `file.iso` → `file.iso.p3`).
pub fn chunk_temp_path(output: &Path, index: usize) -> PathBuf {
    let mut o = output.as_os_str().to_owned();
    o.push(format!(".p{}", index));
    PathBuf::from(o)
}

/// Twice the available parallelism, or 2 if it cannot be determined.
pub fn default_concurrency() -> NonZeroUsize {
    let cpus = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    NonZeroUsize::new(cpus * 2).unwrap_or(NonZeroUsize::MIN)
}
