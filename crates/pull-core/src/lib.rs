//! pull-core: fetch one HTTP resource as N concurrent byte ranges and
//! reassemble them into a single file.

pub mod config;
pub mod logging;

pub mod control;
pub mod downloader;
pub mod error;
pub mod fetch_head;
pub mod job;
pub mod progress;
pub mod render;
pub mod scheduler;
pub mod segmenter;
pub mod storage;
pub mod url_model;

pub use error::PullError;
pub use job::{DownloadJob, RequestHeaders};
pub use scheduler::{JobReport, JobRunner};
