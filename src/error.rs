use std::path::PathBuf;

use thiserror::Error;

/// Every failure a stage can report to its caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed comment feed: {0}")]
    MalformedFeed(&'static str),

    #[error("{0} not found in response")]
    NotFound(String),

    #[error("input file {} does not exist; run danmaku_fetch first", .0.display())]
    MissingInput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("timestamp {max}s spans more than {limit} buckets of {width}s")]
    TimelineTooLong { max: f64, width: u64, limit: usize },

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error("sentiment classifier failed: {0}")]
    Classifier(String),
}

pub type Result<T> = std::result::Result<T, Error>;
