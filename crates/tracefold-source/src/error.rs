use thiserror::Error;

/// Errors that can occur while loading execution records.
#[derive(Debug, Error)]
pub enum SourceError {
  /// The HTTP request could not be sent or its body could not be read.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The configured base URL cannot be used to address a run.
  #[error("invalid base url '{url}': {message}")]
  InvalidUrl { url: String, message: String },

  /// The service answered with a non-success status.
  #[error("service returned {status} for {url}: {body}")]
  Status {
    status: u16,
    url: String,
    body: String,
  },

  /// A file could not be read.
  #[error("failed to read {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  /// The payload was not a list of execution records.
  #[error("invalid execution records: {0}")]
  Decode(#[from] serde_json::Error),
}
