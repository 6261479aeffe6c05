//! Tracefold Source
//!
//! This crate provides the [`EventSource`] trait and its implementations for
//! loading the node execution records of one workflow run:
//! - [`HttpEventSource`] fetches them from the workflow service
//! - [`FileEventSource`] reads them from a JSON file
//!
//! Sources return records exactly as stored, newest-first. Failures are
//! returned to the caller; nothing here retries or swallows them.

mod decode;
mod error;
mod file;
mod http;

pub use decode::parse_events;
pub use error::SourceError;
pub use file::FileEventSource;
pub use http::{HttpEventSource, HttpSourceConfig, RunRef};

use async_trait::async_trait;
use tracefold_event::ExecutionEvent;

/// A provider of node execution records for one workflow run.
#[async_trait]
pub trait EventSource: Send + Sync {
  /// Load all records, newest-first.
  async fn fetch(&self) -> Result<Vec<ExecutionEvent>, SourceError>;
}
