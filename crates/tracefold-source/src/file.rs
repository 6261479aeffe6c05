use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracefold_event::ExecutionEvent;
use tracing::debug;

use crate::EventSource;
use crate::decode::parse_events;
use crate::error::SourceError;

/// Reads records from a JSON file holding a bare array or a `{ "data": [...] }` envelope.
#[derive(Debug, Clone)]
pub struct FileEventSource {
  path: PathBuf,
}

impl FileEventSource {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

#[async_trait]
impl EventSource for FileEventSource {
  async fn fetch(&self) -> Result<Vec<ExecutionEvent>, SourceError> {
    let text = fs::read_to_string(&self.path)
      .await
      .map_err(|source| SourceError::Io {
        path: self.path.display().to_string(),
        source,
      })?;

    let events = parse_events(&text)?;
    debug!(path = %self.path.display(), records = events.len(), "loaded node executions");
    Ok(events)
  }
}
