use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracefold_event::ExecutionEvent;
use tracing::{info, instrument, warn};

use crate::EventSource;
use crate::decode::parse_events;
use crate::error::SourceError;

/// Identifies one workflow run within an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRef {
  pub app_id: String,
  pub workflow_run_id: String,
}

/// Connection settings for the workflow service.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
  /// Service API root, e.g. `https://workflows.example.com/console/api`.
  pub base_url: String,
  /// Sent as a bearer token when present.
  pub api_key: Option<String>,
  pub timeout: Duration,
}

/// Loads a run's records from `GET {base_url}/apps/{app_id}/workflow-runs/{run_id}/node-executions`.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
  client: Client,
  url: Url,
  api_key: Option<String>,
}

impl HttpEventSource {
  /// Create a source for one run.
  pub fn new(config: &HttpSourceConfig, run: &RunRef) -> Result<Self, SourceError> {
    let client = Client::builder().timeout(config.timeout).build()?;
    let url = node_executions_url(&config.base_url, run)?;

    Ok(Self {
      client,
      url,
      api_key: config.api_key.clone(),
    })
  }

  /// The endpoint this source reads from.
  pub fn url(&self) -> &Url {
    &self.url
  }
}

#[async_trait]
impl EventSource for HttpEventSource {
  #[instrument(name = "fetch_node_executions", skip(self), fields(url = %self.url))]
  async fn fetch(&self) -> Result<Vec<ExecutionEvent>, SourceError> {
    let mut request = self.client.get(self.url.clone());
    if let Some(api_key) = &self.api_key {
      request = request.bearer_auth(api_key);
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      warn!(status = status.as_u16(), "node execution fetch rejected");
      return Err(SourceError::Status {
        status: status.as_u16(),
        url: self.url.to_string(),
        body,
      });
    }

    let events = parse_events(&body)?;
    info!(records = events.len(), "fetched node executions");
    Ok(events)
  }
}

/// Build the endpoint URL, percent-encoding the ids as path segments.
fn node_executions_url(base_url: &str, run: &RunRef) -> Result<Url, SourceError> {
  let invalid = |message: String| SourceError::InvalidUrl {
    url: base_url.to_string(),
    message,
  };

  let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
  url
    .path_segments_mut()
    .map_err(|_| invalid("cannot be used as a base".to_string()))?
    .pop_if_empty()
    .extend([
      "apps",
      run.app_id.as_str(),
      "workflow-runs",
      run.workflow_run_id.as_str(),
      "node-executions",
    ]);
  Ok(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run() -> RunRef {
    RunRef {
      app_id: "app-1".to_string(),
      workflow_run_id: "run-9".to_string(),
    }
  }

  #[test]
  fn test_url_from_root() {
    let url = node_executions_url("https://api.example.com", &run()).unwrap();
    assert_eq!(
      url.as_str(),
      "https://api.example.com/apps/app-1/workflow-runs/run-9/node-executions"
    );
  }

  #[test]
  fn test_url_keeps_base_path() {
    let url = node_executions_url("https://api.example.com/console/api/", &run()).unwrap();
    assert_eq!(
      url.as_str(),
      "https://api.example.com/console/api/apps/app-1/workflow-runs/run-9/node-executions"
    );
  }

  #[test]
  fn test_url_encodes_ids() {
    let run = RunRef {
      app_id: "a/b".to_string(),
      workflow_run_id: "r 1".to_string(),
    };
    let url = node_executions_url("https://api.example.com", &run).unwrap();
    assert_eq!(
      url.path(),
      "/apps/a%2Fb/workflow-runs/r%201/node-executions"
    );
  }

  #[test]
  fn test_invalid_base_url() {
    let err = node_executions_url("not a url", &run()).unwrap_err();
    assert!(matches!(err, SourceError::InvalidUrl { .. }));

    let err = node_executions_url("mailto:ops@example.com", &run()).unwrap_err();
    assert!(matches!(err, SourceError::InvalidUrl { .. }));
  }
}
