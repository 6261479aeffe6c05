use serde::Serialize;
use serde_json::Value;
use tracefold_event::ExecutionStatus;

use crate::lookup::find_by_title;
use crate::node::TraceNode;

/// A reconstructed run, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceReport {
  /// Status of the run as a whole.
  pub status: ExecutionStatus,
  pub tracing: Vec<TraceNode>,
  /// Citation payload taken from the node named by the citation title.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sources: Option<Value>,
}

impl TraceReport {
  /// Build a report for a finished run.
  ///
  /// Returns `None` for an empty trace. Reports are only built for runs that
  /// have already been loaded in full, so the run status is `succeeded`.
  pub fn build(tracing: Vec<TraceNode>, citation_title: Option<&str>) -> Option<Self> {
    if tracing.is_empty() {
      return None;
    }

    let sources = citation_title
      .and_then(|title| find_by_title(&tracing, title))
      .cloned();

    Some(Self {
      status: ExecutionStatus::Succeeded,
      tracing,
      sources,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::reconstruct;
  use serde_json::json;
  use tracefold_event::ExecutionEvent;

  #[test]
  fn test_empty_trace_has_no_report() {
    assert_eq!(TraceReport::build(Vec::new(), Some("Search")), None);
  }

  #[test]
  fn test_report_carries_sources() {
    let events = vec![
      ExecutionEvent::new("search", "tool", ExecutionStatus::Succeeded)
        .with_title("Search")
        .with_outputs(json!({ "json": [{ "url": "https://example.com" }] })),
    ];
    let report = TraceReport::build(reconstruct(&events), Some("Search")).unwrap();

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["status"], json!("succeeded"));
    assert_eq!(value["sources"], json!([{ "url": "https://example.com" }]));
    assert_eq!(value["tracing"][0]["node_id"], json!("search"));
  }

  #[test]
  fn test_report_without_citation_title() {
    let events = vec![ExecutionEvent::new("start", "start", ExecutionStatus::Succeeded)];
    let report = TraceReport::build(reconstruct(&events), None).unwrap();
    assert_eq!(report.sources, None);
    assert!(serde_json::to_value(&report).unwrap().get("sources").is_none());
  }
}
