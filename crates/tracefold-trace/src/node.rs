use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use tracefold_event::ExecutionEvent;

/// Keys a trace node adds next to its record's fields.
///
/// Records carrying unmodelled fields under these names lose them during
/// reconstruction.
pub const RESERVED_KEYS: [&str; 2] = ["details", "retry_detail"];

/// A display-ready trace entry.
///
/// Serializes as the underlying record's fields plus `details` (iteration
/// nodes only) and `retry_detail` (only when the node was retried).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceNode {
  #[serde(flatten)]
  pub event: ExecutionEvent,
  /// Loop-body executions. `None` for every node that is not an iteration.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<IterationDetails>,
  /// Superseded attempts of this node, oldest first.
  #[serde(rename = "retry_detail", skip_serializing_if = "Vec::is_empty")]
  pub retry_attempts: Vec<ExecutionEvent>,
}

impl TraceNode {
  pub(crate) fn leaf(event: ExecutionEvent) -> Self {
    Self {
      event,
      details: None,
      retry_attempts: Vec::new(),
    }
  }

  pub(crate) fn iteration(event: ExecutionEvent) -> Self {
    Self {
      event,
      details: Some(IterationDetails::Empty),
      retry_attempts: Vec::new(),
    }
  }

  pub fn node_id(&self) -> &str {
    &self.event.node_id
  }

  pub fn is_iteration(&self) -> bool {
    self.details.is_some()
  }
}

impl AsRef<ExecutionEvent> for TraceNode {
  fn as_ref(&self) -> &ExecutionEvent {
    &self.event
  }
}

/// Children of an iteration node.
///
/// The shape is decided by the first loop-body record seen for the
/// iteration and does not change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum IterationDetails {
  /// No loop-body records yet.
  Empty,
  /// One bucket per observed iteration index. Serialized positionally, with
  /// `null` for indices that produced no records.
  Sequential(BTreeMap<usize, Vec<TraceNode>>),
  /// One group per parallel run, in the order runs were first seen.
  Parallel(Vec<RunGroup>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunGroup {
  pub run_id: String,
  pub nodes: Vec<TraceNode>,
}

impl IterationDetails {
  /// All child nodes, in bucket or run order.
  pub fn children(&self) -> Box<dyn Iterator<Item = &TraceNode> + '_> {
    match self {
      Self::Empty => Box::new(std::iter::empty()),
      Self::Sequential(buckets) => Box::new(buckets.values().flatten()),
      Self::Parallel(runs) => Box::new(runs.iter().flat_map(|run| run.nodes.iter())),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.children().next().is_none()
  }
}

impl Serialize for IterationDetails {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Empty => serializer.serialize_seq(Some(0))?.end(),
      Self::Sequential(buckets) => {
        let len = buckets.keys().next_back().map_or(0, |last| last + 1);
        let mut seq = serializer.serialize_seq(Some(len))?;
        let mut next = 0;
        for (&index, bucket) in buckets {
          for _ in next..index {
            seq.serialize_element(&())?;
          }
          seq.serialize_element(bucket)?;
          next = index + 1;
        }
        seq.end()
      }
      Self::Parallel(runs) => {
        let mut map = serializer.serialize_map(Some(runs.len()))?;
        for run in runs {
          map.serialize_entry(&run.run_id, &run.nodes)?;
        }
        map.end()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use tracefold_event::ExecutionStatus;

  fn leaf(node_id: &str) -> TraceNode {
    TraceNode::leaf(ExecutionEvent::new(node_id, "code", ExecutionStatus::Succeeded))
  }

  #[test]
  fn test_leaf_serializes_without_details() {
    let value = serde_json::to_value(leaf("a")).unwrap();
    assert_eq!(
      value,
      json!({ "node_id": "a", "node_type": "code", "status": "succeeded" })
    );
  }

  #[test]
  fn test_empty_iteration_serializes_empty_details() {
    let node = TraceNode::iteration(ExecutionEvent::new(
      "loop",
      "iteration",
      ExecutionStatus::Running,
    ));
    let value = serde_json::to_value(node).unwrap();
    assert_eq!(value["details"], json!([]));
    assert!(value.get("retry_detail").is_none());
  }

  #[test]
  fn test_parallel_details_serialize_as_map() {
    let details = IterationDetails::Parallel(vec![
      RunGroup {
        run_id: "r2".to_string(),
        nodes: vec![leaf("a")],
      },
      RunGroup {
        run_id: "r1".to_string(),
        nodes: vec![leaf("b")],
      },
    ]);

    let text = serde_json::to_string(&details).unwrap();
    // first-seen order is kept on the wire
    assert!(text.find("\"r2\"").unwrap() < text.find("\"r1\"").unwrap());

    let value = serde_json::to_value(&details).unwrap();
    assert_eq!(value["r1"][0]["node_id"], json!("b"));
    assert_eq!(value["r2"][0]["node_id"], json!("a"));
  }

  #[test]
  fn test_sequential_details_serialize_in_index_order() {
    let details = IterationDetails::Sequential(BTreeMap::from([
      (1, vec![leaf("second")]),
      (0, vec![leaf("first")]),
    ]));
    let value = serde_json::to_value(&details).unwrap();
    assert_eq!(value[0][0]["node_id"], json!("first"));
    assert_eq!(value[1][0]["node_id"], json!("second"));
  }

  #[test]
  fn test_sequential_details_keep_index_positions() {
    let details = IterationDetails::Sequential(BTreeMap::from([
      (2, vec![leaf("third")]),
      (4, vec![leaf("fifth")]),
    ]));
    let value = serde_json::to_value(&details).unwrap();
    let positions = value.as_array().unwrap();
    assert_eq!(positions.len(), 5);
    assert!(positions[0].is_null());
    assert!(positions[1].is_null());
    assert_eq!(positions[2][0]["node_id"], json!("third"));
    assert!(positions[3].is_null());
    assert_eq!(positions[4][0]["node_id"], json!("fifth"));
  }

  #[test]
  fn test_children_walks_every_bucket() {
    let details = IterationDetails::Sequential(BTreeMap::from([
      (4, vec![leaf("c")]),
      (0, vec![leaf("a"), leaf("b")]),
    ]));
    let ids: Vec<&str> = details.children().map(TraceNode::node_id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(!details.is_empty());
    assert!(IterationDetails::Empty.is_empty());
  }
}
