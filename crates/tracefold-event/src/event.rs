use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::{ExecutionStatus, NodeType};
use crate::metadata::{ExecutionMetadata, LoopPosition};

/// One observed state of one workflow node.
///
/// `node_id` is the node's definition id: it is shared by every retry of the
/// node and by every execution of a loop-body node across iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub index: Option<u64>,
  /// Display title of the node.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  pub node_id: String,
  pub node_type: NodeType,
  pub status: ExecutionStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub inputs: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub process_data: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub outputs: Option<Value>,
  /// Seconds.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub elapsed_time: Option<f64>,
  /// Unix timestamps in seconds.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub finished_at: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub execution_metadata: Option<ExecutionMetadata>,
  /// Fields not modelled above, kept so renderers see the full record.
  #[serde(flatten)]
  pub extra: serde_json::Map<String, Value>,
}

impl ExecutionEvent {
  /// Create a minimal record.
  pub fn new(
    node_id: impl Into<String>,
    node_type: impl Into<NodeType>,
    status: ExecutionStatus,
  ) -> Self {
    Self {
      id: None,
      index: None,
      title: None,
      node_id: node_id.into(),
      node_type: node_type.into(),
      status,
      error: None,
      inputs: None,
      process_data: None,
      outputs: None,
      elapsed_time: None,
      created_at: None,
      finished_at: None,
      execution_metadata: None,
      extra: serde_json::Map::new(),
    }
  }

  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.title = Some(title.into());
    self
  }

  pub fn with_error(mut self, error: impl Into<String>) -> Self {
    self.error = Some(error.into());
    self
  }

  pub fn with_outputs(mut self, outputs: Value) -> Self {
    self.outputs = Some(outputs);
    self
  }

  /// Place this record in a sequential loop body.
  pub fn in_iteration(mut self, iteration_id: impl Into<String>, iteration_index: usize) -> Self {
    let metadata = self.execution_metadata.get_or_insert_with(Default::default);
    metadata.iteration_id = Some(iteration_id.into());
    metadata.iteration_index = Some(iteration_index);
    metadata.parallel_mode_run_id = None;
    self
  }

  /// Place this record in a parallel loop run.
  pub fn in_parallel_run(
    mut self,
    iteration_id: impl Into<String>,
    run_id: impl Into<String>,
  ) -> Self {
    let metadata = self.execution_metadata.get_or_insert_with(Default::default);
    metadata.iteration_id = Some(iteration_id.into());
    metadata.parallel_mode_run_id = Some(run_id.into());
    self
  }

  pub fn is_iteration(&self) -> bool {
    self.node_type.is_iteration()
  }

  pub fn is_retry(&self) -> bool {
    self.status == ExecutionStatus::Retry
  }

  pub fn is_failed(&self) -> bool {
    self.status == ExecutionStatus::Failed
  }

  /// Loop position of this record, `None` for top-level records.
  pub fn loop_position(&self) -> Option<LoopPosition<'_>> {
    self
      .execution_metadata
      .as_ref()
      .and_then(ExecutionMetadata::loop_position)
  }

  /// The `outputs.json` payload, if the node produced one.
  pub fn output_json(&self) -> Option<&Value> {
    self
      .outputs
      .as_ref()
      .and_then(|outputs| outputs.get("json"))
      .filter(|json| !json.is_null())
  }
}

impl AsRef<ExecutionEvent> for ExecutionEvent {
  fn as_ref(&self) -> &ExecutionEvent {
    self
  }
}
