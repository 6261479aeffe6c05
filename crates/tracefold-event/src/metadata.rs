use serde::{Deserialize, Serialize};

/// Execution context attached to a record.
///
/// Records produced inside a loop body name their owning iteration node.
/// Parallel loops additionally tag each record with the run it belongs to;
/// sequential loops tag it with the iteration index instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub iteration_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub iteration_index: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parallel_mode_run_id: Option<String>,
  /// Remaining metadata (token usage, pricing, ...) passed through untouched.
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Where a loop-body record belongs inside its iteration node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopPosition<'a> {
  pub iteration_id: &'a str,
  pub slot: LoopSlot<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopSlot<'a> {
  /// Grouped by parallel run id.
  Parallel(&'a str),
  /// Grouped by iteration index.
  Sequential(usize),
}

impl ExecutionMetadata {
  /// Resolve the loop position, if this record belongs to a loop body.
  ///
  /// Empty identifiers are treated as absent.
  pub fn loop_position(&self) -> Option<LoopPosition<'_>> {
    let iteration_id = non_empty(self.iteration_id.as_deref())?;
    let slot = match non_empty(self.parallel_mode_run_id.as_deref()) {
      Some(run_id) => LoopSlot::Parallel(run_id),
      None => LoopSlot::Sequential(self.iteration_index.unwrap_or(0)),
    };
    Some(LoopPosition { iteration_id, slot })
  }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
  value.filter(|v| !v.is_empty())
}
