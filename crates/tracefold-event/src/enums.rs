use std::fmt;

use serde::{Deserialize, Serialize};

/// Observed state of a node at the time the record was written.
///
/// Statuses this crate does not act on (for example `exception`) are carried
/// through as their raw tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
  Running,
  Succeeded,
  Failed,
  Stopped,
  /// A superseded attempt; the node was executed again afterwards.
  Retry,
  Other(String),
}

impl ExecutionStatus {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Running => "running",
      Self::Succeeded => "succeeded",
      Self::Failed => "failed",
      Self::Stopped => "stopped",
      Self::Retry => "retry",
      Self::Other(tag) => tag,
    }
  }
}

impl From<String> for ExecutionStatus {
  fn from(tag: String) -> Self {
    match tag.as_str() {
      "running" => Self::Running,
      "succeeded" => Self::Succeeded,
      "failed" => Self::Failed,
      "stopped" => Self::Stopped,
      "retry" => Self::Retry,
      _ => Self::Other(tag),
    }
  }
}

impl From<ExecutionStatus> for String {
  fn from(status: ExecutionStatus) -> Self {
    match status {
      ExecutionStatus::Other(tag) => tag,
      known => known.as_str().to_string(),
    }
  }
}

impl fmt::Display for ExecutionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Kind of workflow node that produced a record.
///
/// Only loop nodes change how a trace is assembled, so every other node kind
/// is carried through as its raw tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
  Iteration,
  Other(String),
}

impl NodeType {
  pub fn is_iteration(&self) -> bool {
    matches!(self, Self::Iteration)
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Iteration => "iteration",
      Self::Other(tag) => tag,
    }
  }
}

impl From<String> for NodeType {
  fn from(tag: String) -> Self {
    if tag == "iteration" {
      Self::Iteration
    } else {
      Self::Other(tag)
    }
  }
}

impl From<&str> for NodeType {
  fn from(tag: &str) -> Self {
    Self::from(tag.to_string())
  }
}

impl From<NodeType> for String {
  fn from(node_type: NodeType) -> Self {
    match node_type {
      NodeType::Iteration => "iteration".to_string(),
      NodeType::Other(tag) => tag,
    }
  }
}

impl fmt::Display for NodeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
