//! Trace reconstruction.

use std::collections::HashMap;

use serde::Serialize;
use tracefold_event::{ExecutionEvent, ExecutionStatus, LoopSlot};
use tracing::{debug, instrument};

use crate::node::{IterationDetails, RESERVED_KEYS, RunGroup, TraceNode};

/// Counters describing one reconstruction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconstructStats {
  /// Records processed.
  pub events: usize,
  /// Loop-body records whose iteration node was never seen.
  pub orphaned_children: usize,
  /// Retry records with no canonical node to attach to.
  pub orphaned_retries: usize,
  /// Loop-body records whose grouping mode disagrees with their iteration's.
  pub mode_conflicts: usize,
  /// Non-retry records replaced by a later state of the same node.
  pub superseded: usize,
}

impl ReconstructStats {
  /// Total number of records that did not make it into the trace.
  pub fn dropped(&self) -> usize {
    self.orphaned_children + self.orphaned_retries + self.mode_conflicts
  }
}

/// Build the trace tree for one workflow run.
///
/// `events` must be ordered newest-first, as the workflow service returns
/// them. The returned top-level nodes are in chronological order of their
/// first occurrence.
pub fn reconstruct(events: &[ExecutionEvent]) -> Vec<TraceNode> {
  reconstruct_with_stats(events).0
}

/// Like [`reconstruct`], also reporting how many records were dropped.
#[instrument(name = "trace_reconstruct", skip_all, fields(events = events.len()))]
pub fn reconstruct_with_stats(events: &[ExecutionEvent]) -> (Vec<TraceNode>, ReconstructStats) {
  let mut builder = TraceBuilder::default();

  // Iteration nodes must be seen before their loop bodies, so walk oldest-first.
  for event in events.iter().rev() {
    builder.push(event.clone());
  }

  let (nodes, stats) = builder.finish();
  debug!(
    nodes = nodes.len(),
    dropped = stats.dropped(),
    "trace reconstructed"
  );
  (nodes, stats)
}

/// Owned form of [`LoopSlot`], detached from the record it was read from.
enum Slot {
  Parallel(String),
  Sequential(usize),
}

impl From<LoopSlot<'_>> for Slot {
  fn from(slot: LoopSlot<'_>) -> Self {
    match slot {
      LoopSlot::Parallel(run_id) => Self::Parallel(run_id.to_string()),
      LoopSlot::Sequential(index) => Self::Sequential(index),
    }
  }
}

/// Outcome of placing a loop-body record.
enum Placement {
  Placed,
  /// Placed over an earlier non-retry record with this status.
  Superseded(ExecutionStatus),
  OrphanRetry,
  ModeConflict,
}

#[derive(Default)]
struct TraceBuilder {
  nodes: Vec<TraceNode>,
  /// node_id -> position of its canonical top-level entry.
  canonical: HashMap<String, usize>,
  /// iteration position -> run id -> position in that iteration's run groups.
  run_index: HashMap<usize, HashMap<String, usize>>,
  /// iteration position -> error of its latest failing child.
  propagated_failures: HashMap<usize, Option<String>>,
  stats: ReconstructStats,
}

impl TraceBuilder {
  fn push(&mut self, mut event: ExecutionEvent) {
    self.stats.events += 1;
    strip_reserved_keys(&mut event);

    if event.is_iteration() {
      self.push_iteration(event);
      return;
    }

    let Some(position) = event.loop_position() else {
      self.push_top_level(event);
      return;
    };
    let iteration_id = position.iteration_id.to_string();
    let slot = Slot::from(position.slot);
    self.push_loop_body(&iteration_id, slot, event);
  }

  fn push_iteration(&mut self, event: ExecutionEvent) {
    // A retried iteration opens a fresh entry instead of folding.
    let existing = if event.is_retry() {
      None
    } else {
      self.canonical.get(&event.node_id).copied()
    };

    match existing {
      Some(position) => {
        let node = &mut self.nodes[position];
        if node.details.is_none() {
          node.details = Some(IterationDetails::Empty);
        }
        let previous = std::mem::replace(&mut node.event, event);
        self.note_superseded(&previous);
        self.reapply_failure(position);
      }
      None => self.append(TraceNode::iteration(event)),
    }
  }

  fn push_top_level(&mut self, event: ExecutionEvent) {
    match self.canonical.get(&event.node_id).copied() {
      Some(position) => {
        if !event.is_retry() && self.nodes[position].is_iteration() {
          let previous = std::mem::replace(&mut self.nodes[position].event, event);
          self.note_superseded(&previous);
          self.reapply_failure(position);
        } else if let Some(previous) = update_node(&mut self.nodes[position], event) {
          self.note_superseded(&previous);
        }
      }
      None if event.is_retry() => {
        debug!(node_id = %event.node_id, "dropping retry without a canonical node");
        self.stats.orphaned_retries += 1;
      }
      None => self.append(TraceNode::leaf(event)),
    }
  }

  fn push_loop_body(&mut self, iteration_id: &str, slot: Slot, event: ExecutionEvent) {
    let target = self
      .canonical
      .get(iteration_id)
      .copied()
      .filter(|&position| self.nodes[position].is_iteration());
    let Some(position) = target else {
      debug!(
        node_id = %event.node_id,
        iteration_id,
        "dropping loop-body record without an iteration node"
      );
      self.stats.orphaned_children += 1;
      return;
    };

    let failure = event.is_failed().then(|| event.error.clone());
    let node_id = event.node_id.clone();
    let iteration = &mut self.nodes[position];
    let Some(details) = iteration.details.as_mut() else {
      return;
    };

    let placement = match slot {
      Slot::Parallel(run_id) => {
        let runs = self.run_index.entry(position).or_default();
        place_parallel(details, runs, run_id, event)
      }
      Slot::Sequential(index) => place_sequential(details, index, event),
    };

    match placement {
      Placement::Placed => {}
      Placement::Superseded(previous) => {
        debug!(
          node_id = %node_id,
          iteration_id,
          previous = %previous,
          "superseding earlier record"
        );
        self.stats.superseded += 1;
      }
      Placement::OrphanRetry => {
        debug!(node_id = %node_id, iteration_id, "dropping retry without a canonical node");
        self.stats.orphaned_retries += 1;
      }
      Placement::ModeConflict => {
        debug!(
          node_id = %node_id,
          iteration_id,
          "dropping loop-body record with mismatched loop mode"
        );
        self.stats.mode_conflicts += 1;
      }
    }

    // The last failing child wins.
    if let Some(error) = failure {
      iteration.event.status = ExecutionStatus::Failed;
      iteration.event.error = error.clone();
      self.propagated_failures.insert(position, error);
    }
  }

  fn note_superseded(&mut self, previous: &ExecutionEvent) {
    if previous.is_retry() {
      return;
    }
    debug!(
      node_id = %previous.node_id,
      previous = %previous.status,
      "superseding earlier record"
    );
    self.stats.superseded += 1;
  }

  /// Keep a child failure on an iteration whose own record was just replaced.
  fn reapply_failure(&mut self, position: usize) {
    if let Some(error) = self.propagated_failures.get(&position) {
      let event = &mut self.nodes[position].event;
      event.status = ExecutionStatus::Failed;
      event.error = error.clone();
    }
  }

  fn append(&mut self, node: TraceNode) {
    let position = self.nodes.len();
    self
      .canonical
      .entry(node.event.node_id.clone())
      .or_insert(position);
    self.nodes.push(node);
  }

  fn finish(self) -> (Vec<TraceNode>, ReconstructStats) {
    (self.nodes, self.stats)
  }
}

fn place_parallel(
  details: &mut IterationDetails,
  run_index: &mut HashMap<String, usize>,
  run_id: String,
  event: ExecutionEvent,
) -> Placement {
  if matches!(details, IterationDetails::Empty) {
    *details = IterationDetails::Parallel(Vec::new());
  }
  let IterationDetails::Parallel(runs) = details else {
    return Placement::ModeConflict;
  };

  let group = match run_index.get(&run_id) {
    Some(&slot) => slot,
    None => {
      let slot = runs.len();
      run_index.insert(run_id.clone(), slot);
      runs.push(RunGroup {
        run_id,
        nodes: Vec::new(),
      });
      slot
    }
  };
  place_in_group(&mut runs[group].nodes, event)
}

fn place_sequential(details: &mut IterationDetails, index: usize, event: ExecutionEvent) -> Placement {
  if matches!(details, IterationDetails::Empty) {
    *details = IterationDetails::Sequential(Default::default());
  }
  let IterationDetails::Sequential(buckets) = details else {
    return Placement::ModeConflict;
  };
  place_in_group(buckets.entry(index).or_default(), event)
}

/// Place a record in a run group or bucket.
///
/// The first record of a group always opens it, retry or not.
fn place_in_group(nodes: &mut Vec<TraceNode>, event: ExecutionEvent) -> Placement {
  let existing = nodes.iter().position(|n| n.event.node_id == event.node_id);
  match existing {
    Some(slot) => match update_node(&mut nodes[slot], event) {
      Some(previous) => Placement::Superseded(previous.status),
      None => Placement::Placed,
    },
    None if event.is_retry() && !nodes.is_empty() => Placement::OrphanRetry,
    None => {
      nodes.push(TraceNode::leaf(event));
      Placement::Placed
    }
  }
}

/// Apply a later record of the same node to its canonical entry.
///
/// Retries are kept as history. Any other record is a newer state of the node
/// and replaces the entry's record; a canonical entry that was itself opened
/// by a retry keeps that retry as history.
///
/// Returns the replaced record when it was not a retry.
fn update_node(node: &mut TraceNode, event: ExecutionEvent) -> Option<ExecutionEvent> {
  if event.is_retry() {
    node.retry_attempts.push(event);
    return None;
  }

  let previous = std::mem::replace(&mut node.event, event);
  if previous.is_retry() {
    node.retry_attempts.push(previous);
    return None;
  }
  Some(previous)
}

/// Drop fields of a record that would collide with the keys a trace node adds.
fn strip_reserved_keys(event: &mut ExecutionEvent) {
  for key in RESERVED_KEYS {
    if event.extra.remove(key).is_some() {
      debug!(node_id = %event.node_id, key, "dropping reserved field from record");
    }
  }
}
