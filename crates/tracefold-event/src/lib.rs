//! Tracefold Event
//!
//! This crate contains the serializable node execution records that make up
//! the step history of one workflow run. Records arrive from the workflow
//! service newest-first and are consumed by `tracefold-trace`, which folds
//! them into a nested trace tree.
//!
//! Records can be loaded from:
//! - The service's `node-executions` endpoint (via `tracefold-source`)
//! - JSON files holding either a bare array or a `{ "data": [...] }` envelope

mod enums;
mod event;
mod metadata;

pub use enums::{ExecutionStatus, NodeType};
pub use event::ExecutionEvent;
pub use metadata::{ExecutionMetadata, LoopPosition, LoopSlot};
