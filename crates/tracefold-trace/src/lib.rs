//! Tracefold Trace
//!
//! Reconstructs a reviewable trace tree from the flat step history of one
//! workflow run.
//!
//! # Architecture
//!
//! ```text
//! [ExecutionEvent] (newest-first)
//!        │
//!        ▼
//! reconstruct() ── one chronological pass
//! │  - iteration nodes open a container for their loop body
//! │  - loop-body records land in a run group (parallel) or index bucket (sequential)
//! │  - retry records fold into the canonical node with the same node_id
//! │  - failing loop-body records mark the owning iteration as failed
//!        │
//!        ▼
//! [TraceNode] (chronological, top level)
//! ```
//!
//! Nothing here fails: records that reference a missing iteration or retry a
//! node that was never seen are dropped and counted in [`ReconstructStats`].
//!
//! # Usage
//!
//! ```ignore
//! use tracefold_trace::{find_by_title, reconstruct};
//!
//! let trace = reconstruct(&events);
//! let sources = find_by_title(&trace, "Web Search");
//! ```

mod lookup;
mod node;
mod reconstruct;
mod report;

pub use lookup::find_by_title;
pub use node::{IterationDetails, RESERVED_KEYS, RunGroup, TraceNode};
pub use reconstruct::{ReconstructStats, reconstruct, reconstruct_with_stats};
pub use report::TraceReport;
