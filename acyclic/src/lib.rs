//! Acyclic: directed acyclic graphs with accelerated, offloadable sorting
//!
//! `acyclic` stores caller-supplied values as the vertices of a directed graph,
//! validates edges as they are added, and answers two questions on demand:
//! is the graph acyclic (and if not, which cycle proves it), and in what order
//! can its vertices be visited so that every edge points forward.
//!
//! # Features
//!
//! - **Validated mutation**: out-of-range edges, self-loops and duplicate edges are rejected
//! - **Witness cycles**: verification returns the vertices of a cycle, not just a flag
//! - **Deterministic order**: the same graph always sorts the same way
//! - **Caching**: results are memoized until the next mutation
//! - **Compiled kernel**: large graphs run over packed `u32` adjacency
//! - **Worker offload**: large graphs can run off the caller's task, with fallback
//!
//! # Quick Start
//!
//! ```
//! use acyclic::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GraphError> {
//!     let mut dag = Dag::new();
//!     let ids = dag.add_vertices(["checkout", "compile", "lint", "test", "ship"])?;
//!
//!     dag.add_edges([
//!         (ids[0], ids[1]),
//!         (ids[0], ids[2]),
//!         (ids[1], ids[3]),
//!         (ids[2], ids[3]),
//!         (ids[3], ids[4]),
//!     ])?;
//!
//!     let order = dag.topological_sort().await?;
//!     assert_eq!(order.first(), Some(&"checkout"));
//!     assert_eq!(order.last(), Some(&"ship"));
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! Following Parnas's information hiding principles, each module hides specific design
//! decisions that are likely to change:
//!
//! - [`kernel`]: The two algorithms (hides adjacency representation)
//! - [`graph`]: Vertex and edge store (hides index bookkeeping and caching)
//! - [`executor`]: Execution strategy (hides kernel loading and worker dispatch)

pub mod executor;
pub mod graph;
pub mod kernel;

pub use executor::{
    CallOptions, CallReport, ExecutionConfig, ExecutionError, Mode, Result as ExecutionResult,
    Strategy,
};

pub use graph::{
    Dag, DagBuilder, DagConfig, DuplicateVertexPolicy, EdgeFault, Edges, GraphError, GraphResult,
    VertexRemoval,
};

pub use kernel::{Kernel, KernelKind};

/// Prelude module for convenient glob imports
///
/// # Example
///
/// ```
/// use acyclic::prelude::*;
/// ```
pub mod prelude {
    pub use crate::executor::{CallOptions, ExecutionConfig, ExecutionError, Mode};

    pub use crate::graph::{
        Dag, DagConfig, DuplicateVertexPolicy, Edges, GraphError, GraphResult, VertexRemoval,
    };

    pub use std::sync::Arc;
}
