//! Graph store configuration and construction inputs.

use crate::executor::ExecutionConfig;
use serde::{Deserialize, Serialize};

/// What `add_vertex` does with a value equal to an existing vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DuplicateVertexPolicy {
    /// Insert it anyway; no equality scan.
    #[default]
    Allow,
    /// Return the existing vertex's index without inserting.
    Reuse,
    /// Fail with `DuplicateVertex`.
    Reject,
}

/// Configuration for a [`Dag`](super::Dag).
///
/// # Example
///
/// ```
/// use acyclic::executor::ExecutionConfig;
/// use acyclic::graph::{DagConfig, DuplicateVertexPolicy};
///
/// let config = DagConfig::default()
///     .with_duplicate_vertices(DuplicateVertexPolicy::Reject)
///     .with_verify_on_add_edge(true)
///     .with_execution(ExecutionConfig::IN_PROCESS);
/// assert!(config.verify_on_add_edge);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagConfig {
    /// Default: `Allow`
    pub duplicate_vertices: DuplicateVertexPolicy,

    /// Reject (and roll back) any edge that closes a cycle.
    ///
    /// Each insertion then costs a full acyclicity check.
    ///
    /// Default: false
    pub verify_on_add_edge: bool,

    /// Skip invalid edges during construction instead of failing.
    ///
    /// Default: false
    pub lenient_edges: bool,

    /// Kernel and context selection for sorts and verifications.
    pub execution: ExecutionConfig,
}

impl DagConfig {
    pub fn with_duplicate_vertices(mut self, policy: DuplicateVertexPolicy) -> Self {
        self.duplicate_vertices = policy;
        self
    }

    pub fn with_verify_on_add_edge(mut self, verify: bool) -> Self {
        self.verify_on_add_edge = verify;
        self
    }

    pub fn with_lenient_edges(mut self, lenient: bool) -> Self {
        self.lenient_edges = lenient;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }
}

/// Initial edges for a new graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edges {
    /// `(from, to)` index pairs.
    Pairs(Vec<(usize, usize)>),
    /// One list of destinations per vertex, in vertex order.
    Adjacency(Vec<Vec<usize>>),
}

impl Default for Edges {
    fn default() -> Self {
        Edges::Pairs(Vec::new())
    }
}

/// Which vertices equal to a value `remove_vertex_value` removes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VertexRemoval {
    /// The lowest-indexed match.
    First,
    /// The highest-indexed match.
    Last,
    /// Every match.
    All,
    /// The listed indices that hold a match; other indices are ignored.
    Among(Vec<usize>),
}
