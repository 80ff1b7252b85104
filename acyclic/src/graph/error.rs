//! Error types for graph operations
//!
//! This module hides error representation details and provides
//! a unified error type for all graph operations.

use crate::executor::ExecutionError;
use std::fmt;
use thiserror::Error;

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Why an edge was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeFault {
    /// `from` is not a vertex index
    FromOutOfRange,
    /// `to` is not a vertex index
    ToOutOfRange,
    /// `from == to`
    SelfLoop,
}

impl fmt::Display for EdgeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeFault::FromOutOfRange => write!(f, "source vertex out of range"),
            EdgeFault::ToOutOfRange => write!(f, "target vertex out of range"),
            EdgeFault::SelfLoop => write!(f, "self-loop"),
        }
    }
}

/// Errors that can occur during graph operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    /// An edge endpoint is out of range, or the edge is a self-loop
    #[error("Invalid edge {from} -> {to}: {reason}")]
    InvalidEdge {
        from: usize,
        to: usize,
        reason: EdgeFault,
    },

    /// The edge already exists
    #[error("Duplicate edge {from} -> {to}")]
    DuplicateEdge { from: usize, to: usize },

    /// An equal vertex already exists and duplicates are rejected
    #[error("Duplicate vertex, equal to vertex {index}")]
    DuplicateVertex {
        /// Index of the existing equal vertex
        index: usize,
    },

    /// The graph contains a cycle
    #[error("Cycle detected: {path}")]
    CycleDetected {
        /// The cycle's vertex values joined by ` -> `
        path: String,
        /// The cycle's vertex indices in traversal order
        indices: Vec<usize>,
    },

    /// An adjacency list does not have one entry per vertex
    #[error("Adjacency list has {adjacency} entries for {vertices} vertices")]
    VertexEdgeCountMismatch { vertices: usize, adjacency: usize },

    /// The execution strategy failed the call
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl GraphError {
    /// Creates an invalid edge error
    pub fn invalid_edge(from: usize, to: usize, reason: EdgeFault) -> Self {
        Self::InvalidEdge { from, to, reason }
    }

    /// Creates a duplicate edge error
    pub fn duplicate_edge(from: usize, to: usize) -> Self {
        Self::DuplicateEdge { from, to }
    }

    /// Creates a duplicate vertex error
    pub fn duplicate_vertex(index: usize) -> Self {
        Self::DuplicateVertex { index }
    }

    /// Creates a cycle detected error, rendering each vertex with `Debug`
    pub fn cycle<T: fmt::Debug>(values: &[T], indices: Vec<usize>) -> Self {
        let path = values
            .iter()
            .map(|value| format!("{:?}", value))
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::CycleDetected { path, indices }
    }

    /// Creates a vertex/adjacency count mismatch error
    pub fn count_mismatch(vertices: usize, adjacency: usize) -> Self {
        Self::VertexEdgeCountMismatch {
            vertices,
            adjacency,
        }
    }

    /// Returns true if the operation could succeed on retry or on another
    /// execution path.
    ///
    /// Validation failures and cycles are properties of the graph and are
    /// never recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GraphError::Execution(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_renders_values() {
        let err = GraphError::cycle(&["build", "test"], vec![3, 1]);
        assert_eq!(err.to_string(), "Cycle detected: \"build\" -> \"test\"");
        assert!(matches!(
            err,
            GraphError::CycleDetected { ref indices, .. } if indices == &vec![3, 1]
        ));
    }

    #[test]
    fn test_invalid_edge_message() {
        let err = GraphError::invalid_edge(2, 2, EdgeFault::SelfLoop);
        assert_eq!(err.to_string(), "Invalid edge 2 -> 2: self-loop");
    }

    #[test]
    fn test_execution_errors_convert() {
        let err: GraphError = ExecutionError::WorkerFailed("gone".into()).into();
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "worker failed: gone");

        let err: GraphError = ExecutionError::UnsupportedConcurrency("off".into()).into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_validation_errors_not_recoverable() {
        assert!(!GraphError::duplicate_edge(0, 1).is_recoverable());
        assert!(!GraphError::duplicate_vertex(0).is_recoverable());
        assert!(!GraphError::count_mismatch(3, 2).is_recoverable());
    }
}
