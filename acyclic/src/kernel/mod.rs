//! Kernel algorithms over integer vertex indices
//!
//! This module provides the pure algorithms the graph store relies on:
//!
//! - Topological sort (iterative depth-first search, post-order reversal)
//! - Acyclicity verification (iterative depth-first search producing a witness cycle)
//! - Path search, for checking whether a single new edge closes a cycle
//!
//! # Design Principles
//!
//! Following Parnas's information hiding principles:
//! - The algorithms are written once, against the [`Adjacency`] abstraction
//! - The adjacency representation (nested vectors vs. packed `u32` arrays) is hidden
//!   behind the [`Kernel`] implementations
//!
//! None of them recurses. Each keeps their traversal state on an explicit
//! stack so that a long dependency chain cannot overflow the call stack.
//!
//! Input is assumed well-formed: every index is in range and there are no
//! self-loops. The graph store validates edges at its boundary.

mod acyclicity;
mod csr;
mod reachability;
mod topological;

pub use acyclicity::verify_acyclicity;
pub use csr::{Csr, CsrKernel};
pub use reachability::find_path;
pub use topological::topological_sort;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only view of a directed graph as per-vertex neighbor lists.
///
/// `neighbor(v, slot)` must be valid for every `slot < degree(v)` and must
/// return an index below `vertex_count()`.
pub trait Adjacency {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Number of neighbors of `vertex`.
    fn degree(&self, vertex: usize) -> usize;

    /// The `slot`-th neighbor of `vertex`, in insertion order.
    fn neighbor(&self, vertex: usize, slot: usize) -> usize;
}

impl Adjacency for [Vec<usize>] {
    fn vertex_count(&self) -> usize {
        self.len()
    }

    fn degree(&self, vertex: usize) -> usize {
        self[vertex].len()
    }

    fn neighbor(&self, vertex: usize, slot: usize) -> usize {
        self[vertex][slot]
    }
}

impl Adjacency for Vec<Vec<usize>> {
    fn vertex_count(&self) -> usize {
        self.as_slice().vertex_count()
    }

    fn degree(&self, vertex: usize) -> usize {
        self.as_slice().degree(vertex)
    }

    fn neighbor(&self, vertex: usize, slot: usize) -> usize {
        self.as_slice().neighbor(vertex, slot)
    }
}

/// Which implementation of the kernel algorithms ran a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelKind {
    /// Runs directly over the store's nested adjacency vectors.
    Interpreted,
    /// Packs the adjacency into `u32` arrays before running.
    Compiled,
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelKind::Interpreted => write!(f, "interpreted"),
            KernelKind::Compiled => write!(f, "compiled"),
        }
    }
}

/// An implementation of the two kernel algorithms.
///
/// Kernels are stateless once constructed and are shared between the caller
/// and worker threads, hence the `Send + Sync` bound.
pub trait Kernel: Send + Sync + fmt::Debug {
    /// Identifies the implementation in call reports and logs.
    fn kind(&self) -> KernelKind;

    /// Largest vertex or edge count this kernel can represent.
    fn capacity(&self) -> usize {
        usize::MAX
    }

    /// Returns every vertex index, each before all indices it has an edge to.
    ///
    /// The order is unspecified (but still a permutation) for cyclic input.
    fn topological_sort(&self, out_edges: &[Vec<usize>]) -> Vec<usize>;

    /// Returns the indices of a cycle in traversal order, or an empty vector
    /// when the graph is acyclic.
    fn verify_acyclicity(&self, out_edges: &[Vec<usize>], in_edges: &[Vec<usize>]) -> Vec<usize>;
}

/// The kernel that runs directly over nested adjacency vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpretedKernel;

impl Kernel for InterpretedKernel {
    fn kind(&self) -> KernelKind {
        KernelKind::Interpreted
    }

    fn topological_sort(&self, out_edges: &[Vec<usize>]) -> Vec<usize> {
        topological_sort(out_edges)
    }

    fn verify_acyclicity(&self, out_edges: &[Vec<usize>], in_edges: &[Vec<usize>]) -> Vec<usize> {
        verify_acyclicity(out_edges, in_edges)
    }
}
