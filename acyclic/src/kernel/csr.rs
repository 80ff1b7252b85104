//! Packed `u32` adjacency and the compiled kernel built on it
//!
//! [`Csr`] stores a graph in compressed sparse row form: one `offsets` array
//! of length `vertex_count + 1` and one flat `targets` array. Neighbor lookups
//! touch two contiguous `u32` arrays instead of chasing one heap allocation
//! per vertex, which pays off once graphs grow past a few dozen vertices.

use super::{acyclicity, topological, Adjacency, Kernel, KernelKind};

/// Compressed sparse row adjacency with `u32` indices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Csr {
    offsets: Vec<u32>,
    targets: Vec<u32>,
}

impl Csr {
    /// Packs nested adjacency lists.
    ///
    /// Returns `None` if the vertex count or the edge count does not fit in a
    /// `u32`.
    pub fn pack(lists: &[Vec<usize>]) -> Option<Self> {
        u32::try_from(lists.len()).ok()?;

        let mut offsets = Vec::with_capacity(lists.len() + 1);
        let mut targets = Vec::with_capacity(lists.iter().map(Vec::len).sum());
        offsets.push(0);

        for list in lists {
            for &target in list {
                targets.push(u32::try_from(target).ok()?);
            }
            offsets.push(u32::try_from(targets.len()).ok()?);
        }

        Some(Self { offsets, targets })
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.targets.len()
    }
}

impl Adjacency for Csr {
    fn vertex_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    fn degree(&self, vertex: usize) -> usize {
        (self.offsets[vertex + 1] - self.offsets[vertex]) as usize
    }

    fn neighbor(&self, vertex: usize, slot: usize) -> usize {
        self.targets[self.offsets[vertex] as usize + slot] as usize
    }
}

/// The compiled kernel: packs its input into [`Csr`] form, then runs the
/// shared algorithms over the packed arrays.
///
/// Results are identical to [`InterpretedKernel`](super::InterpretedKernel)
/// for the same input.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrKernel;

impl Kernel for CsrKernel {
    fn kind(&self) -> KernelKind {
        KernelKind::Compiled
    }

    fn capacity(&self) -> usize {
        u32::MAX as usize
    }

    fn topological_sort(&self, out_edges: &[Vec<usize>]) -> Vec<usize> {
        match Csr::pack(out_edges) {
            Some(packed) => topological::topological_sort(&packed),
            None => topological::topological_sort(out_edges),
        }
    }

    fn verify_acyclicity(&self, out_edges: &[Vec<usize>], in_edges: &[Vec<usize>]) -> Vec<usize> {
        match (Csr::pack(out_edges), Csr::pack(in_edges)) {
            (Some(out_packed), Some(in_packed)) => {
                acyclicity::verify_acyclicity(&out_packed, &in_packed)
            }
            _ => acyclicity::verify_acyclicity(out_edges, in_edges),
        }
    }
}
