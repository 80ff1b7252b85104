//! Topological sort by iterative depth-first search
//!
//! Each stack frame is a `(vertex, cursor)` pair where `cursor` is the next
//! out-edge slot to look at. A vertex is emitted once its cursor runs past its
//! last out-edge, which yields reverse topological order; the result is
//! reversed before returning.

use super::Adjacency;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    /// On the stack, not yet emitted.
    Entered,
    Finished,
}

/// Sorts the vertices of `edges` so that every vertex precedes the vertices it
/// points to.
///
/// Roots are taken in index order and out-edges in insertion order, so the
/// result is deterministic for a given graph.
///
/// On cyclic input the traversal still terminates and returns a permutation of
/// all vertices, but the edge ordering guarantee no longer holds: an edge back
/// into a vertex that is still on the stack is skipped.
///
/// # Example
///
/// ```
/// use acyclic::kernel::topological_sort;
///
/// let out_edges: Vec<Vec<usize>> = vec![vec![2], vec![2], vec![]];
/// assert_eq!(topological_sort(out_edges.as_slice()), vec![1, 0, 2]);
/// ```
pub fn topological_sort<A: Adjacency + ?Sized>(edges: &A) -> Vec<usize> {
    let vertex_count = edges.vertex_count();
    let mut marks = vec![Mark::Unvisited; vertex_count];
    let mut sorted = Vec::with_capacity(vertex_count);
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..vertex_count {
        if marks[root] != Mark::Unvisited {
            continue;
        }

        marks[root] = Mark::Entered;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (vertex, cursor) = *frame;

            if cursor >= edges.degree(vertex) {
                marks[vertex] = Mark::Finished;
                sorted.push(vertex);
                stack.pop();
                continue;
            }

            let next = edges.neighbor(vertex, cursor);
            if marks[next] == Mark::Unvisited {
                marks[next] = Mark::Entered;
                stack.push((next, 0));
            } else {
                frame.1 += 1;
            }
        }
    }

    sorted.reverse();
    sorted
}
