//! Path search between two vertices
//!
//! Used to decide whether one new edge closes a cycle without re-verifying the
//! whole graph: `from -> to` closes a cycle exactly when `from` is reachable
//! from `to`.

use super::Adjacency;

/// Returns a path of vertex indices from `start` to `goal`, both included, or
/// `None` if `goal` is unreachable.
///
/// Out-edges are explored in insertion order. `start == goal` yields
/// `[start]`.
///
/// # Example
///
/// ```
/// use acyclic::kernel::find_path;
///
/// let out_edges: Vec<Vec<usize>> = vec![vec![1, 2], vec![3], vec![], vec![]];
/// assert_eq!(find_path(out_edges.as_slice(), 0, 3), Some(vec![0, 1, 3]));
/// assert_eq!(find_path(out_edges.as_slice(), 2, 0), None);
/// ```
pub fn find_path<A: Adjacency + ?Sized>(edges: &A, start: usize, goal: usize) -> Option<Vec<usize>> {
    let mut seen = vec![false; edges.vertex_count()];
    // Frames are (vertex, next out-edge slot); the stack is the current path.
    let mut stack = vec![(start, 0)];
    seen[start] = true;

    while let Some(frame) = stack.last_mut() {
        let (vertex, cursor) = *frame;
        if vertex == goal {
            return Some(stack.iter().map(|&(on_path, _)| on_path).collect());
        }

        if cursor == edges.degree(vertex) {
            stack.pop();
            continue;
        }

        frame.1 = cursor + 1;
        let next = edges.neighbor(vertex, cursor);
        if !seen[next] {
            seen[next] = true;
            stack.push((next, 0));
        }
    }

    None
}
