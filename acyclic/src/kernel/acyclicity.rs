//! Acyclicity verification with a witness cycle
//!
//! The search starts from the sources (vertices without in-edges). A finite
//! DAG always has one, so a non-empty graph without sources is cyclic and a
//! cycle is recovered by walking in-edges backward until a vertex repeats.
//!
//! Otherwise a depth-first search runs from every source. Vertices are marked
//! on-path while their frame is on the stack and cleared once every edge out
//! of them has been explored; cleared vertices are never walked again, which
//! keeps the search linear on graphs with many converging paths.

use super::Adjacency;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unseen,
    OnPath,
    Cleared,
}

/// Returns the vertex indices of a cycle, or an empty vector if there is none.
///
/// The cycle is reported in traversal order starting from the vertex that
/// closed it: for every consecutive pair `(a, b)`, and for the last and first
/// element, `a` has an out-edge to `b`.
///
/// Sources are searched highest index first and out-edges last-inserted first.
/// Vertices left unseen afterwards (only reachable from a cycle) are searched
/// in index order, so a cycle unreachable from any source is still reported.
///
/// # Example
///
/// ```
/// use acyclic::kernel::verify_acyclicity;
///
/// let out_edges: Vec<Vec<usize>> = vec![vec![1], vec![2], vec![1]];
/// let in_edges: Vec<Vec<usize>> = vec![vec![], vec![0, 2], vec![1]];
/// assert_eq!(verify_acyclicity(out_edges.as_slice(), in_edges.as_slice()), vec![1, 2]);
/// ```
pub fn verify_acyclicity<O, I>(out_edges: &O, in_edges: &I) -> Vec<usize>
where
    O: Adjacency + ?Sized,
    I: Adjacency + ?Sized,
{
    let vertex_count = out_edges.vertex_count();
    if vertex_count == 0 {
        return Vec::new();
    }

    let sources: Vec<usize> = (0..vertex_count)
        .filter(|&vertex| in_edges.degree(vertex) == 0)
        .collect();

    if sources.is_empty() {
        return walk_back(in_edges, 0);
    }

    let mut marks = vec![Mark::Unseen; vertex_count];
    let mut stack = Vec::new();

    for &source in sources.iter().rev() {
        if let Some(cycle) = search_from(out_edges, source, &mut marks, &mut stack) {
            return cycle;
        }
    }

    for vertex in 0..vertex_count {
        if let Some(cycle) = search_from(out_edges, vertex, &mut marks, &mut stack) {
            return cycle;
        }
    }

    Vec::new()
}

/// Depth-first search from `start`, frames are `(vertex, unexplored out-edges)`.
fn search_from<O: Adjacency + ?Sized>(
    out_edges: &O,
    start: usize,
    marks: &mut [Mark],
    stack: &mut Vec<(usize, usize)>,
) -> Option<Vec<usize>> {
    if marks[start] != Mark::Unseen {
        return None;
    }

    marks[start] = Mark::OnPath;
    stack.push((start, out_edges.degree(start)));

    while let Some(frame) = stack.last_mut() {
        let (vertex, remaining) = *frame;

        if remaining == 0 {
            marks[vertex] = Mark::Cleared;
            stack.pop();
            continue;
        }

        frame.1 = remaining - 1;
        let next = out_edges.neighbor(vertex, remaining - 1);

        match marks[next] {
            Mark::Unseen => {
                marks[next] = Mark::OnPath;
                stack.push((next, out_edges.degree(next)));
            }
            Mark::OnPath => {
                let at = stack.iter().position(|&(on_path, _)| on_path == next)?;
                return Some(stack[at..].iter().map(|&(on_path, _)| on_path).collect());
            }
            Mark::Cleared => {}
        }
    }

    None
}

/// Follows first in-edges backward from `start` until a vertex repeats.
///
/// Only called when every vertex has an in-edge, so the walk cannot dead-end.
fn walk_back<I: Adjacency + ?Sized>(in_edges: &I, start: usize) -> Vec<usize> {
    let mut seen_at: Vec<Option<usize>> = vec![None; in_edges.vertex_count()];
    let mut trail = Vec::new();
    let mut vertex = start;

    loop {
        if let Some(at) = seen_at[vertex] {
            // The trail runs against edge direction.
            let mut cycle = trail.split_off(at);
            cycle.reverse();
            return cycle;
        }
        if in_edges.degree(vertex) == 0 {
            return Vec::new();
        }

        seen_at[vertex] = Some(trail.len());
        trail.push(vertex);
        vertex = in_edges.neighbor(vertex, 0);
    }
}
