//! Dag - vertex store with validated edges and cached ordering
//!
//! # Design
//!
//! Vertices live in a `Vec<T>`; a vertex's position is its index and the only
//! handle edges use. Edges are kept twice, as bidirectional adjacency lists:
//! - `out_edges[v]`: destinations of `v`, in insertion order
//! - `in_edges[v]`: sources pointing at `v`, in insertion order
//!
//! Every mutation keeps the two lists symmetric. Removing a vertex compacts
//! the index space: every greater index shifts down by one and every edge
//! endpoint is rewritten to match.
//!
//! Sort and verification results are cached until the next successful
//! mutation; the kernels themselves run through the execution
//! [`Strategy`](crate::executor::Strategy).

use super::builder::DagBuilder;
use super::config::{DagConfig, DuplicateVertexPolicy, Edges, VertexRemoval};
use super::error::{EdgeFault, GraphError, GraphResult};
use crate::executor::{AdjacencySnapshot, Algorithm, CallOptions, CallReport, ExecutionError, Strategy};
use crate::kernel::find_path;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Equality used for duplicate checks and value lookups.
pub type VertexEq<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

#[derive(Clone)]
struct Cache<T> {
    sorted: Option<Vec<T>>,
    /// Indices of a witness cycle; empty when verified acyclic.
    cycle: Option<Vec<usize>>,
}

impl<T> Cache<T> {
    fn empty() -> Self {
        Self {
            sorted: None,
            cycle: None,
        }
    }
}

/// A directed graph of caller-supplied values, checked for acyclicity on
/// demand.
///
/// # Example
///
/// ```
/// use acyclic::graph::Dag;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), acyclic::graph::GraphError> {
/// let mut dag = Dag::new();
/// let fetch = dag.add_vertex("fetch")?;
/// let build = dag.add_vertex("build")?;
/// let test = dag.add_vertex("test")?;
///
/// dag.add_edge(fetch, build)?;
/// dag.add_edge(build, test)?;
///
/// assert_eq!(dag.topological_sort().await?, vec!["fetch", "build", "test"]);
///
/// dag.add_edge(test, build)?;
/// assert_eq!(dag.verify_acyclicity().await?, vec!["build", "test"]);
/// assert!(dag.topological_sort().await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Dag<T> {
    vertices: Vec<T>,
    out_edges: Vec<Vec<usize>>,
    in_edges: Vec<Vec<usize>>,
    config: DagConfig,
    vertex_eq: VertexEq<T>,
    strategy: Strategy,
    cache: Cache<T>,
    last_call: Option<CallReport>,
}

impl<T: Clone + fmt::Debug + PartialEq + 'static> Dag<T> {
    /// Creates an empty graph with the default configuration
    pub fn new() -> Self {
        Self::with_config(DagConfig::default())
    }

    /// Creates an empty graph
    pub fn with_config(config: DagConfig) -> Self {
        Self::from_raw(
            config,
            Arc::new(|a: &T, b: &T| a == b),
            Strategy::new(config.execution),
        )
    }

    /// Creates a graph from initial vertices and edges
    ///
    /// See [`DagBuilder::build`] for how the inputs are validated.
    pub fn from_parts(vertices: Vec<T>, edges: Edges) -> GraphResult<Self> {
        DagBuilder::new().vertices(vertices).edges(edges).build()
    }
}

impl<T: Clone + fmt::Debug + PartialEq + 'static> Default for Dag<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Dag<T> {
    /// Returns a builder for a graph with custom collaborators or equality
    pub fn builder() -> DagBuilder<T> {
        DagBuilder::new()
    }

    pub(super) fn from_raw(config: DagConfig, vertex_eq: VertexEq<T>, strategy: Strategy) -> Self {
        Self {
            vertices: Vec::new(),
            out_edges: Vec::new(),
            in_edges: Vec::new(),
            config,
            vertex_eq,
            strategy,
            cache: Cache::empty(),
            last_call: None,
        }
    }

    /// Returns the number of vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the graph has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the number of edges
    pub fn edge_count(&self) -> usize {
        self.out_edges.iter().map(Vec::len).sum()
    }

    /// Returns the vertex at `index`
    pub fn vertex(&self, index: usize) -> Option<&T> {
        self.vertices.get(index)
    }

    /// Returns all vertices in index order
    pub fn vertices(&self) -> &[T] {
        &self.vertices
    }

    /// Returns every edge as `(from, to)`, grouped by source in index order
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.out_edges
            .iter()
            .enumerate()
            .flat_map(|(from, tos)| tos.iter().map(move |&to| (from, to)))
            .collect()
    }

    /// Returns the destinations of `index`, empty if out of range
    pub fn out_edges(&self, index: usize) -> &[usize] {
        self.out_edges.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the sources pointing at `index`, empty if out of range
    pub fn in_edges(&self, index: usize) -> &[usize] {
        self.in_edges.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if the edge `from -> to` exists
    pub fn contains_edge(&self, from: usize, to: usize) -> bool {
        self.out_edges(from).contains(&to)
    }

    /// Returns the index of the first vertex equal to `value`
    pub fn position(&self, value: &T) -> Option<usize> {
        self.vertices
            .iter()
            .position(|vertex| (self.vertex_eq)(vertex, value))
    }

    /// Returns the configuration this graph was created with
    pub fn config(&self) -> &DagConfig {
        &self.config
    }

    /// Returns the report of the most recent kernel call
    ///
    /// Results served from the cache do not run a kernel and leave this
    /// unchanged.
    pub fn last_call(&self) -> Option<&CallReport> {
        self.last_call.as_ref()
    }

    fn invalidate(&mut self) {
        self.cache.sorted = None;
        self.cache.cycle = None;
    }
}

impl<T: Clone + fmt::Debug> Dag<T> {
    /// Returns a copy of this graph under a different configuration
    ///
    /// The duplicate policy applies to vertices added from now on; existing
    /// vertices and edges are kept as they are.
    pub fn clone_with(&self, config: DagConfig) -> Self {
        let mut dag = self.clone();
        dag.strategy = dag.strategy.with_config(config.execution);
        dag.config = config;
        dag
    }

    /// Adds a vertex and returns its index
    ///
    /// Under [`DuplicateVertexPolicy::Reuse`] an equal vertex's index is
    /// returned without inserting; under [`DuplicateVertexPolicy::Reject`] an
    /// equal vertex is an error.
    pub fn add_vertex(&mut self, value: T) -> GraphResult<usize> {
        match self.config.duplicate_vertices {
            DuplicateVertexPolicy::Allow => {}
            DuplicateVertexPolicy::Reuse => {
                if let Some(existing) = self.position(&value) {
                    return Ok(existing);
                }
            }
            DuplicateVertexPolicy::Reject => {
                if let Some(existing) = self.position(&value) {
                    return Err(GraphError::duplicate_vertex(existing));
                }
            }
        }

        self.vertices.push(value);
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        self.invalidate();
        Ok(self.vertices.len() - 1)
    }

    /// Adds several vertices, stopping at the first failure
    pub fn add_vertices(&mut self, values: impl IntoIterator<Item = T>) -> GraphResult<Vec<usize>> {
        values
            .into_iter()
            .map(|value| self.add_vertex(value))
            .collect()
    }

    /// Removes the vertex at `index` and every edge touching it
    ///
    /// Every vertex above `index` moves down by one. Returns false, changing
    /// nothing, if `index` is out of range.
    pub fn remove_vertex(&mut self, index: usize) -> bool {
        if index >= self.vertices.len() {
            return false;
        }

        self.vertices.remove(index);
        self.out_edges.remove(index);
        self.in_edges.remove(index);

        for list in self.out_edges.iter_mut().chain(self.in_edges.iter_mut()) {
            list.retain(|&other| other != index);
            for other in list.iter_mut() {
                if *other > index {
                    *other -= 1;
                }
            }
        }

        self.invalidate();
        true
    }

    /// Removes several vertices, all given as indices into the graph before
    /// the call, and returns how many were removed
    pub fn remove_vertices(&mut self, indices: impl IntoIterator<Item = usize>) -> usize {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();

        // Highest first, so lower indices stay valid.
        indices
            .into_iter()
            .rev()
            .filter(|&index| self.remove_vertex(index))
            .count()
    }

    /// Removes vertices equal to `value` and returns their former indices in
    /// ascending order
    pub fn remove_vertex_value(&mut self, value: &T, selection: VertexRemoval) -> Vec<usize> {
        let matches = |index: &usize| {
            self.vertices
                .get(*index)
                .is_some_and(|vertex| (self.vertex_eq)(vertex, value))
        };

        let mut selected: Vec<usize> = match selection {
            VertexRemoval::First => (0..self.vertices.len()).find(matches).into_iter().collect(),
            VertexRemoval::Last => (0..self.vertices.len()).rev().find(matches).into_iter().collect(),
            VertexRemoval::All => (0..self.vertices.len()).filter(matches).collect(),
            VertexRemoval::Among(indices) => indices.into_iter().filter(matches).collect(),
        };
        selected.sort_unstable();
        selected.dedup();

        self.remove_vertices(selected.iter().copied());
        selected
    }

    fn check_edge(&self, from: usize, to: usize) -> GraphResult<()> {
        if from >= self.vertices.len() {
            return Err(GraphError::invalid_edge(from, to, EdgeFault::FromOutOfRange));
        }
        if to >= self.vertices.len() {
            return Err(GraphError::invalid_edge(from, to, EdgeFault::ToOutOfRange));
        }
        if from == to {
            return Err(GraphError::invalid_edge(from, to, EdgeFault::SelfLoop));
        }
        if self.out_edges[from].contains(&to) {
            return Err(GraphError::duplicate_edge(from, to));
        }
        Ok(())
    }

    /// Adds the edge `from -> to`
    ///
    /// Returns an error if:
    /// - Either endpoint is not a vertex index
    /// - `from == to`
    /// - The edge already exists
    /// - `verify_on_add_edge` is set and the edge closes a cycle (the graph is
    ///   left unchanged); a cycle already present elsewhere does not count
    pub fn add_edge(&mut self, from: usize, to: usize) -> GraphResult<()> {
        self.check_edge(from, to)?;

        if self.config.verify_on_add_edge {
            // The new edge closes a cycle exactly when `from` is reachable from `to`.
            if let Some(mut cycle) = find_path(self.out_edges.as_slice(), to, from) {
                cycle.rotate_right(1);
                debug!("Rejected edge {} -> {}, closes cycle {:?}", from, to, cycle);
                return Err(self.cycle_error(cycle));
            }
        }

        self.out_edges[from].push(to);
        self.in_edges[to].push(from);

        // An edge that closes no cycle keeps an acyclic graph acyclic.
        let known_acyclic = self.cache.cycle.as_ref().is_some_and(Vec::is_empty);
        self.invalidate();
        if self.config.verify_on_add_edge && known_acyclic {
            self.cache.cycle = Some(Vec::new());
        }
        Ok(())
    }

    /// Adds the edge `from -> to`, returning whether it was added
    pub fn try_add_edge(&mut self, from: usize, to: usize) -> bool {
        self.add_edge(from, to).is_ok()
    }

    /// Adds several edges, stopping at the first failure
    ///
    /// Edges added before the failure are kept.
    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = (usize, usize)>) -> GraphResult<()> {
        for (from, to) in edges {
            self.add_edge(from, to)?;
        }
        Ok(())
    }

    /// Adds every valid edge and reports which ones were added
    pub fn try_add_edges(&mut self, edges: impl IntoIterator<Item = (usize, usize)>) -> Vec<bool> {
        edges
            .into_iter()
            .map(|(from, to)| self.try_add_edge(from, to))
            .collect()
    }

    /// Removes the edge `from -> to`, returning false if it does not exist
    pub fn remove_edge(&mut self, from: usize, to: usize) -> bool {
        let Some(slot) = self
            .out_edges
            .get(from)
            .and_then(|tos| tos.iter().position(|&other| other == to))
        else {
            return false;
        };

        self.out_edges[from].remove(slot);
        if let Some(sources) = self.in_edges.get_mut(to) {
            sources.retain(|&other| other != from);
        }

        self.invalidate();
        true
    }

    /// Removes several edges and returns how many existed
    pub fn remove_edges(&mut self, edges: impl IntoIterator<Item = (usize, usize)>) -> usize {
        edges
            .into_iter()
            .filter(|&(from, to)| self.remove_edge(from, to))
            .count()
    }

    /// Removes every vertex and edge
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.out_edges.clear();
        self.in_edges.clear();
        self.invalidate();
    }

    /// Returns the values of a cycle, or an empty vector if the graph is
    /// acyclic
    pub async fn verify_acyclicity(&mut self) -> GraphResult<Vec<T>> {
        self.verify_acyclicity_with(CallOptions::default()).await
    }

    /// [`verify_acyclicity`](Self::verify_acyclicity) with per-call overrides
    pub async fn verify_acyclicity_with(&mut self, options: CallOptions) -> GraphResult<Vec<T>> {
        let cycle = self.cycle_indices(&options).await?;
        self.values_of(&cycle)
    }

    /// Returns every vertex, each before all vertices it has an edge to
    ///
    /// Verifies acyclicity first and fails with
    /// [`GraphError::CycleDetected`] if the graph has a cycle.
    pub async fn topological_sort(&mut self) -> GraphResult<Vec<T>> {
        self.topological_sort_with(CallOptions::default()).await
    }

    /// [`topological_sort`](Self::topological_sort) with per-call overrides
    ///
    /// An order computed with verification skipped is cached only if the
    /// graph is already known to be acyclic.
    pub async fn topological_sort_with(&mut self, options: CallOptions) -> GraphResult<Vec<T>> {
        if let Some(sorted) = &self.cache.sorted {
            debug!("Topological order served from cache");
            return Ok(sorted.clone());
        }

        if !options.skip_verification {
            let cycle = self.cycle_indices(&options).await?;
            if !cycle.is_empty() {
                return Err(self.cycle_error(cycle));
            }
        }

        let order = self.run(Algorithm::TopologicalSort, &options).await?;
        let sorted = self.values_of(&order)?;
        if self.cache.cycle.as_ref().is_some_and(Vec::is_empty) {
            self.cache.sorted = Some(sorted.clone());
        }
        Ok(sorted)
    }

    async fn cycle_indices(&mut self, options: &CallOptions) -> GraphResult<Vec<usize>> {
        if let Some(cycle) = &self.cache.cycle {
            debug!("Acyclicity result served from cache");
            return Ok(cycle.clone());
        }

        let cycle = self.run(Algorithm::VerifyAcyclicity, options).await?;
        if !cycle.is_empty() {
            debug!("Cycle detected through vertices {:?}", cycle);
        }
        self.cache.cycle = Some(cycle.clone());
        Ok(cycle)
    }

    async fn run(&mut self, algorithm: Algorithm, options: &CallOptions) -> GraphResult<Vec<usize>> {
        // Sorting only reads out-edges.
        let in_edges = match algorithm {
            Algorithm::VerifyAcyclicity => self.in_edges.clone(),
            Algorithm::TopologicalSort => Vec::new(),
        };
        let snapshot = AdjacencySnapshot {
            out_edges: self.out_edges.clone(),
            in_edges,
        };

        let outcome = self.strategy.run(algorithm, snapshot, options).await;
        self.last_call = Some(outcome.report);
        Ok(outcome.result?)
    }

    fn values_of(&self, indices: &[usize]) -> GraphResult<Vec<T>> {
        indices
            .iter()
            .map(|&index| {
                self.vertices.get(index).cloned().ok_or_else(|| {
                    GraphError::from(ExecutionError::InvalidOutput(format!(
                        "vertex index {} out of range for {} vertices",
                        index,
                        self.vertices.len()
                    )))
                })
            })
            .collect()
    }

    fn cycle_error(&self, cycle: Vec<usize>) -> GraphError {
        match self.values_of(&cycle) {
            Ok(values) => GraphError::cycle(&values, cycle),
            Err(e) => e,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Dag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dag")
            .field("vertices", &self.vertices)
            .field("out_edges", &self.out_edges)
            .field("config", &self.config)
            .finish()
    }
}
