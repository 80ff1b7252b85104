//! Construction of a [`Dag`] with initial contents and custom collaborators.

use super::config::{DagConfig, Edges};
use super::dag::Dag;
use super::error::{EdgeFault, GraphError, GraphResult};
use crate::executor::{Accelerator, KernelLoader, Strategy, WorkerDispatcher};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Builds a [`Dag`].
///
/// # Example
///
/// ```
/// use acyclic::executor::ThreadDispatcher;
/// use acyclic::graph::{Dag, DagConfig, Edges};
/// use std::sync::Arc;
///
/// let dag = Dag::builder()
///     .vertices(["a", "b", "c"])
///     .edges(Edges::Adjacency(vec![vec![1], vec![2], vec![]]))
///     .config(DagConfig::default().with_verify_on_add_edge(true))
///     .dispatcher(Arc::new(ThreadDispatcher::new()))
///     .build()?;
/// assert_eq!(dag.edges(), vec![(0, 1), (1, 2)]);
/// # Ok::<(), acyclic::graph::GraphError>(())
/// ```
pub struct DagBuilder<T> {
    vertices: Vec<T>,
    edges: Edges,
    config: DagConfig,
    accelerator: Option<Arc<Accelerator>>,
    dispatcher: Option<Arc<dyn WorkerDispatcher>>,
}

impl<T> DagBuilder<T> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Edges::default(),
            config: DagConfig::default(),
            accelerator: None,
            dispatcher: None,
        }
    }

    pub fn vertices(mut self, vertices: impl IntoIterator<Item = T>) -> Self {
        self.vertices = vertices.into_iter().collect();
        self
    }

    /// Edge indices refer to positions in the vertex list given to
    /// [`vertices`](Self::vertices).
    pub fn edges(mut self, edges: Edges) -> Self {
        self.edges = edges;
        self
    }

    pub fn config(mut self, config: DagConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a private accelerator around `loader` instead of the process-wide
    /// one.
    pub fn loader(mut self, loader: Arc<dyn KernelLoader>) -> Self {
        self.accelerator = Some(Arc::new(Accelerator::new(loader)));
        self
    }

    pub fn accelerator(mut self, accelerator: Arc<Accelerator>) -> Self {
        self.accelerator = Some(accelerator);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn WorkerDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }
}

impl<T: Clone + fmt::Debug + 'static> DagBuilder<T> {
    /// Builds the graph, comparing vertices with `PartialEq`.
    ///
    /// Vertices are added in order under the configured duplicate policy and
    /// edges are remapped to the indices the vertices ended up at, so under
    /// `Reuse` an edge between two equal vertices becomes a self-loop.
    /// Fails if:
    /// - An adjacency list does not have one entry per vertex
    /// - A vertex is rejected as a duplicate
    /// - An edge is invalid, unless `lenient_edges` is set, in which case
    ///   invalid edges are skipped
    pub fn build(self) -> GraphResult<Dag<T>>
    where
        T: PartialEq,
    {
        self.build_by(|a: &T, b: &T| a == b)
    }

    /// Builds the graph, comparing vertices with `eq`.
    pub fn build_by<F>(self, eq: F) -> GraphResult<Dag<T>>
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let supplied = self.vertices.len();
        let pairs: Vec<(usize, usize)> = match self.edges {
            Edges::Pairs(pairs) => pairs,
            Edges::Adjacency(lists) => {
                if lists.len() != supplied {
                    return Err(GraphError::count_mismatch(supplied, lists.len()));
                }
                lists
                    .into_iter()
                    .enumerate()
                    .flat_map(|(from, tos)| tos.into_iter().map(move |to| (from, to)))
                    .collect()
            }
        };

        let mut strategy = Strategy::new(self.config.execution);
        if let Some(accelerator) = self.accelerator {
            strategy = strategy.with_accelerator(accelerator);
        }
        if let Some(dispatcher) = self.dispatcher {
            strategy = strategy.with_dispatcher(dispatcher);
        }

        let mut dag = Dag::from_raw(self.config, Arc::new(eq), strategy);
        let placed = dag.add_vertices(self.vertices)?;

        for (from, to) in pairs {
            let added = match (placed.get(from), placed.get(to)) {
                (Some(&from), Some(&to)) => dag.add_edge(from, to),
                (None, _) => Err(GraphError::invalid_edge(from, to, EdgeFault::FromOutOfRange)),
                (_, None) => Err(GraphError::invalid_edge(from, to, EdgeFault::ToOutOfRange)),
            };
            match added {
                Ok(()) => {}
                Err(e) if self.config.lenient_edges => {
                    debug!("Skipping initial edge {} -> {}: {}", from, to, e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(dag)
    }
}

impl<T> Default for DagBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
