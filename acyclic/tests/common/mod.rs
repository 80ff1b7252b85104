#![allow(dead_code)]

use acyclic::kernel::find_path;
use acyclic::prelude::*;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Small deterministic generator so failures reproduce from the seed.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed ^ 0x9E37_79B9_7F4A_7C15)
    }

    pub fn below(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

/// A random DAG over `0..vertex_count`: edges only run from lower to higher
/// values.
pub fn random_dag(vertex_count: usize, edge_attempts: usize, seed: u64, config: DagConfig) -> Dag<usize> {
    let mut rng = Lcg::new(seed);
    let mut dag = Dag::with_config(config);
    dag.add_vertices(0..vertex_count).unwrap();

    for _ in 0..edge_attempts {
        let a = rng.below(vertex_count);
        let b = rng.below(vertex_count);
        if a != b {
            dag.try_add_edge(a.min(b), a.max(b));
        }
    }
    dag
}

/// Adds `count` random edges from higher to lower values, each closing a
/// cycle through an existing path.
pub fn add_back_edges(dag: &mut Dag<usize>, count: usize, seed: u64) {
    let mut rng = Lcg::new(seed.wrapping_add(1));
    let vertex_count = dag.len();
    let mut added = 0;
    while added < count {
        let adjacency: Vec<Vec<usize>> = (0..vertex_count).map(|v| dag.out_edges(v).to_vec()).collect();
        let a = rng.below(vertex_count);
        let b = rng.below(vertex_count);
        let (low, high) = (a.min(b), a.max(b));
        if low != high
            && find_path(adjacency.as_slice(), low, high).is_some()
            && dag.try_add_edge(high, low)
        {
            added += 1;
        }
    }
}

pub fn assert_topological(dag: &Dag<usize>, order: &[usize]) {
    assert_eq!(order.len(), dag.len(), "order is not a permutation");
    let mut position = vec![usize::MAX; dag.len()];
    for (at, &value) in order.iter().enumerate() {
        let index = dag.position(&value).unwrap();
        assert_eq!(position[index], usize::MAX, "vertex {} repeated", value);
        position[index] = at;
    }
    for (from, to) in dag.edges() {
        assert!(position[from] < position[to], "edge {} -> {} violated", from, to);
    }
}

pub fn assert_cycle(dag: &Dag<usize>, cycle: &[usize]) {
    assert!(!cycle.is_empty());
    for (at, &value) in cycle.iter().enumerate() {
        let next = cycle[(at + 1) % cycle.len()];
        let from = dag.position(&value).unwrap();
        let to = dag.position(&next).unwrap();
        assert!(dag.contains_edge(from, to), "no edge {} -> {}", value, next);
    }
}
