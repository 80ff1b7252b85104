//! Execution strategy behaviour seen through the graph store
//!
//! These tests verify that:
//! 1. Every kernel and context combination yields the same results
//! 2. Fallback degrades gracefully, or fails with a typed error when disallowed
//! 3. Worker resources are released after success and after a panic
//! 4. Malformed worker output surfaces as an error, never as a panic

mod common;

use acyclic::executor::{
    Accelerator, BlockingPoolDispatcher, CallState, Context, Fallback, InlineDispatcher, KernelJob,
    KernelLoader, Result as ExecutionResult, ThreadDispatcher, WorkerDispatcher,
};
use acyclic::kernel::{InterpretedKernel, Kernel, KernelKind};
use acyclic::prelude::*;
use async_trait::async_trait;
use common::{add_back_edges, init_tracing, random_dag};
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug)]
struct ExplodingKernel;

impl Kernel for ExplodingKernel {
    fn kind(&self) -> KernelKind {
        KernelKind::Compiled
    }

    fn topological_sort(&self, _out_edges: &[Vec<usize>]) -> Vec<usize> {
        panic!("compiled kernel defect")
    }

    fn verify_acyclicity(&self, _out_edges: &[Vec<usize>], _in_edges: &[Vec<usize>]) -> Vec<usize> {
        panic!("compiled kernel defect")
    }
}

struct ExplodingLoader;

#[async_trait]
impl KernelLoader for ExplodingLoader {
    async fn load(&self) -> ExecutionResult<Arc<dyn Kernel>> {
        Ok(Arc::new(ExplodingKernel))
    }
}

struct UnavailableLoader {
    attempts: Arc<AtomicU32>,
}

#[async_trait]
impl KernelLoader for UnavailableLoader {
    async fn load(&self) -> ExecutionResult<Arc<dyn Kernel>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ExecutionError::KernelLoad("platform has no compiled kernel".into()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Answers every job with an index one past the last vertex.
struct OffByOneDispatcher;

#[async_trait]
impl WorkerDispatcher for OffByOneDispatcher {
    fn is_supported(&self) -> bool {
        true
    }

    async fn dispatch(&self, job: KernelJob) -> ExecutionResult<Vec<usize>> {
        Ok(vec![job.snapshot.vertex_count()])
    }

    fn name(&self) -> &str {
        "off-by-one"
    }
}

fn worker_config() -> DagConfig {
    DagConfig::default().with_execution(
        ExecutionConfig::AUTO
            .with_acceleration(Mode::Always)
            .with_worker(Mode::Always),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_all_paths_agree_on_random_graphs() {
    init_tracing();
    let thread = Arc::new(ThreadDispatcher::new());

    for seed in 0..12 {
        let mut base = random_dag(90, 250, seed, DagConfig::default());
        if seed % 2 == 1 {
            add_back_edges(&mut base, 2, seed);
        }

        let mut pinned = base.clone_with(DagConfig::default().with_execution(ExecutionConfig::IN_PROCESS));
        let expected_cycle = pinned.verify_acyclicity().await.unwrap();
        let expected_sort = pinned.topological_sort().await.ok();

        for options in [
            CallOptions::default().accelerate(true).offload(false),
            CallOptions::default().accelerate(false).offload(true),
            CallOptions::default().accelerate(true).offload(true),
        ] {
            let mut pooled = base.clone();
            assert_eq!(pooled.verify_acyclicity_with(options).await.unwrap(), expected_cycle);
            assert_eq!(pooled.topological_sort_with(options).await.ok(), expected_sort);
        }

        let mut threaded = Dag::builder()
            .vertices(base.vertices().iter().copied())
            .edges(Edges::Pairs(base.edges()))
            .dispatcher(thread.clone())
            .config(worker_config())
            .build()
            .unwrap();
        assert_eq!(threaded.verify_acyclicity().await.unwrap(), expected_cycle);
        assert_eq!(threaded.topological_sort().await.ok(), expected_sort);
    }

    assert_eq!(thread.active_workers(), 0);
}

#[tokio::test]
async fn test_unavailable_kernel_is_loaded_once_and_falls_back() {
    let attempts = Arc::new(AtomicU32::new(0));
    let accelerator = Arc::new(Accelerator::new(Arc::new(UnavailableLoader {
        attempts: attempts.clone(),
    })));

    for seed in 0..3 {
        let mut dag = Dag::builder()
            .vertices(0..40usize)
            .accelerator(accelerator.clone())
            .config(DagConfig::default().with_execution(ExecutionConfig::AUTO.with_worker(Mode::Never)))
            .build()
            .unwrap();
        dag.add_edge(seed, 39).unwrap();

        assert_eq!(dag.topological_sort().await.unwrap().len(), 40);
        let report = dag.last_call().unwrap();
        assert_eq!(report.executed.kernel, KernelKind::Interpreted);
        assert!(matches!(
            report.fallbacks.as_slice(),
            [Fallback::Acceleration { reason }] if reason.contains("platform has no compiled kernel")
        ));
    }

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(accelerator.is_loaded());
}

#[tokio::test]
async fn test_unavailable_kernel_without_fallback() {
    let mut dag = Dag::builder()
        .vertices(0..40usize)
        .loader(Arc::new(UnavailableLoader {
            attempts: Arc::new(AtomicU32::new(0)),
        }))
        .config(DagConfig::default().with_execution(ExecutionConfig::AUTO.with_fallback(false)))
        .build()
        .unwrap();

    let err = dag.verify_acyclicity().await.unwrap_err();
    assert!(matches!(
        err,
        GraphError::Execution(ExecutionError::UnsupportedAcceleration(_))
    ));
    assert_eq!(dag.last_call().unwrap().state, CallState::Failed);

    // Forbidding the compiled kernel for the call sidesteps the failure.
    let cycle = dag
        .verify_acyclicity_with(CallOptions::default().accelerate(false))
        .await
        .unwrap();
    assert!(cycle.is_empty());
}

#[tokio::test]
async fn test_unsupported_workers() {
    let mut lenient = Dag::builder()
        .vertices(0..30usize)
        .dispatcher(Arc::new(InlineDispatcher))
        .build()
        .unwrap();
    assert_eq!(lenient.topological_sort().await.unwrap().len(), 30);
    let report = lenient.last_call().unwrap();
    assert_eq!(report.requested.context, Context::Worker);
    assert_eq!(report.executed.context, Context::InProcess);

    let mut strict = Dag::builder()
        .vertices(0..30usize)
        .dispatcher(Arc::new(InlineDispatcher))
        .config(DagConfig::default().with_execution(ExecutionConfig::AUTO.with_fallback(false)))
        .build()
        .unwrap();
    let err = strict.topological_sort().await.unwrap_err();
    assert!(matches!(
        err,
        GraphError::Execution(ExecutionError::UnsupportedConcurrency(_))
    ));
}

#[tokio::test]
async fn test_thread_worker_released_after_panic() {
    let dispatcher = Arc::new(ThreadDispatcher::new());
    let mut dag = Dag::builder()
        .vertices(0..10usize)
        .loader(Arc::new(ExplodingLoader))
        .dispatcher(dispatcher.clone())
        .config(worker_config())
        .build()
        .unwrap();

    let before = dispatcher.active_workers();
    let err = dag.verify_acyclicity().await.unwrap_err();
    assert!(matches!(
        err,
        GraphError::Execution(ExecutionError::WorkerPanicked(ref message)) if message == "compiled kernel defect"
    ));
    assert!(!err.is_recoverable());
    assert_eq!(dispatcher.active_workers(), before);

    // The graph stays usable through the interpreted kernel.
    let order = dag
        .topological_sort_with(CallOptions::default().accelerate(false))
        .await
        .unwrap();
    assert_eq!(order.len(), 10);
    assert_eq!(dispatcher.active_workers(), before);
}

#[tokio::test]
async fn test_blocking_pool_released_after_panic() {
    let dispatcher = Arc::new(BlockingPoolDispatcher::new());
    let mut dag = Dag::builder()
        .vertices(0..10usize)
        .loader(Arc::new(ExplodingLoader))
        .dispatcher(dispatcher.clone())
        .config(worker_config())
        .build()
        .unwrap();

    let before = dispatcher.active_workers();
    assert!(dag.topological_sort().await.is_err());
    assert_eq!(dispatcher.active_workers(), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_graphs_share_a_dispatcher() {
    let dispatcher = Arc::new(ThreadDispatcher::new());

    let mut handles = Vec::new();
    for seed in 0..8 {
        let dispatcher = dispatcher.clone();
        handles.push(tokio::spawn(async move {
            let base = random_dag(120, 400, seed, worker_config());
            let mut dag = Dag::builder()
                .vertices(base.vertices().iter().copied())
                .edges(Edges::Pairs(base.edges()))
                .dispatcher(dispatcher)
                .config(worker_config())
                .build()
                .unwrap();
            let order = dag.topological_sort().await.unwrap();
            let expected = InterpretedKernel.topological_sort(&adjacency(&dag));
            assert_eq!(order, expected);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(dispatcher.active_workers(), 0);
}

fn adjacency(dag: &Dag<usize>) -> Vec<Vec<usize>> {
    (0..dag.len()).map(|v| dag.out_edges(v).to_vec()).collect()
}

#[tokio::test]
async fn test_malformed_worker_output_is_an_error() {
    let mut dag = Dag::builder()
        .vertices(0..10usize)
        .edges(Edges::Pairs(vec![(0, 1), (1, 0)]))
        .dispatcher(Arc::new(OffByOneDispatcher))
        .config(worker_config())
        .build()
        .unwrap();

    let err = dag.verify_acyclicity().await.unwrap_err();
    assert_eq!(
        err,
        GraphError::Execution(ExecutionError::InvalidOutput(
            "verify_acyclicity returned index 10 for 10 vertices".into()
        ))
    );
    assert!(!err.is_recoverable());
    assert_eq!(dag.last_call().unwrap().state, CallState::Failed);

    let err = dag.topological_sort().await.unwrap_err();
    assert!(matches!(
        err,
        GraphError::Execution(ExecutionError::InvalidOutput(_))
    ));

    // In-process execution is unaffected.
    let cycle = dag
        .verify_acyclicity_with(CallOptions::default().offload(false))
        .await
        .unwrap();
    assert_eq!(cycle.len(), 2);
}
