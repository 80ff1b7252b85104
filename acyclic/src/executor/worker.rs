//! Background execution of kernel calls.
//!
//! A [`KernelJob`] is plain owned data: the algorithm selector, a snapshot of
//! the adjacency lists and the kernel to run. A [`WorkerDispatcher`] ships the
//! job somewhere else, runs it and hands back the index sequence. Nothing is
//! shared with the graph store while the job runs.
//!
//! Each dispatcher counts its in-flight jobs. Every job holds a lease on the
//! count that is released when the job settles, whether the kernel returned
//! or panicked.

use super::error::{panic_message, ExecutionError, Result};
use crate::kernel::Kernel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// Which kernel algorithm a call runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    TopologicalSort,
    VerifyAcyclicity,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::TopologicalSort => write!(f, "topological_sort"),
            Algorithm::VerifyAcyclicity => write!(f, "verify_acyclicity"),
        }
    }
}

/// Owned copy of a graph's adjacency lists, taken when a call is dispatched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdjacencySnapshot {
    pub out_edges: Vec<Vec<usize>>,
    pub in_edges: Vec<Vec<usize>>,
}

impl AdjacencySnapshot {
    pub fn vertex_count(&self) -> usize {
        self.out_edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.out_edges.iter().map(Vec::len).sum()
    }
}

/// One kernel call, ready to run anywhere.
///
/// The snapshot is immutable once taken, so cloning a job is cheap.
#[derive(Clone)]
pub struct KernelJob {
    pub algorithm: Algorithm,
    pub snapshot: Arc<AdjacencySnapshot>,
    pub kernel: Arc<dyn Kernel>,
}

impl KernelJob {
    /// Runs the kernel on the caller's thread.
    pub fn run(&self) -> Vec<usize> {
        match self.algorithm {
            Algorithm::TopologicalSort => self.kernel.topological_sort(&self.snapshot.out_edges),
            Algorithm::VerifyAcyclicity => self
                .kernel
                .verify_acyclicity(&self.snapshot.out_edges, &self.snapshot.in_edges),
        }
    }
}

impl fmt::Debug for KernelJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelJob")
            .field("algorithm", &self.algorithm)
            .field("kernel", &self.kernel.kind())
            .field("vertices", &self.snapshot.vertex_count())
            .finish()
    }
}

/// Runs [`KernelJob`]s outside the caller's task.
///
/// Implementations must release every resource a job holds once the job
/// settles, and must report a panicking kernel as
/// [`ExecutionError::WorkerPanicked`] rather than propagating the panic.
#[async_trait]
pub trait WorkerDispatcher: Send + Sync {
    /// Whether jobs can be dispatched from the current context.
    fn is_supported(&self) -> bool;

    /// Runs `job` on a worker and returns its result.
    async fn dispatch(&self, job: KernelJob) -> Result<Vec<usize>>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "worker-dispatcher"
    }
}

/// Counts in-flight jobs for one dispatcher.
#[derive(Debug, Clone, Default)]
struct WorkerGauge {
    active: Arc<AtomicUsize>,
}

impl WorkerGauge {
    fn lease(&self) -> WorkerLease {
        self.active.fetch_add(1, Ordering::SeqCst);
        WorkerLease {
            active: Arc::clone(&self.active),
        }
    }

    fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Holds one slot of a dispatcher's in-flight count until dropped.
#[derive(Debug)]
struct WorkerLease {
    active: Arc<AtomicUsize>,
}

impl Drop for WorkerLease {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs jobs on the tokio blocking thread pool.
///
/// Supported only when called from inside a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct BlockingPoolDispatcher {
    gauge: WorkerGauge,
}

impl BlockingPoolDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs currently running on this dispatcher.
    pub fn active_workers(&self) -> usize {
        self.gauge.active()
    }
}

#[async_trait]
impl WorkerDispatcher for BlockingPoolDispatcher {
    fn is_supported(&self) -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }

    async fn dispatch(&self, job: KernelJob) -> Result<Vec<usize>> {
        let lease = self.gauge.lease();
        debug!("Dispatching {:?} to blocking pool", job);

        let outcome = tokio::task::spawn_blocking(move || {
            let result = job.run();
            drop(lease);
            result
        })
        .await;

        match outcome {
            Ok(result) => Ok(result),
            Err(e) if e.is_panic() => Err(ExecutionError::WorkerPanicked(panic_message(
                e.into_panic().as_ref(),
            ))),
            Err(e) => Err(ExecutionError::WorkerFailed(e.to_string())),
        }
    }

    fn name(&self) -> &str {
        "blocking-pool"
    }
}

/// Runs each job on its own named OS thread.
///
/// Needs no runtime on the worker side; the result comes back through a
/// oneshot channel.
#[derive(Debug, Clone, Default)]
pub struct ThreadDispatcher {
    gauge: WorkerGauge,
    spawned: Arc<AtomicUsize>,
}

impl ThreadDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs currently running on this dispatcher.
    pub fn active_workers(&self) -> usize {
        self.gauge.active()
    }
}

#[async_trait]
impl WorkerDispatcher for ThreadDispatcher {
    fn is_supported(&self) -> bool {
        true
    }

    async fn dispatch(&self, job: KernelJob) -> Result<Vec<usize>> {
        let lease = self.gauge.lease();
        let id = self.spawned.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        debug!("Dispatching {:?} to thread acyclic-worker-{}", job, id);

        std::thread::Builder::new()
            .name(format!("acyclic-worker-{}", id))
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| job.run()))
                    .map_err(|payload| panic_message(payload.as_ref()));
                // Release before replying so the count is settled when the caller wakes.
                drop(lease);
                let _ = tx.send(outcome);
            })
            .map_err(|e| ExecutionError::WorkerFailed(format!("failed to spawn worker: {}", e)))?;

        match rx.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(message)) => Err(ExecutionError::WorkerPanicked(message)),
            Err(_) => Err(ExecutionError::WorkerFailed(
                "worker exited without replying".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "thread"
    }
}

/// Never dispatches. Installing it pins every call to the caller's task.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

#[async_trait]
impl WorkerDispatcher for InlineDispatcher {
    fn is_supported(&self) -> bool {
        false
    }

    async fn dispatch(&self, _job: KernelJob) -> Result<Vec<usize>> {
        Err(ExecutionError::UnsupportedConcurrency(
            "inline dispatcher does not run workers".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "inline"
    }
}
