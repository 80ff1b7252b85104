//! Per-call selection of kernel and execution context.
//!
//! [`Strategy::run`] resolves a [`Plan`] from the configuration and the call's
//! overrides, then walks it down as far as the platform allows:
//!
//! 1. Kernel: the compiled kernel comes from the [`Accelerator`]; if it failed
//!    to load or cannot hold the graph, the call drops to the interpreted
//!    kernel (or fails when fallback is disallowed).
//! 2. Context: worker calls go through the [`WorkerDispatcher`]; if it is
//!    unsupported or the worker fails to run, the call drops to in-process
//!    execution (or fails when fallback is disallowed).
//! 3. Output: indices are checked against the snapshot before they are
//!    returned, so a faulty kernel or dispatcher fails the call instead of the
//!    caller.
//!
//! Every call yields a [`CallReport`] describing what was asked for, what
//! actually ran and which fallbacks were taken, whether or not it succeeded.

use super::config::{CallOptions, Context, ExecutionConfig, Plan};
use super::error::{ExecutionError, Result};
use super::loader::{default_accelerator, Accelerator};
use super::worker::{AdjacencySnapshot, Algorithm, BlockingPoolDispatcher, KernelJob, WorkerDispatcher};
use crate::kernel::{InterpretedKernel, Kernel, KernelKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, debug_span, warn, Instrument};

/// Lifecycle of one kernel call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallState {
    /// Plan resolved, nothing run yet.
    Idle,
    /// Handed to a kernel, in-process or on a worker.
    Dispatched,
    Completed,
    Failed,
}

/// A downgrade from the requested plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fallback {
    /// Compiled kernel replaced by the interpreted kernel.
    Acceleration { reason: String },
    /// Worker replaced by in-process execution.
    Concurrency { reason: String },
}

/// What happened during one kernel call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReport {
    pub algorithm: Algorithm,
    pub requested: Plan,
    pub executed: Plan,
    pub fallbacks: Vec<Fallback>,
    pub state: CallState,
}

impl CallReport {
    fn new(algorithm: Algorithm, requested: Plan) -> Self {
        Self {
            algorithm,
            requested,
            executed: requested,
            fallbacks: Vec::new(),
            state: CallState::Idle,
        }
    }

    /// Whether the call ran exactly as requested.
    pub fn is_as_requested(&self) -> bool {
        self.fallbacks.is_empty()
    }
}

/// The result of [`Strategy::run`] together with its report.
#[derive(Debug)]
pub struct CallOutcome {
    pub report: CallReport,
    pub result: Result<Vec<usize>>,
}

/// Chooses and runs a kernel for each call.
///
/// Cloning is cheap; clones share the accelerator and dispatcher.
#[derive(Clone)]
pub struct Strategy {
    config: ExecutionConfig,
    accelerator: Arc<Accelerator>,
    dispatcher: Arc<dyn WorkerDispatcher>,
}

impl Strategy {
    /// Creates a strategy using the process-wide accelerator and the tokio
    /// blocking pool.
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            config,
            accelerator: default_accelerator(),
            dispatcher: Arc::new(BlockingPoolDispatcher::new()),
        }
    }

    /// Replaces the source of the compiled kernel.
    pub fn with_accelerator(mut self, accelerator: Arc<Accelerator>) -> Self {
        self.accelerator = accelerator;
        self
    }

    /// Replaces the worker dispatcher.
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn WorkerDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Replaces the execution configuration, keeping the collaborators.
    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn accelerator(&self) -> &Arc<Accelerator> {
        &self.accelerator
    }

    /// Runs `algorithm` over `snapshot`.
    pub async fn run(
        &self,
        algorithm: Algorithm,
        snapshot: AdjacencySnapshot,
        options: &CallOptions,
    ) -> CallOutcome {
        let vertices = snapshot.vertex_count();
        let requested = self.config.plan(vertices, options);
        let mut report = CallReport::new(algorithm, requested);

        let span = debug_span!(
            "kernel_call",
            algorithm = %algorithm,
            vertices,
            plan = %requested
        );

        let result = self
            .execute(Arc::new(snapshot), &mut report)
            .instrument(span)
            .await;

        report.state = if result.is_ok() {
            CallState::Completed
        } else {
            CallState::Failed
        };

        CallOutcome { report, result }
    }

    async fn execute(
        &self,
        snapshot: Arc<AdjacencySnapshot>,
        report: &mut CallReport,
    ) -> Result<Vec<usize>> {
        debug!("Resolved plan: {}", report.requested);

        let kernel = self.resolve_kernel(&snapshot, report).await?;
        report.executed.kernel = kernel.kind();

        let context = self.resolve_context(report)?;
        report.executed.context = context;

        let vertex_count = snapshot.vertex_count();
        let job = KernelJob {
            algorithm: report.algorithm,
            snapshot,
            kernel,
        };
        report.state = CallState::Dispatched;

        let output = match context {
            Context::InProcess => job.run(),
            Context::Worker => match self.dispatcher.dispatch(job.clone()).await {
                Ok(result) => result,
                Err(e) if self.config.allow_fallback && e.is_recoverable() => {
                    warn!(
                        "Worker {} failed, running in-process instead: {}",
                        self.dispatcher.name(),
                        e
                    );
                    report.fallbacks.push(Fallback::Concurrency {
                        reason: e.to_string(),
                    });
                    report.executed.context = Context::InProcess;
                    job.run()
                }
                Err(e) => return Err(e),
            },
        };

        check_output(report.algorithm, vertex_count, &output)?;
        Ok(output)
    }

    async fn resolve_kernel(
        &self,
        snapshot: &AdjacencySnapshot,
        report: &mut CallReport,
    ) -> Result<Arc<dyn Kernel>> {
        if report.requested.kernel == KernelKind::Interpreted {
            return Ok(Arc::new(InterpretedKernel));
        }

        let unavailable = match self.accelerator.kernel().await {
            Ok(kernel) => {
                let size = snapshot.vertex_count().max(snapshot.edge_count());
                if size <= kernel.capacity() {
                    return Ok(kernel);
                }
                format!(
                    "graph size {} exceeds compiled kernel capacity {}",
                    size,
                    kernel.capacity()
                )
            }
            Err(e) => e.to_string(),
        };

        if !self.config.allow_fallback {
            return Err(ExecutionError::UnsupportedAcceleration(unavailable));
        }

        warn!("Falling back to interpreted kernel: {}", unavailable);
        report.fallbacks.push(Fallback::Acceleration {
            reason: unavailable,
        });
        Ok(Arc::new(InterpretedKernel))
    }

    fn resolve_context(&self, report: &mut CallReport) -> Result<Context> {
        if report.requested.context == Context::InProcess || self.dispatcher.is_supported() {
            return Ok(report.requested.context);
        }

        let unavailable = format!(
            "dispatcher {} is not supported here",
            self.dispatcher.name()
        );
        if !self.config.allow_fallback {
            return Err(ExecutionError::UnsupportedConcurrency(unavailable));
        }

        warn!("Falling back to in-process execution: {}", unavailable);
        report.fallbacks.push(Fallback::Concurrency {
            reason: unavailable,
        });
        Ok(Context::InProcess)
    }
}

/// Rejects output that cannot be mapped back onto the snapshot's vertices.
fn check_output(algorithm: Algorithm, vertex_count: usize, output: &[usize]) -> Result<()> {
    if let Some(index) = output.iter().find(|&&index| index >= vertex_count) {
        return Err(ExecutionError::InvalidOutput(format!(
            "{} returned index {} for {} vertices",
            algorithm, index, vertex_count
        )));
    }
    if algorithm == Algorithm::TopologicalSort && output.len() != vertex_count {
        return Err(ExecutionError::InvalidOutput(format!(
            "{} returned {} of {} vertices",
            algorithm,
            output.len(),
            vertex_count
        )));
    }
    Ok(())
}

impl Default for Strategy {
    fn default() -> Self {
        Self::new(ExecutionConfig::default())
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("config", &self.config)
            .field("accelerator", &self.accelerator)
            .field("dispatcher", &self.dispatcher.name())
            .finish()
    }
}
