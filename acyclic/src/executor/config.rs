// =============================================================================
// EXECUTION POLICY
// =============================================================================
//
// Two independent dimensions decide how a kernel call runs:
//
// 1. KERNEL: interpreted (nested vectors) or compiled (packed u32 arrays)
// 2. CONTEXT: in-process on the caller's task, or on a background worker
//
// Each dimension is a `Mode`. `Auto` compares the graph's vertex count against
// a threshold, `Always` and `Never` pin the choice. Per-call `CallOptions`
// override the configured mode for a single call.
//
// When the chosen path is unavailable, `allow_fallback` decides whether the
// call degrades to the next cheaper path (compiled -> interpreted,
// worker -> in-process) or fails with a typed error.
// =============================================================================

use crate::kernel::KernelKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How one policy dimension is decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Enabled when the vertex count reaches the dimension's threshold.
    #[default]
    Auto,
    /// Always enabled.
    Always,
    /// Never enabled.
    Never,
}

impl Mode {
    fn resolve(self, vertex_count: usize, threshold: usize) -> bool {
        match self {
            Mode::Auto => vertex_count >= threshold,
            Mode::Always => true,
            Mode::Never => false,
        }
    }
}

/// Configuration for choosing a kernel and an execution context.
///
/// # Example
///
/// ```
/// use acyclic::executor::{ExecutionConfig, Mode};
///
/// let config = ExecutionConfig::AUTO
///     .with_worker(Mode::Never)
///     .with_acceleration_threshold(100);
/// assert_eq!(config.acceleration_threshold, 100);
/// assert!(config.allow_fallback);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Whether to run the compiled kernel.
    ///
    /// Default: `Auto`
    pub acceleration: Mode,

    /// Vertex count at which `Auto` switches to the compiled kernel.
    ///
    /// Default: 20
    pub acceleration_threshold: usize,

    /// Whether to dispatch calls to a background worker.
    ///
    /// Default: `Auto`
    pub worker: Mode,

    /// Vertex count at which `Auto` switches to a background worker.
    ///
    /// Default: 25
    pub worker_threshold: usize,

    /// Degrade to a cheaper path instead of failing when the chosen path is
    /// unavailable.
    ///
    /// Default: true
    pub allow_fallback: bool,
}

impl ExecutionConfig {
    pub const DEFAULT_ACCELERATION_THRESHOLD: usize = 20;
    pub const DEFAULT_WORKER_THRESHOLD: usize = 25;

    /// Threshold-driven selection with fallback, the default.
    pub const AUTO: Self = Self {
        acceleration: Mode::Auto,
        acceleration_threshold: Self::DEFAULT_ACCELERATION_THRESHOLD,
        worker: Mode::Auto,
        worker_threshold: Self::DEFAULT_WORKER_THRESHOLD,
        allow_fallback: true,
    };

    /// Interpreted kernel on the caller's task, regardless of graph size.
    pub const IN_PROCESS: Self = Self {
        acceleration: Mode::Never,
        acceleration_threshold: Self::DEFAULT_ACCELERATION_THRESHOLD,
        worker: Mode::Never,
        worker_threshold: Self::DEFAULT_WORKER_THRESHOLD,
        allow_fallback: true,
    };

    /// Sets how the compiled kernel is chosen.
    pub fn with_acceleration(mut self, mode: Mode) -> Self {
        self.acceleration = mode;
        self
    }

    /// Sets the vertex count at which `Auto` picks the compiled kernel.
    pub fn with_acceleration_threshold(mut self, threshold: usize) -> Self {
        self.acceleration_threshold = threshold;
        self
    }

    /// Sets how a background worker is chosen.
    pub fn with_worker(mut self, mode: Mode) -> Self {
        self.worker = mode;
        self
    }

    /// Sets the vertex count at which `Auto` picks a background worker.
    pub fn with_worker_threshold(mut self, threshold: usize) -> Self {
        self.worker_threshold = threshold;
        self
    }

    /// Allows or forbids degrading to a cheaper path.
    pub fn with_fallback(mut self, allow_fallback: bool) -> Self {
        self.allow_fallback = allow_fallback;
        self
    }

    /// Resolves the plan requested for a graph of `vertex_count` vertices.
    ///
    /// Per-call overrides in `options` take precedence over the configured
    /// modes.
    pub fn plan(&self, vertex_count: usize, options: &CallOptions) -> Plan {
        let accelerate = options.accelerate.unwrap_or_else(|| {
            self.acceleration
                .resolve(vertex_count, self.acceleration_threshold)
        });
        let offload = options
            .offload
            .unwrap_or_else(|| self.worker.resolve(vertex_count, self.worker_threshold));

        Plan {
            kernel: if accelerate {
                KernelKind::Compiled
            } else {
                KernelKind::Interpreted
            },
            context: if offload {
                Context::Worker
            } else {
                Context::InProcess
            },
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self::AUTO
    }
}

/// Per-call overrides for one sort or verification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// `Some(true)` forces the compiled kernel, `Some(false)` forbids it.
    pub accelerate: Option<bool>,
    /// `Some(true)` forces a background worker, `Some(false)` forbids it.
    pub offload: Option<bool>,
    /// Sort without verifying acyclicity first.
    ///
    /// The caller vouches for the graph being acyclic; on cyclic input the
    /// order is a permutation but does not respect every edge, and it is not
    /// cached unless the graph was already verified acyclic.
    pub skip_verification: bool,
}

impl CallOptions {
    /// Forces (`true`) or forbids (`false`) the compiled kernel.
    pub fn accelerate(mut self, accelerate: bool) -> Self {
        self.accelerate = Some(accelerate);
        self
    }

    /// Forces (`true`) or forbids (`false`) a background worker.
    pub fn offload(mut self, offload: bool) -> Self {
        self.offload = Some(offload);
        self
    }

    /// Sorts without verifying acyclicity first.
    pub fn skip_verification(mut self) -> Self {
        self.skip_verification = true;
        self
    }
}

/// Where a kernel call runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Context {
    InProcess,
    Worker,
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::InProcess => write!(f, "in-process"),
            Context::Worker => write!(f, "worker"),
        }
    }
}

/// A resolved choice of kernel and context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plan {
    pub kernel: KernelKind,
    pub context: Context,
}

impl Plan {
    pub const INTERPRETED_IN_PROCESS: Self = Self {
        kernel: KernelKind::Interpreted,
        context: Context::InProcess,
    };
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kernel, {}", self.kernel, self.context)
    }
}
