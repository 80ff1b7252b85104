use thiserror::Error;

/// Execution layer error type for kernel calls.
///
/// Covers the ways a call can fail outside the kernel algorithms themselves:
/// a requested execution path is unavailable and fallback was disallowed, the
/// chosen path broke down in transport, or a kernel returned malformed output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExecutionError {
    /// The compiled kernel was requested but cannot be used, and fallback to
    /// the interpreted kernel is disallowed.
    #[error("compiled kernel unavailable: {0}")]
    UnsupportedAcceleration(String),

    /// Worker execution was requested but no worker can be used, and fallback
    /// to in-process execution is disallowed.
    #[error("worker execution unavailable: {0}")]
    UnsupportedConcurrency(String),

    /// A kernel loader failed to produce a kernel.
    #[error("kernel failed to load: {0}")]
    KernelLoad(String),

    /// A worker could not be started or exited without replying.
    #[error("worker failed: {0}")]
    WorkerFailed(String),

    /// A worker panicked while running a kernel.
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),

    /// A kernel or dispatcher returned indices that do not describe the
    /// graph it was given.
    #[error("kernel returned invalid output: {0}")]
    InvalidOutput(String),
}

impl ExecutionError {
    /// Returns true if the same call may succeed through another execution path.
    ///
    /// - Transport failures (`KernelLoad`, `WorkerFailed`) are recoverable by
    ///   falling back to a cheaper path.
    /// - Unsupported paths are a property of the platform and will not change.
    /// - A panic or malformed output from a kernel is a defect and is not
    ///   recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ExecutionError::KernelLoad(_) => true,
            ExecutionError::WorkerFailed(_) => true,

            ExecutionError::UnsupportedAcceleration(_) => false,
            ExecutionError::UnsupportedConcurrency(_) => false,
            ExecutionError::WorkerPanicked(_) => false,
            ExecutionError::InvalidOutput(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Formats a panic payload caught from a worker.
pub(super) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
