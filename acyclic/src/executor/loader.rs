//! Compiled kernel loading and caching.
//!
//! A [`KernelLoader`] produces the compiled kernel; an [`Accelerator`] runs the
//! loader at most once and remembers the outcome, success or failure, for as
//! long as the accelerator lives. A failed load is never retried.
//!
//! # Example
//!
//! ```
//! use acyclic::executor::{Accelerator, CsrKernelLoader};
//! use acyclic::kernel::KernelKind;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let accelerator = Accelerator::new(Arc::new(CsrKernelLoader));
//! let kernel = accelerator.kernel().await?;
//! assert_eq!(kernel.kind(), KernelKind::Compiled);
//! # Ok(())
//! # }
//! ```

use super::error::{ExecutionError, Result};
use crate::kernel::{CsrKernel, Kernel};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Source of the compiled kernel.
///
/// Loading may be expensive (reading or instantiating a module), so callers
/// go through an [`Accelerator`] rather than calling `load` per call.
#[async_trait]
pub trait KernelLoader: Send + Sync {
    /// Loads the kernel.
    async fn load(&self) -> Result<Arc<dyn Kernel>>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "kernel-loader"
    }
}

/// Loads the in-binary [`CsrKernel`]. Always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrKernelLoader;

#[async_trait]
impl KernelLoader for CsrKernelLoader {
    async fn load(&self) -> Result<Arc<dyn Kernel>> {
        Ok(Arc::new(CsrKernel))
    }

    fn name(&self) -> &str {
        "csr"
    }
}

/// Caches the kernel produced by a [`KernelLoader`].
pub struct Accelerator {
    loader: Arc<dyn KernelLoader>,
    kernel: OnceCell<std::result::Result<Arc<dyn Kernel>, String>>,
}

impl Accelerator {
    pub fn new(loader: Arc<dyn KernelLoader>) -> Self {
        Self {
            loader,
            kernel: OnceCell::new(),
        }
    }

    /// Returns the compiled kernel, loading it on first use.
    ///
    /// Concurrent first callers wait on a single load. Later callers get the
    /// cached outcome, including a cached [`ExecutionError::KernelLoad`].
    pub async fn kernel(&self) -> Result<Arc<dyn Kernel>> {
        let outcome = self
            .kernel
            .get_or_init(|| async {
                match self.loader.load().await {
                    Ok(kernel) => {
                        info!(
                            loader = self.loader.name(),
                            kind = %kernel.kind(),
                            "Compiled kernel loaded"
                        );
                        Ok(kernel)
                    }
                    Err(e) => {
                        warn!(
                            loader = self.loader.name(),
                            error = %e,
                            "Compiled kernel failed to load, it will not be retried"
                        );
                        Err(e.to_string())
                    }
                }
            })
            .await;

        match outcome {
            Ok(kernel) => Ok(Arc::clone(kernel)),
            Err(message) => Err(ExecutionError::KernelLoad(message.clone())),
        }
    }

    /// Whether a load has been attempted, successful or not.
    pub fn is_loaded(&self) -> bool {
        self.kernel.initialized()
    }
}

impl fmt::Debug for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.kernel.get() {
            None => "unloaded",
            Some(Ok(_)) => "loaded",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("Accelerator")
            .field("loader", &self.loader.name())
            .field("state", &state)
            .finish()
    }
}

lazy_static::lazy_static! {
    static ref DEFAULT_ACCELERATOR: Arc<Accelerator> =
        Arc::new(Accelerator::new(Arc::new(CsrKernelLoader)));
}

/// The process-wide accelerator backed by [`CsrKernelLoader`].
pub fn default_accelerator() -> Arc<Accelerator> {
    Arc::clone(&DEFAULT_ACCELERATOR)
}
