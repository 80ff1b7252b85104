//! Execution strategy for kernel calls
//!
//! This module decides, for each sort or verification, which kernel runs the
//! call and where it runs:
//!
//! - Interpreted or compiled kernel, compiled loaded once per [`Accelerator`]
//! - On the caller's task or on a background worker via a [`WorkerDispatcher`]
//!
//! # Design Principles
//!
//! Following Parnas's information hiding principles:
//! - Platform capabilities (is there a runtime, did the compiled kernel load)
//!   are hidden behind the [`KernelLoader`] and [`WorkerDispatcher`] traits
//! - The graph store sees only [`Strategy::run`] and the resulting
//!   [`CallReport`]
//!
//! # Example
//!
//! ```
//! use acyclic::executor::{AdjacencySnapshot, Algorithm, CallOptions, ExecutionConfig, Strategy};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let strategy = Strategy::new(ExecutionConfig::IN_PROCESS);
//! let snapshot = AdjacencySnapshot {
//!     out_edges: vec![vec![1], vec![]],
//!     in_edges: vec![vec![], vec![0]],
//! };
//! let outcome = strategy
//!     .run(Algorithm::TopologicalSort, snapshot, &CallOptions::default())
//!     .await;
//! assert_eq!(outcome.result?, vec![0, 1]);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod loader;
mod strategy;
mod worker;

pub use config::{CallOptions, Context, ExecutionConfig, Mode, Plan};
pub use error::{ExecutionError, Result};
pub use loader::{default_accelerator, Accelerator, CsrKernelLoader, KernelLoader};
pub use strategy::{CallOutcome, CallReport, CallState, Fallback, Strategy};
pub use worker::{
    AdjacencySnapshot, Algorithm, BlockingPoolDispatcher, InlineDispatcher, KernelJob,
    ThreadDispatcher, WorkerDispatcher,
};
