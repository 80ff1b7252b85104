//! Graph store for caller-supplied vertex values
//!
//! This module provides [`Dag`], a directed graph that:
//!
//! - Validates every edge at insertion (range, self-loop, duplicate)
//! - Keeps out-edges and in-edges symmetric through every mutation
//! - Verifies acyclicity and sorts topologically on demand, caching both
//!
//! # Design Principles
//!
//! Following Parnas's information hiding principles:
//! - This module hides the index-based representation behind value-level
//!   results: sorts and cycles come back as vertex values
//! - Where and how the kernel runs is left to the
//!   [`executor`](crate::executor) module
//!
//! Acyclicity is not a standing invariant. A graph may hold a cycle between
//! mutations unless `verify_on_add_edge` is set; it is reported when the
//! caller asks.

mod builder;
mod config;
mod dag;
mod error;

pub use builder::DagBuilder;
pub use config::{DagConfig, DuplicateVertexPolicy, Edges, VertexRemoval};
pub use dag::{Dag, VertexEq};
pub use error::{EdgeFault, GraphError, GraphResult};
