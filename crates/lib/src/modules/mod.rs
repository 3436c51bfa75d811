//! Dependency ordering of a product's modules.
//!
//! Modules name their dependencies; [`ModuleGraph`] resolves those names
//! against the product's module list and produces the dependency-first order
//! in which environment setup scripts run.

mod graph;

pub use graph::*;
