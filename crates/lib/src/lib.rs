//! buildgraph-lib: the resolved build model
//!
//! This crate holds the fully resolved form of a project and the machinery
//! built around it:
//! - `model`: projects, products, modules, rules, artifacts and groups
//! - `persist`: the object pool that stores and reloads a resolved project
//! - `modules`: dependency ordering of a product's modules
//! - `environment`: build and run environments computed by module scripts
//! - `script`: the sandboxed Lua engine those scripts run in

pub mod consts;
pub mod environment;
pub mod model;
pub mod modules;
pub mod persist;
pub mod script;
pub mod util;
