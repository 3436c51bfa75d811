//! Identity-preserving persistence of the resolved project graph.
//!
//! Every shared node is written once, tagged with a sequential object id;
//! later references to the same `Arc` allocation write only the id. Loading
//! reverses this and hands out the same `Arc` for every repeated id, so a
//! module referenced by many rules comes back as one shared instance.
//!
//! # Submodules
//!
//! - [`pool`] - The writer/reader pair that tracks object and string ids
//! - [`storage`] - Build graph files: header, versioning and atomic writes

pub mod pool;
pub mod storage;
mod types;

pub use pool::{PoolReader, PoolWriter};
pub use storage::{BUILD_GRAPH_MAGIC, BUILD_GRAPH_VERSION, load_project, read_project, save_project, store_project};
pub use types::*;
