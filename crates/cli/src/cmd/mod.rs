mod env;
mod info;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use buildgraph_lib::model::ResolvedProject;
use buildgraph_lib::persist::read_project;

pub use env::cmd_env;
pub use info::cmd_info;

fn open_graph(path: &Path) -> Result<Arc<ResolvedProject>> {
  read_project(path).with_context(|| format!("Failed to read build graph {}", path.display()))
}
