//! Build graph files.
//!
//! A build graph file is a four byte magic, the format version and the
//! pooled project record:
//!
//! ```text
//! magic "BGRF" | version | project (object id, fields, products, ...)
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::debug;

use super::pool::{PoolReader, PoolWriter};
use super::types::{PersistError, Result};
use crate::model::ResolvedProject;

pub const BUILD_GRAPH_MAGIC: [u8; 4] = *b"BGRF";

/// Bumped whenever any entity's field order changes.
pub const BUILD_GRAPH_VERSION: u32 = 1;

/// Encode a project and everything reachable from it.
pub fn store_project(project: &Arc<ResolvedProject>) -> Result<Vec<u8>> {
  let mut pool = PoolWriter::new();
  pool.write(&BUILD_GRAPH_MAGIC)?;
  pool.write(&BUILD_GRAPH_VERSION)?;
  pool.store(project)?;
  Ok(pool.into_bytes())
}

/// Decode a project written by [`store_project`].
///
/// The returned project's products already point back at it.
pub fn load_project(bytes: &[u8]) -> Result<Arc<ResolvedProject>> {
  let mut pool = PoolReader::new(bytes);
  let magic: [u8; 4] = pool.read().map_err(|_| PersistError::InvalidMagic)?;
  if magic != BUILD_GRAPH_MAGIC {
    return Err(PersistError::InvalidMagic);
  }

  let version: u32 = pool.read()?;
  if version != BUILD_GRAPH_VERSION {
    return Err(PersistError::UnsupportedVersion(version));
  }

  pool.load()
}

/// Write a project to `path`.
///
/// The file is written next to its destination and renamed into place, so
/// readers never observe a partially written graph.
pub fn save_project(path: &Path, project: &Arc<ResolvedProject>) -> Result<()> {
  let bytes = store_project(project)?;

  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  fs::create_dir_all(dir)?;

  let mut file = NamedTempFile::new_in(dir)?;
  file.write_all(&bytes)?;
  file.persist(path).map_err(|e| e.error)?;

  debug!(path = %path.display(), bytes = bytes.len(), "saved build graph");
  Ok(())
}

/// Read a project written by [`save_project`].
pub fn read_project(path: &Path) -> Result<Arc<ResolvedProject>> {
  let bytes = fs::read(path)?;
  load_project(&bytes)
}
