use std::sync::Arc;

use thiserror::Error;

use super::pool::{PoolReader, PoolWriter};

/// Stream-wide id of a shared object or interned string.
pub type ObjectId = u32;

/// Errors raised while writing or reading a persisted graph.
///
/// A load that fails never hands out any part of the graph it was building.
#[derive(Debug, Error)]
pub enum PersistError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("malformed record: {0}")]
  Encoding(#[from] bincode::Error),

  #[error("malformed property map: {0}")]
  Json(#[from] serde_json::Error),

  #[error("not a build graph file")]
  InvalidMagic,

  #[error("unsupported build graph version: {0}")]
  UnsupportedVersion(u32),

  #[error("unknown object id {0}")]
  UnknownObject(ObjectId),

  #[error("unknown string id {0}")]
  UnknownString(ObjectId),

  #[error("object {id} is not a {expected}")]
  TypeMismatch { id: ObjectId, expected: &'static str },

  #[error("object {0} refers to itself while it is being loaded")]
  Recursive(ObjectId),
}

pub type Result<T> = std::result::Result<T, PersistError>;

/// A node of the resolved graph that knows how to write and read its fields.
///
/// Field order is part of the stream format: `load` must read exactly what
/// `store` wrote, in the same order.
pub trait Persistent: Send + Sync + Sized + 'static {
  fn store(&self, pool: &mut PoolWriter) -> Result<()>;

  fn load(pool: &mut PoolReader<'_>) -> Result<Self>;

  /// Runs once the loaded node is behind its shared handle, before any other
  /// node can see it.
  fn on_loaded(_this: &Arc<Self>) {}
}
