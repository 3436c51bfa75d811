//! Artifacts and file taggers.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{CodeLocation, Configuration};
use crate::persist::{PoolReader, PoolWriter, Persistent, Result};
use crate::util::glob_matches;

/// Assigns file tags to every file whose name matches a wildcard pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTagger {
  pattern: String,
  file_tags: Vec<String>,
}

impl FileTagger {
  pub fn new(pattern: impl Into<String>, file_tags: Vec<String>) -> Self {
    Self {
      pattern: pattern.into(),
      file_tags,
    }
  }

  pub fn pattern(&self) -> &str {
    &self.pattern
  }

  pub fn file_tags(&self) -> &[String] {
    &self.file_tags
  }

  pub fn matches(&self, file_name: &str) -> bool {
    glob_matches(&self.pattern, file_name, true)
  }
}

impl Persistent for FileTagger {
  fn store(&self, pool: &mut PoolWriter) -> Result<()> {
    pool.store_string(&self.pattern)?;
    pool.store_string_list(&self.file_tags)
  }

  fn load(pool: &mut PoolReader<'_>) -> Result<Self> {
    Ok(Self {
      pattern: pool.load_string()?,
      file_tags: pool.load_string_list()?,
    })
  }
}

/// One concrete input file of a product.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceArtifact {
  pub absolute_file_path: String,
  pub file_tags: BTreeSet<String>,
  pub override_file_tags: bool,
  pub configuration: Arc<Configuration>,
}

impl SourceArtifact {
  pub fn new(absolute_file_path: impl Into<String>, configuration: Arc<Configuration>) -> Self {
    Self {
      absolute_file_path: absolute_file_path.into(),
      file_tags: BTreeSet::new(),
      override_file_tags: true,
      configuration,
    }
  }

  pub fn with_file_tags<I, S>(mut self, tags: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.file_tags = tags.into_iter().map(Into::into).collect();
    self
  }
}

impl Persistent for SourceArtifact {
  fn store(&self, pool: &mut PoolWriter) -> Result<()> {
    pool.write(&self.absolute_file_path)?;
    pool.write(&self.file_tags)?;
    pool.write(&self.override_file_tags)?;
    pool.store(&self.configuration)
  }

  fn load(pool: &mut PoolReader<'_>) -> Result<Self> {
    Ok(Self {
      absolute_file_path: pool.read()?,
      file_tags: pool.read()?,
      override_file_tags: pool.read()?,
      configuration: pool.load()?,
    })
  }
}

/// How one property of a generated artifact is computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
  /// Dotted property path, one element per segment.
  pub name: Vec<String>,
  pub code: String,
  pub location: CodeLocation,
}

/// An output a rule produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleArtifact {
  /// Script expression evaluating to the output file path.
  pub file_script: String,
  pub file_tags: Vec<String>,
  pub bindings: Vec<Binding>,
}

impl Persistent for RuleArtifact {
  fn store(&self, pool: &mut PoolWriter) -> Result<()> {
    pool.write(&self.file_script)?;
    pool.write(&self.file_tags)?;
    pool.write(&(self.bindings.len() as u32))?;
    // Bindings go out last-to-first; load restores the original order.
    for binding in self.bindings.iter().rev() {
      pool.write(binding)?;
    }
    Ok(())
  }

  fn load(pool: &mut PoolReader<'_>) -> Result<Self> {
    let file_script = pool.read()?;
    let file_tags = pool.read()?;
    let count: u32 = pool.read()?;
    let mut bindings = Vec::new();
    for _ in 0..count {
      bindings.push(pool.read::<Binding>()?);
    }
    bindings.reverse();

    Ok(Self {
      file_script,
      file_tags,
      bindings,
    })
  }
}
