use std::collections::BTreeSet;

use crate::persist::{PoolReader, PoolWriter, Persistent, Result};
use crate::util::glob_matches;

/// A file selection: wildcard patterns and explicit files under a prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
  pub prefix: String,
  pub patterns: Vec<String>,
  pub exclude_patterns: Vec<String>,
  pub files: BTreeSet<String>,
  /// Whether wildcards may descend into subdirectories.
  pub recursive: bool,
}

impl Group {
  /// Whether `file_path` is selected by this group.
  ///
  /// Explicit files are always selected; otherwise the path must match an
  /// include pattern and no exclude pattern, each prefixed with `prefix`.
  pub fn matches(&self, file_path: &str) -> bool {
    if self.files.contains(file_path) {
      return true;
    }

    let matches_any = |patterns: &[String]| {
      patterns
        .iter()
        .any(|pattern| glob_matches(&format!("{}{}", self.prefix, pattern), file_path, self.recursive))
    };
    matches_any(&self.patterns) && !matches_any(&self.exclude_patterns)
  }
}

impl Persistent for Group {
  fn store(&self, pool: &mut PoolWriter) -> Result<()> {
    pool.store_string(&self.prefix)?;
    pool.store_string_list(&self.patterns)?;
    pool.store_string_list(&self.exclude_patterns)?;
    pool.store_string_set(&self.files)?;
    pool.write(&self.recursive)
  }

  fn load(pool: &mut PoolReader<'_>) -> Result<Self> {
    Ok(Self {
      prefix: pool.load_string()?,
      patterns: pool.load_string_list()?,
      exclude_patterns: pool.load_string_list()?,
      files: pool.load_string_set()?,
      recursive: pool.read()?,
    })
  }
}
