use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a piece of script code was written in a project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeLocation {
  pub file_path: String,
  pub line: u32,
  pub column: u32,
}

impl CodeLocation {
  pub fn new(file_path: impl Into<String>, line: u32, column: u32) -> Self {
    Self {
      file_path: file_path.into(),
      line,
      column,
    }
  }
}

impl fmt::Display for CodeLocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.file_path, self.line, self.column)
  }
}

/// A named script import.
///
/// Every file in `file_paths` is evaluated into one table, which is then bound
/// under `scope_name` in the importing scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptImport {
  pub scope_name: String,
  pub file_paths: Vec<String>,
  pub location: CodeLocation,
}

impl ScriptImport {
  pub fn new(scope_name: impl Into<String>, file_paths: Vec<String>) -> Self {
    Self {
      scope_name: scope_name.into(),
      file_paths,
      location: CodeLocation::default(),
    }
  }
}
