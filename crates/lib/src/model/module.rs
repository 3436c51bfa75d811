use super::ScriptImport;
use crate::persist::{PoolReader, PoolWriter, Persistent, Result};

/// A module as seen by one product: its dependencies and environment setup.
///
/// Dependencies are module names, resolved against the product's module list
/// when needed. A module with an empty name only aggregates its dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedModule {
  pub name: String,
  pub module_dependencies: Vec<String>,
  pub imports: Vec<ScriptImport>,
  pub setup_build_environment_script: String,
  pub setup_run_environment_script: String,
}

impl ResolvedModule {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.module_dependencies = dependencies.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_imports(mut self, imports: Vec<ScriptImport>) -> Self {
    self.imports = imports;
    self
  }

  pub fn with_build_script(mut self, script: impl Into<String>) -> Self {
    self.setup_build_environment_script = script.into();
    self
  }

  pub fn with_run_script(mut self, script: impl Into<String>) -> Self {
    self.setup_run_environment_script = script.into();
    self
  }
}

impl Persistent for ResolvedModule {
  fn store(&self, pool: &mut PoolWriter) -> Result<()> {
    pool.store_string(&self.name)?;
    pool.store_string_list(&self.module_dependencies)?;
    pool.store_string(&self.setup_build_environment_script)?;
    pool.store_string(&self.setup_run_environment_script)?;
    pool.write(&self.imports)
  }

  fn load(pool: &mut PoolReader<'_>) -> Result<Self> {
    Ok(Self {
      name: pool.load_string()?,
      module_dependencies: pool.load_string_list()?,
      setup_build_environment_script: pool.load_string()?,
      setup_run_environment_script: pool.load_string()?,
      imports: pool.read()?,
    })
  }
}
