use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::model::ResolvedModule;
use crate::modules::ModuleGraphError;

/// Variable name to value.
pub type Environment = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentKind {
  Build,
  Run,
}

impl EnvironmentKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      EnvironmentKind::Build => "build",
      EnvironmentKind::Run => "run",
    }
  }

  /// The script `module` contributes to this kind of environment.
  ///
  /// Run environments fall back to the build script when a module has no
  /// run script. `None` means the module is skipped.
  pub fn setup_script<'a>(&self, module: &'a ResolvedModule) -> Option<&'a str> {
    let script = match self {
      EnvironmentKind::Build => &module.setup_build_environment_script,
      EnvironmentKind::Run if module.setup_run_environment_script.is_empty() => {
        &module.setup_build_environment_script
      }
      EnvironmentKind::Run => &module.setup_run_environment_script,
    };
    (!script.is_empty()).then_some(script.as_str())
  }

  /// Chunk name given to a module's setup script, as shown in script errors.
  pub(crate) fn chunk_name(&self, module: &ResolvedModule) -> String {
    match self {
      EnvironmentKind::Build => format!("={}.setupBuildEnvironment", module.name),
      EnvironmentKind::Run => format!("={}.setupRunEnvironment", module.name),
    }
  }
}

impl fmt::Display for EnvironmentKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Error)]
pub enum EnvironmentError {
  #[error("Error while setting up {kind} environment: {message}")]
  Setup { kind: EnvironmentKind, message: String },

  #[error("cannot order modules for the {kind} environment")]
  ModuleOrder {
    kind: EnvironmentKind,
    #[source]
    source: ModuleGraphError,
  },

  #[error("product '{product}' is not attached to a project")]
  Detached { product: String },
}

impl EnvironmentError {
  pub fn kind(&self) -> Option<EnvironmentKind> {
    match self {
      EnvironmentError::Setup { kind, .. } | EnvironmentError::ModuleOrder { kind, .. } => Some(*kind),
      EnvironmentError::Detached { .. } => None,
    }
  }
}
