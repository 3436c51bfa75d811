//! Resolved products.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, info};

use super::{Configuration, FileTagger, Group, ResolvedModule, ResolvedProject, Rule, SourceArtifact};
use crate::environment::{Environment, EnvironmentError, EnvironmentKind, compute_environment};
use crate::persist::{PoolReader, PoolWriter, Persistent, Result};
use crate::script::ScriptEngine;
use crate::util::{lock, unique_by_identity};

/// One buildable unit of a project, fully resolved.
///
/// The build and run environments are computed on demand, at most once per
/// product instance, and are never persisted. Neither is the link back to the
/// owning project, which the project restores when it is loaded or shared.
#[derive(Debug)]
pub struct ResolvedProduct {
  pub file_tags: Vec<String>,
  pub name: String,
  pub target_name: String,
  pub build_directory: String,
  pub source_directory: String,
  pub destination_directory: String,
  /// Project file the product was declared in.
  pub project_file: String,
  pub configuration: Arc<Configuration>,
  /// `sources`, `rules` and `uses` are sets by identity: an allocation listed
  /// twice is written once and loads once.
  pub sources: Vec<Arc<SourceArtifact>>,
  pub rules: Vec<Arc<Rule>>,
  /// Other products this one depends on.
  pub uses: Vec<Arc<ResolvedProduct>>,
  pub file_taggers: Vec<Arc<FileTagger>>,
  /// Modules in the order the resolver loaded them.
  pub modules: Vec<Arc<ResolvedModule>>,
  pub groups: Vec<Arc<Group>>,
  project: Mutex<Weak<ResolvedProject>>,
  build_environment: Mutex<Option<Environment>>,
  run_environment: Mutex<Option<Environment>>,
  executable_path_cache: Mutex<HashMap<String, String>>,
}

impl ResolvedProduct {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      file_tags: Vec::new(),
      name: name.into(),
      target_name: String::new(),
      build_directory: String::new(),
      source_directory: String::new(),
      destination_directory: String::new(),
      project_file: String::new(),
      configuration: Arc::new(Configuration::default()),
      sources: Vec::new(),
      rules: Vec::new(),
      uses: Vec::new(),
      file_taggers: Vec::new(),
      modules: Vec::new(),
      groups: Vec::new(),
      project: Mutex::new(Weak::new()),
      build_environment: Mutex::new(None),
      run_environment: Mutex::new(None),
      executable_path_cache: Mutex::new(HashMap::new()),
    }
  }

  /// The owning project, while it is alive.
  pub fn project(&self) -> Option<Arc<ResolvedProject>> {
    lock(&self.project).upgrade()
  }

  pub(crate) fn attach_project(&self, project: &Arc<ResolvedProject>) {
    *lock(&self.project) = Arc::downgrade(project);
  }

  /// Union of the tags of every file tagger matching `file_name`.
  pub fn file_tags_for_file_name(&self, file_name: &str) -> BTreeSet<String> {
    self
      .file_taggers
      .iter()
      .filter(|tagger| tagger.matches(file_name))
      .flat_map(|tagger| tagger.file_tags().iter().cloned())
      .collect()
  }

  pub fn build_environment(&self) -> Option<Environment> {
    lock(&self.build_environment).clone()
  }

  pub fn run_environment(&self) -> Option<Environment> {
    lock(&self.run_environment).clone()
  }

  /// Compute the build environment unless it has been computed already.
  pub fn setup_build_environment(
    &self,
    engine: &ScriptEngine,
    system_environment: &Environment,
  ) -> std::result::Result<(), EnvironmentError> {
    self.setup_environment(EnvironmentKind::Build, engine, system_environment)
  }

  /// Compute the run environment unless it has been computed already.
  pub fn setup_run_environment(
    &self,
    engine: &ScriptEngine,
    system_environment: &Environment,
  ) -> std::result::Result<(), EnvironmentError> {
    self.setup_environment(EnvironmentKind::Run, engine, system_environment)
  }

  fn setup_environment(
    &self,
    kind: EnvironmentKind,
    engine: &ScriptEngine,
    system_environment: &Environment,
  ) -> std::result::Result<(), EnvironmentError> {
    let cache = match kind {
      EnvironmentKind::Build => &self.build_environment,
      EnvironmentKind::Run => &self.run_environment,
    };

    // Held for the whole computation so concurrent callers wait for the
    // first result instead of computing their own.
    let mut cached = lock(cache);
    if cached.is_some() {
      debug!(product = %self.name, %kind, "environment already computed");
      return Ok(());
    }

    let project = self.project().ok_or_else(|| EnvironmentError::Detached {
      product: self.name.clone(),
    })?;
    let environment = compute_environment(
      engine,
      kind,
      &self.modules,
      &self.configuration,
      &project,
      system_environment,
    )?;

    info!(product = %self.name, %kind, variables = environment.len(), "environment ready");
    *cached = Some(environment);
    Ok(())
  }

  /// Locate `name` on the `PATH` of the build environment.
  ///
  /// Names that are already paths, and names not found on the `PATH`, are
  /// returned unchanged. Found paths are cached per product.
  pub fn resolve_executable(&self, name: &str) -> String {
    if Path::new(name).components().count() != 1 {
      return name.to_string();
    }
    if let Some(path) = lock(&self.executable_path_cache).get(name) {
      return path.clone();
    }

    let search_path = self
      .build_environment()
      .and_then(|environment| environment.get("PATH").cloned())
      .unwrap_or_default();
    let candidates = [name.to_string(), format!("{}{}", name, std::env::consts::EXE_SUFFIX)];
    let found = std::env::split_paths(&search_path)
      .flat_map(|dir| candidates.iter().map(move |candidate| dir.join(candidate)))
      .find(|candidate| candidate.is_file())
      .map(|path| path.to_string_lossy().into_owned());

    match found {
      Some(path) => {
        lock(&self.executable_path_cache).insert(name.to_string(), path.clone());
        path
      }
      None => name.to_string(),
    }
  }
}

impl PartialEq for ResolvedProduct {
  fn eq(&self, other: &Self) -> bool {
    self.file_tags == other.file_tags
      && self.name == other.name
      && self.target_name == other.target_name
      && self.build_directory == other.build_directory
      && self.source_directory == other.source_directory
      && self.destination_directory == other.destination_directory
      && self.project_file == other.project_file
      && self.configuration == other.configuration
      && self.sources == other.sources
      && self.rules == other.rules
      && self.uses == other.uses
      && self.file_taggers == other.file_taggers
      && self.modules == other.modules
      && self.groups == other.groups
  }
}

impl Persistent for ResolvedProduct {
  fn store(&self, pool: &mut PoolWriter) -> Result<()> {
    pool.write(&self.file_tags)?;
    pool.write(&self.name)?;
    pool.write(&self.target_name)?;
    pool.write(&self.build_directory)?;
    pool.write(&self.source_directory)?;
    pool.write(&self.destination_directory)?;
    pool.write(&self.project_file)?;

    pool.store(&self.configuration)?;
    pool.store_all(&unique_by_identity(&self.sources))?;
    pool.store_all(&unique_by_identity(&self.rules))?;
    pool.store_all(&unique_by_identity(&self.uses))?;
    pool.store_all(&self.file_taggers)?;
    pool.store_all(&self.modules)?;
    pool.store_all(&self.groups)
  }

  fn load(pool: &mut PoolReader<'_>) -> Result<Self> {
    let mut product = ResolvedProduct::new(String::new());
    product.file_tags = pool.read()?;
    product.name = pool.read()?;
    product.target_name = pool.read()?;
    product.build_directory = pool.read()?;
    product.source_directory = pool.read()?;
    product.destination_directory = pool.read()?;
    product.project_file = pool.read()?;

    product.configuration = pool.load()?;
    product.sources = unique_by_identity(&pool.load_all()?);
    product.rules = unique_by_identity(&pool.load_all()?);
    product.uses = unique_by_identity(&pool.load_all()?);
    product.file_taggers = pool.load_all()?;
    product.modules = pool.load_all()?;
    product.groups = pool.load_all()?;
    Ok(product)
  }
}
