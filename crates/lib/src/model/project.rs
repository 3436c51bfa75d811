use std::sync::Arc;

use serde_json::{Map, Value};

use super::{Configuration, ResolvedProduct};
use crate::persist::{PoolReader, PoolWriter, Persistent, Result};

/// The root of a resolved graph. Owns its products.
#[derive(Debug, Default, PartialEq)]
pub struct ResolvedProject {
  pub id: String,
  /// Project file the project was resolved from.
  pub project_file: String,
  /// Environment variables the target platform requires, applied on top of
  /// the system environment for every product.
  pub platform_environment: Map<String, Value>,
  pub products: Vec<Arc<ResolvedProduct>>,
  pub configuration: Arc<Configuration>,
}

impl ResolvedProject {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      ..Self::default()
    }
  }

  /// Put the project behind a shared handle and point every product back at
  /// it.
  pub fn into_shared(self) -> Arc<Self> {
    let project = Arc::new(self);
    Self::attach_products(&project);
    project
  }

  fn attach_products(this: &Arc<Self>) {
    for product in &this.products {
      product.attach_project(this);
    }
  }

  pub fn product(&self, name: &str) -> Option<&Arc<ResolvedProduct>> {
    self.products.iter().find(|product| product.name == name)
  }

  /// The platform environment as variable/value text pairs.
  ///
  /// String values are used as they are; anything else is rendered as JSON.
  pub fn platform_variables(&self) -> impl Iterator<Item = (String, String)> + '_ {
    self.platform_environment.iter().map(|(name, value)| {
      let text = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
      };
      (name.clone(), text)
    })
  }
}

impl Persistent for ResolvedProject {
  fn store(&self, pool: &mut PoolWriter) -> Result<()> {
    pool.write(&self.id)?;
    pool.write(&self.project_file)?;
    pool.write_json(&self.platform_environment)?;
    pool.store_all(&self.products)?;
    pool.store(&self.configuration)
  }

  fn load(pool: &mut PoolReader<'_>) -> Result<Self> {
    Ok(Self {
      id: pool.read()?,
      project_file: pool.read()?,
      platform_environment: pool.read_json()?,
      products: pool.load_all()?,
      configuration: pool.load()?,
    })
  }

  fn on_loaded(this: &Arc<Self>) {
    Self::attach_products(this);
  }
}
