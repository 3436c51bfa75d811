//! Property maps attached to products, projects and source artifacts.

use serde_json::{Map, Value};

use crate::consts::MODULES_PROPERTY;
use crate::persist::{PoolReader, PoolWriter, Persistent, Result};

/// An evaluated property map.
///
/// Values are arbitrary JSON-shaped data. Per-module properties live under
/// the `modules` key, one nested map per module name.
///
/// Script engines keep their converted copy of a configuration in their own
/// side table (see [`crate::script::ScriptEngine::configuration_value`]), so a
/// configuration itself carries nothing but its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
  value: Map<String, Value>,
}

impl Configuration {
  pub fn new(value: Map<String, Value>) -> Self {
    Self { value }
  }

  /// The map most recently given to [`Configuration::set_value`].
  pub fn value(&self) -> &Map<String, Value> {
    &self.value
  }

  pub fn set_value(&mut self, value: Map<String, Value>) {
    self.value = value;
  }

  /// The properties of one module, or an empty map when the module has none.
  pub fn module_properties(&self, module: &str) -> Map<String, Value> {
    self
      .value
      .get(MODULES_PROPERTY)
      .and_then(|modules| modules.get(module))
      .and_then(Value::as_object)
      .cloned()
      .unwrap_or_default()
  }
}

impl Persistent for Configuration {
  fn store(&self, pool: &mut PoolWriter) -> Result<()> {
    pool.write_json(&self.value)
  }

  fn load(pool: &mut PoolReader<'_>) -> Result<Self> {
    Ok(Self {
      value: pool.read_json()?,
    })
  }
}
