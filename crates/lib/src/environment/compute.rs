use std::cell::RefCell;
use std::sync::Arc;

use mlua::prelude::*;
use tracing::{debug, trace};

use super::{Environment, EnvironmentError, EnvironmentKind};
use crate::consts::MODULES_PROPERTY;
use crate::model::{Configuration, ResolvedModule, ResolvedProject};
use crate::modules::ModuleGraph;
use crate::script::{ScriptEngine, builtins};

/// Compute one environment of a product.
///
/// The environment starts as `system_environment` with the project's
/// platform environment laid over it. Every module then runs its setup
/// script, dependencies first, in a scope of its own holding:
///
/// - `getenv` and `putenv`, bound to the environment being built;
/// - the module's imports;
/// - one table per direct dependency with that dependency's properties;
/// - the module's own properties as plain variables.
///
/// A failing script fails the whole computation; no partial environment is
/// returned.
pub fn compute_environment(
  engine: &ScriptEngine,
  kind: EnvironmentKind,
  modules: &[Arc<ResolvedModule>],
  configuration: &Arc<Configuration>,
  project: &ResolvedProject,
  system_environment: &Environment,
) -> Result<Environment, EnvironmentError> {
  let mut seed = system_environment.clone();
  seed.extend(project.platform_variables());

  let graph = ModuleGraph::new(modules);
  let order = graph
    .topological_order(0..graph.len())
    .map_err(|source| EnvironmentError::ModuleOrder { kind, source })?;

  let environment = RefCell::new(seed);
  let lua = engine.lua();

  lua
    .scope(|scope| {
      let properties = module_properties(engine, configuration)?;

      for index in order {
        let module = graph.module(index);
        let Some(script) = kind.setup_script(module) else {
          trace!(module = %module.name, %kind, "no setup script");
          continue;
        };
        debug!(module = %module.name, %kind, "running environment setup script");

        let module_scope = engine.new_scope()?;
        builtins::register(scope, &module_scope, &environment)?;
        engine.import(&module.imports, &module_scope)?;

        for &child in graph.children(index) {
          let dependency = graph.module(child);
          if dependency.name.is_empty() {
            continue;
          }
          let snapshot = match property_table(properties.as_ref(), &dependency.name)? {
            Some(table) => deep_copy(lua, &table)?,
            None => lua.create_table()?,
          };
          module_scope.set(dependency.name.as_str(), snapshot)?;
        }

        if let Some(own) = property_table(properties.as_ref(), &module.name)? {
          for pair in own.pairs::<LuaValue, LuaValue>() {
            let (key, value) = pair?;
            module_scope.set(key, copy_value(lua, value)?)?;
          }
        }

        engine.evaluate(script, &kind.chunk_name(module), module_scope)?;
      }
      Ok(())
    })
    .map_err(|e| EnvironmentError::Setup {
      kind,
      message: e.to_string(),
    })?;

  Ok(environment.into_inner())
}

/// The `modules` table of the converted configuration, if there is one.
fn module_properties(engine: &ScriptEngine, configuration: &Arc<Configuration>) -> LuaResult<Option<LuaTable>> {
  let value = engine.configuration_value(configuration)?;
  match value.get::<LuaValue>(MODULES_PROPERTY)? {
    LuaValue::Table(modules) => Ok(Some(modules)),
    _ => Ok(None),
  }
}

fn property_table(properties: Option<&LuaTable>, module: &str) -> LuaResult<Option<LuaTable>> {
  let Some(properties) = properties else {
    return Ok(None);
  };
  match properties.get::<LuaValue>(module)? {
    LuaValue::Table(table) => Ok(Some(table)),
    _ => Ok(None),
  }
}

/// Copy of `table` sharing no tables with it.
fn deep_copy(lua: &Lua, table: &LuaTable) -> LuaResult<LuaTable> {
  let copy = lua.create_table()?;
  for pair in table.pairs::<LuaValue, LuaValue>() {
    let (key, value) = pair?;
    copy.set(key, copy_value(lua, value)?)?;
  }
  if let Some(mt) = table.metatable() {
    copy.set_metatable(Some(mt))?;
  }
  Ok(copy)
}

fn copy_value(lua: &Lua, value: LuaValue) -> LuaResult<LuaValue> {
  match value {
    LuaValue::Table(table) => Ok(LuaValue::Table(deep_copy(lua, &table)?)),
    other => Ok(other),
  }
}
