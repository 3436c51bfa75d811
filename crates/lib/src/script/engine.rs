use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use mlua::prelude::*;
use tracing::debug;

use crate::model::{Configuration, ScriptImport};

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Base functions that reach around metatables or compile new code.
const REMOVED_GLOBALS: &[&str] = &[
  "collectgarbage",
  "dofile",
  "getmetatable",
  "load",
  "loadfile",
  "rawequal",
  "rawget",
  "rawlen",
  "rawset",
  "setmetatable",
];

/// Library tables replaced by read-only views.
const LIBRARY_TABLES: &[&str] = &["math", "string", "table", "utf8"];

/// Process-unique identity of a [`ScriptEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineId(u64);

impl fmt::Display for EngineId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "engine-{}", self.0)
  }
}

struct CachedConfiguration {
  configuration: Weak<Configuration>,
  value: LuaRegistryKey,
}

/// A sandboxed Lua state.
///
/// The Lua state is tied to the thread that created it; run one engine per
/// worker thread. Converted configurations are kept in a side table keyed by
/// the configuration's allocation, so every configuration is converted at
/// most once per engine while it is alive.
pub struct ScriptEngine {
  id: EngineId,
  lua: Lua,
  /// Read-only view of the globals every scope falls back to.
  globals: LuaTable,
  configuration_values: RefCell<HashMap<usize, CachedConfiguration>>,
  evaluations: Cell<usize>,
}

impl ScriptEngine {
  pub fn new() -> LuaResult<Self> {
    let libraries = LuaStdLib::TABLE | LuaStdLib::STRING | LuaStdLib::MATH | LuaStdLib::UTF8;
    let lua = Lua::new_with(libraries, LuaOptions::default())?;
    let globals = seal_globals(&lua)?;
    let id = EngineId(NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed));
    debug!(engine = %id, "created script engine");

    Ok(Self {
      id,
      lua,
      globals,
      configuration_values: RefCell::new(HashMap::new()),
      evaluations: Cell::new(0),
    })
  }

  pub fn id(&self) -> EngineId {
    self.id
  }

  pub fn lua(&self) -> &Lua {
    &self.lua
  }

  /// How many script bodies [`ScriptEngine::evaluate`] has run.
  pub fn evaluation_count(&self) -> usize {
    self.evaluations.get()
  }

  /// Create an isolated scope.
  ///
  /// Reads fall back to a read-only view of the engine's globals, which is
  /// also what `_G` names inside the scope; writes stay in the scope.
  pub fn new_scope(&self) -> LuaResult<LuaTable> {
    let scope = self.lua.create_table()?;
    scope.raw_set("_G", self.globals.clone())?;
    let mt = self.lua.create_table()?;
    mt.set("__index", self.globals.clone())?;
    mt.set("__metatable", false)?;
    scope.set_metatable(Some(mt))?;
    Ok(scope)
  }

  /// Evaluate every import's files into a fresh table and bind it in `scope`
  /// under the import's scope name.
  pub fn import(&self, imports: &[ScriptImport], scope: &LuaTable) -> LuaResult<()> {
    for import in imports {
      let object = self.new_scope()?;
      for path in &import.file_paths {
        let content = fs::read_to_string(path).map_err(|e| {
          LuaError::external(format!(
            "cannot read import '{}' ({}) at {}: {}",
            path, import.scope_name, import.location, e
          ))
        })?;
        self
          .lua
          .load(content.as_str())
          .set_name(format!("@{}", path))
          .set_environment(object.clone())
          .exec()?;
      }
      scope.set(import.scope_name.as_str(), object)?;
    }
    Ok(())
  }

  /// Run `code` synchronously inside `scope`.
  pub fn evaluate(&self, code: &str, chunk_name: &str, scope: LuaTable) -> LuaResult<()> {
    self.evaluations.set(self.evaluations.get() + 1);
    self.lua.load(code).set_name(chunk_name).set_environment(scope).exec()
  }

  /// The Lua table form of `configuration`, converted on first use.
  pub fn configuration_value(&self, configuration: &Arc<Configuration>) -> LuaResult<LuaTable> {
    let address = Arc::as_ptr(configuration) as usize;
    if let Some(cached) = self.configuration_values.borrow().get(&address)
      && cached
        .configuration
        .upgrade()
        .is_some_and(|live| Arc::ptr_eq(&live, configuration))
    {
      return self.lua.registry_value(&cached.value);
    }

    let table = match self.lua.to_value(configuration.value())? {
      LuaValue::Table(table) => table,
      other => {
        return Err(LuaError::external(format!(
          "configuration converted to {} instead of a table",
          other.type_name()
        )));
      }
    };
    let key = self.lua.create_registry_value(table.clone())?;

    let mut cache = self.configuration_values.borrow_mut();
    cache.retain(|_, cached| cached.configuration.strong_count() > 0);
    cache.insert(
      address,
      CachedConfiguration {
        configuration: Arc::downgrade(configuration),
        value: key,
      },
    );
    drop(cache);
    self.lua.expire_registry_values();

    debug!(engine = %self.id, "cached configuration value");
    Ok(table)
  }

  /// Number of live configurations converted by this engine.
  pub fn cached_configurations(&self) -> usize {
    self
      .configuration_values
      .borrow()
      .values()
      .filter(|cached| cached.configuration.strong_count() > 0)
      .count()
  }
}

/// Strip the base functions in [`REMOVED_GLOBALS`], put the library tables
/// behind read-only views and return a read-only view of the result.
///
/// Nothing reachable from a scope can then change state shared by later
/// scopes of the same engine.
fn seal_globals(lua: &Lua) -> LuaResult<LuaTable> {
  let globals = lua.globals();
  for name in REMOVED_GLOBALS {
    globals.raw_set(*name, LuaNil)?;
  }
  for name in LIBRARY_TABLES {
    if let LuaValue::Table(library) = globals.raw_get::<LuaValue>(*name)? {
      globals.raw_set(*name, read_only(lua, library, name)?)?;
    }
  }

  let sealed = read_only(lua, globals.clone(), "_G")?;
  globals.raw_set("_G", sealed.clone())?;
  Ok(sealed)
}

/// An empty table reading through to `target` and rejecting every write.
fn read_only(lua: &Lua, target: LuaTable, name: &str) -> LuaResult<LuaTable> {
  let table_name = name.to_string();
  let reject = lua.create_function(move |_, (_, key, _): (LuaValue, LuaValue, LuaValue)| -> LuaResult<()> {
    let key = match &key {
      LuaValue::String(s) => s.to_string_lossy().to_string(),
      other => other.type_name().to_string(),
    };
    Err(LuaError::runtime(format!(
      "cannot assign '{}' in read-only table '{}'",
      key, table_name
    )))
  })?;

  let proxy = lua.create_table()?;
  let mt = lua.create_table()?;
  mt.set("__index", target)?;
  mt.set("__newindex", reject)?;
  mt.set("__metatable", false)?;
  proxy.set_metatable(Some(mt))?;
  Ok(proxy)
}

impl fmt::Debug for ScriptEngine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ScriptEngine")
      .field("id", &self.id)
      .field("evaluations", &self.evaluations.get())
      .finish_non_exhaustive()
  }
}
