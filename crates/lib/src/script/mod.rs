//! The sandboxed Lua engine that runs module setup scripts.
//!
//! Scripts only see the `table`, `string`, `math` and `utf8` libraries plus
//! whatever the caller injects into their scope; process access goes through
//! the [`builtins`] bound to one working environment at a time.
//!
//! # Submodules
//!
//! - [`builtins`] - `getenv` / `putenv` over an explicit working environment
//! - [`engine`] - Lua state, scopes, imports and the configuration side table

pub mod builtins;
pub mod engine;

pub use builtins::SandboxArgumentError;
pub use engine::{EngineId, ScriptEngine};
