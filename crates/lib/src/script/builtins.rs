use std::cell::RefCell;

use mlua::prelude::*;
use thiserror::Error;

use crate::consts::{GETENV_FUNCTION, PUTENV_FUNCTION};
use crate::environment::Environment;

/// A sandbox built-in was called with too few arguments.
#[derive(Debug, Error)]
pub enum SandboxArgumentError {
  #[error("getenv expects 1 argument")]
  Getenv,

  #[error("putenv expects 2 arguments")]
  Putenv,
}

/// Register `getenv` and `putenv` in `target`, both bound to `environment`.
///
/// The functions live only as long as `scope`, so a script cannot hold on to
/// an environment after its evaluation finished.
pub fn register<'scope, 'env>(
  scope: &'scope mlua::Scope<'scope, 'env>,
  target: &LuaTable,
  environment: &'env RefCell<Environment>,
) -> LuaResult<()> {
  let getenv = scope.create_function(move |_, args: LuaMultiValue| {
    let mut args = args.into_iter();
    let name = args
      .next()
      .ok_or_else(|| LuaError::external(SandboxArgumentError::Getenv))?;
    let name = argument_text(name)?;
    Ok(environment.borrow().get(&name).cloned().unwrap_or_default())
  })?;

  let putenv = scope.create_function(move |_, args: LuaMultiValue| {
    let mut args = args.into_iter();
    let (Some(name), Some(value)) = (args.next(), args.next()) else {
      return Err(LuaError::external(SandboxArgumentError::Putenv));
    };
    let name = argument_text(name)?;
    let value = argument_text(value)?;
    environment.borrow_mut().insert(name, value);
    Ok(())
  })?;

  target.set(GETENV_FUNCTION, getenv)?;
  target.set(PUTENV_FUNCTION, putenv)?;
  Ok(())
}

fn argument_text(value: LuaValue) -> LuaResult<String> {
  match value {
    LuaValue::String(s) => Ok(s.to_str()?.to_string()),
    LuaValue::Integer(i) => Ok(i.to_string()),
    LuaValue::Number(n) => Ok(n.to_string()),
    LuaValue::Boolean(b) => Ok(b.to_string()),
    other => Err(LuaError::external(format!(
      "expected a string or number, got {}",
      other.type_name()
    ))),
  }
}
