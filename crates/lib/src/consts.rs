//! Names shared between the model and the script sandbox.

/// Configuration key holding one property map per module.
pub const MODULES_PROPERTY: &str = "modules";

/// Sandbox built-in reading a variable of the environment being set up.
pub const GETENV_FUNCTION: &str = "getenv";

/// Sandbox built-in writing a variable of the environment being set up.
pub const PUTENV_FUNCTION: &str = "putenv";
