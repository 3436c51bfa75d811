//! Build and run environments of products.
//!
//! Every module of a product may contribute to an environment through a
//! setup script. Scripts run in dependency order inside a sandboxed scope
//! and mutate the environment through `getenv` and `putenv`.

mod compute;
mod types;

pub use compute::*;
pub use types::*;
