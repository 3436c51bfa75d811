//! The resolved project model.
//!
//! A [`ResolvedProject`] is the output of the resolver: every product with its
//! rules, modules, file taggers and groups fully evaluated. Nodes that several
//! parents refer to (a module shared by many rules, a configuration shared by
//! many source artifacts) are held through `Arc` so the persistent pool can
//! keep them shared across a store/load cycle.
//!
//! # Submodules
//!
//! - [`artifact`] - Source artifacts, rule artifacts and file taggers
//! - [`configuration`] - Property maps attached to products and artifacts
//! - [`group`] - File selection specs
//! - [`module`] - Resolved modules and their setup scripts
//! - [`product`] - Resolved products and their lazily computed environments
//! - [`project`] - The owning project
//! - [`rule`] - Rules, rule scripts and resolved transformers

pub mod artifact;
pub mod configuration;
pub mod group;
pub mod module;
pub mod product;
pub mod project;
pub mod rule;
mod types;

pub use artifact::{Binding, FileTagger, RuleArtifact, SourceArtifact};
pub use configuration::Configuration;
pub use group::Group;
pub use module::ResolvedModule;
pub use product::ResolvedProduct;
pub use project::ResolvedProject;
pub use rule::{ResolvedTransformer, Rule, RuleScript};
pub use types::*;
