//! Env command implementation.
//!
//! Computes the build or run environment of one product and prints it as
//! `NAME=value` lines.

use std::path::Path;

use anyhow::{Result, anyhow};
use buildgraph_lib::environment::Environment;
use buildgraph_lib::script::ScriptEngine;
use tracing::debug;

use super::open_graph;
use crate::output::print_json;

pub fn cmd_env(graph: &Path, product_name: &str, run: bool, json: bool) -> Result<()> {
  let project = open_graph(graph)?;
  let product = project
    .product(product_name)
    .ok_or_else(|| anyhow!("No product named '{}' in {}", product_name, graph.display()))?;

  let engine = ScriptEngine::new().map_err(|e| anyhow!("Failed to create script engine: {}", e))?;
  let system_environment: Environment = std::env::vars().collect();
  debug!(engine = %engine.id(), product = %product.name, run, "computing environment");

  let environment = if run {
    product.setup_run_environment(&engine, &system_environment)?;
    product.run_environment()
  } else {
    product.setup_build_environment(&engine, &system_environment)?;
    product.build_environment()
  };
  let environment = environment.unwrap_or_default();

  if json {
    return print_json(&environment);
  }

  for (name, value) in &environment {
    println!("{}={}", name, value);
  }
  Ok(())
}
