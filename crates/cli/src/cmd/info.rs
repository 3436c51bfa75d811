//! Info command implementation.
//!
//! Lists the products of a build graph with their module and rule counts.

use std::path::Path;

use anyhow::Result;
use buildgraph_lib::modules::sorted_modules;

use super::open_graph;
use crate::output::{print_info, print_json, print_stat, print_success, symbols};

pub fn cmd_info(graph: &Path, verbose: bool, json: bool) -> Result<()> {
  let project = open_graph(graph)?;

  if json {
    let products: Vec<_> = project
      .products
      .iter()
      .map(|product| {
        serde_json::json!({
          "name": product.name,
          "target_name": product.target_name,
          "file_tags": product.file_tags,
          "modules": product.modules.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
          "rules": product.rules.len(),
          "sources": product.sources.len(),
        })
      })
      .collect();
    let json_output = serde_json::json!({
      "id": project.id,
      "project_file": project.project_file,
      "products": products,
    });
    return print_json(&json_output);
  }

  print_success(&format!("Project: {}", project.id));
  print_stat("Project file", &project.project_file);
  print_stat("Products", &project.products.len().to_string());

  if project.products.is_empty() {
    return Ok(());
  }

  println!();
  for product in &project.products {
    print_info(&format!(
      "{} ({} modules, {} rules, {} sources)",
      product.name,
      product.modules.len(),
      product.rules.len(),
      product.sources.len()
    ));

    if verbose {
      match sorted_modules(&product.modules) {
        Ok(order) => {
          let names: Vec<&str> = order.iter().map(|module| module.name.as_str()).collect();
          let separator = format!(" {} ", symbols::ARROW);
          println!("    modules: {}", names.join(separator.as_str()));
        }
        Err(e) => println!("    modules: {}", e),
      }
      for rule in &product.rules {
        println!("    rule {}", rule);
      }
    }
  }

  Ok(())
}
