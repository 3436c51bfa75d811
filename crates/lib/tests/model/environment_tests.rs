//! Environment setup through products.

use std::sync::Arc;
use std::thread;

use buildgraph_lib::environment::{Environment, EnvironmentError, EnvironmentKind};
use buildgraph_lib::model::{ResolvedModule, ResolvedProduct, ResolvedProject};
use buildgraph_lib::persist::{load_project, store_project};
use buildgraph_lib::script::ScriptEngine;
use serde_json::json;

use super::common::{ab_project, configuration, env, module, sample_project};

fn single_product_project(product: ResolvedProduct) -> Arc<ResolvedProject> {
  let mut project = ResolvedProject::new("single");
  project.products = vec![Arc::new(product)];
  project.into_shared()
}

mod setup {
  use super::*;

  #[test]
  fn ab_scenario() {
    let project = ab_project();
    let product = project.product("app").unwrap();
    let engine = ScriptEngine::new().unwrap();

    product.setup_build_environment(&engine, &Environment::new()).unwrap();
    assert_eq!(product.build_environment().unwrap(), env(&[("BAR", "2"), ("FOO", "1")]));
    assert!(product.run_environment().is_none());
  }

  #[test]
  fn run_environment_is_separate() {
    let mut product = ResolvedProduct::new("app");
    product.modules = vec![Arc::new(
      ResolvedModule::new("qt")
        .with_build_script("putenv('KIND', 'build')")
        .with_run_script("putenv('KIND', 'run')"),
    )];
    let project = single_product_project(product);
    let product = &project.products[0];
    let engine = ScriptEngine::new().unwrap();

    product.setup_build_environment(&engine, &Environment::new()).unwrap();
    product.setup_run_environment(&engine, &Environment::new()).unwrap();
    assert_eq!(product.build_environment().unwrap()["KIND"], "build");
    assert_eq!(product.run_environment().unwrap()["KIND"], "run");
  }

  #[test]
  fn platform_environment_overlays_system() {
    let mut product = ResolvedProduct::new("app");
    product.modules = vec![module("sdk", &[], "putenv('SEEN_SDK', getenv('SDKROOT'))")];
    let mut project = ResolvedProject::new("p");
    project.platform_environment = json!({ "SDKROOT": "/platform/sdk" }).as_object().cloned().unwrap();
    project.products = vec![Arc::new(product)];
    let project = project.into_shared();

    let engine = ScriptEngine::new().unwrap();
    let product = &project.products[0];
    product
      .setup_build_environment(&engine, &env(&[("SDKROOT", "/system/sdk"), ("USER", "me")]))
      .unwrap();

    let environment = product.build_environment().unwrap();
    assert_eq!(environment["SEEN_SDK"], "/platform/sdk");
    assert_eq!(environment["SDKROOT"], "/platform/sdk");
    assert_eq!(environment["USER"], "me");
  }

  #[test]
  fn loaded_project_computes_environments() {
    let loaded = load_project(&store_project(&sample_project()).unwrap()).unwrap();
    let app = loaded.product("app").unwrap();
    let engine = ScriptEngine::new().unwrap();

    app.setup_build_environment(&engine, &Environment::new()).unwrap();
    let build = app.build_environment().unwrap();
    assert_eq!(build["PATH"], "/tc/bin");
    assert_eq!(build["CXX"], "clang++");
    assert_eq!(build["ARCH_BITS"], "64");

    app.setup_run_environment(&engine, &Environment::new()).unwrap();
    let run = app.run_environment().unwrap();
    assert_eq!(run["LD_LIBRARY_PATH"], "/opt/lib");
    assert!(!run.contains_key("CXX"));
  }
}

mod memoization {
  use super::*;

  #[test]
  fn second_setup_is_a_no_op() {
    let project = ab_project();
    let product = project.product("app").unwrap();
    let engine = ScriptEngine::new().unwrap();

    product.setup_build_environment(&engine, &Environment::new()).unwrap();
    let evaluations = engine.evaluation_count();
    product
      .setup_build_environment(&engine, &env(&[("FOO", "changed")]))
      .unwrap();

    assert_eq!(engine.evaluation_count(), evaluations);
    assert_eq!(product.build_environment().unwrap()["FOO"], "1");
  }

  #[test]
  fn other_engines_reuse_the_result() {
    let project = ab_project();
    let product = project.product("app").unwrap();

    let first = ScriptEngine::new().unwrap();
    product.setup_build_environment(&first, &Environment::new()).unwrap();

    let second = ScriptEngine::new().unwrap();
    product.setup_build_environment(&second, &Environment::new()).unwrap();
    assert_eq!(second.evaluation_count(), 0);
  }

  #[test]
  fn concurrent_setup_computes_once() {
    let project = ab_project();
    let product = project.product("app").unwrap().clone();

    let evaluations: usize = thread::scope(|scope| {
      let handles: Vec<_> = (0..8)
        .map(|_| {
          let product = product.clone();
          scope.spawn(move || {
            let engine = ScriptEngine::new().unwrap();
            product.setup_build_environment(&engine, &Environment::new()).unwrap();
            assert_eq!(product.build_environment().unwrap()["BAR"], "2");
            engine.evaluation_count()
          })
        })
        .collect();
      handles.into_iter().map(|handle| handle.join().unwrap()).sum()
    });

    assert_eq!(evaluations, 2);
  }

  #[test]
  fn different_products_compute_in_parallel() {
    let mut project = ResolvedProject::new("many");
    project.products = (0..4)
      .map(|i| {
        let mut product = ResolvedProduct::new(format!("p{i}"));
        product.configuration = configuration(json!({ "modules": { "m": { "INDEX": i } } }));
        product.modules = vec![module("m", &[], "putenv('INDEX', INDEX)")];
        Arc::new(product)
      })
      .collect();
    let project = project.into_shared();

    thread::scope(|scope| {
      for product in &project.products {
        scope.spawn(move || {
          let engine = ScriptEngine::new().unwrap();
          product.setup_build_environment(&engine, &Environment::new()).unwrap();
        });
      }
    });

    for (i, product) in project.products.iter().enumerate() {
      assert_eq!(product.build_environment().unwrap()["INDEX"], i.to_string());
    }
  }
}

mod failures {
  use super::*;

  #[test]
  fn failed_setup_leaves_cache_empty() {
    let mut product = ResolvedProduct::new("app");
    product.modules = vec![
      module("ok", &[], "putenv('PARTIAL', 'yes')"),
      module("broken", &["ok"], "error('no compiler')"),
    ];
    let project = single_product_project(product);
    let product = &project.products[0];
    let engine = ScriptEngine::new().unwrap();

    let err = product.setup_run_environment(&engine, &Environment::new()).unwrap_err();
    assert!(matches!(err, EnvironmentError::Setup { kind: EnvironmentKind::Run, .. }));
    assert!(err.to_string().contains("run"));
    assert!(err.to_string().contains("no compiler"));
    assert!(product.run_environment().is_none());
  }

  #[test]
  fn failure_can_be_retried() {
    let mut product = ResolvedProduct::new("app");
    product.modules = vec![module("flaky", &[], "putenv('V', getenv('REQUIRED') .. '')")];
    product.modules.push(module("check", &["flaky"], "if getenv('V') == '' then error('REQUIRED unset') end"));
    let project = single_product_project(product);
    let product = &project.products[0];
    let engine = ScriptEngine::new().unwrap();

    assert!(product.setup_build_environment(&engine, &Environment::new()).is_err());
    product
      .setup_build_environment(&engine, &env(&[("REQUIRED", "1")]))
      .unwrap();
    assert_eq!(product.build_environment().unwrap()["V"], "1");
  }

  #[test]
  fn dropped_project_detaches_products() {
    let project = ab_project();
    let product = project.product("app").unwrap().clone();
    drop(project);

    let engine = ScriptEngine::new().unwrap();
    let err = product.setup_build_environment(&engine, &Environment::new()).unwrap_err();
    assert!(matches!(err, EnvironmentError::Detached { .. }));
  }
}

mod executables {
  use super::*;

  #[test]
  fn resolves_from_build_environment_path() {
    let temp = tempfile::tempdir().unwrap();
    let tool = temp.path().join("mytool");
    std::fs::write(&tool, b"#!/bin/sh\n").unwrap();

    let mut product = ResolvedProduct::new("app");
    product.modules = vec![module(
      "tools",
      &[],
      &format!("putenv('PATH', '{}')", temp.path().display()),
    )];
    let project = single_product_project(product);
    let product = &project.products[0];

    assert_eq!(product.resolve_executable("mytool"), "mytool");

    let engine = ScriptEngine::new().unwrap();
    product.setup_build_environment(&engine, &Environment::new()).unwrap();
    assert_eq!(product.resolve_executable("mytool"), tool.to_string_lossy());
  }
}
