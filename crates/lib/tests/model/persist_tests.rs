//! Storing and reloading whole projects.

use std::sync::Arc;

use buildgraph_lib::persist::{PersistError, load_project, read_project, save_project, store_project};

use super::common::sample_project;

mod round_trip {
  use super::*;

  #[test]
  fn loaded_project_equals_original() {
    let original = sample_project();
    let loaded = load_project(&store_project(&original).unwrap()).unwrap();
    assert_eq!(*loaded, *original);
  }

  #[test]
  fn every_product_field_survives() {
    let original = sample_project();
    let loaded = load_project(&store_project(&original).unwrap()).unwrap();

    let app = loaded.product("app").unwrap();
    let expected = original.product("app").unwrap();
    assert_eq!(app.file_tags, expected.file_tags);
    assert_eq!(app.target_name, "app");
    assert_eq!(app.build_directory, "/build/app");
    assert_eq!(app.source_directory, "/src/app");
    assert_eq!(app.destination_directory, "/install/bin");
    assert_eq!(app.project_file, "/src/app/app.qbs");
    assert_eq!(app.sources, expected.sources);
    assert_eq!(app.rules, expected.rules);
    assert_eq!(app.groups, expected.groups);
    assert_eq!(app.modules, expected.modules);
    assert_eq!(loaded.platform_environment, original.platform_environment);
  }

  #[test]
  fn binding_order_is_preserved() {
    let loaded = load_project(&store_project(&sample_project()).unwrap()).unwrap();
    let rule = &loaded.product("app").unwrap().rules[0];
    let names: Vec<String> = rule.artifacts[0]
      .bindings
      .iter()
      .map(|binding| binding.name.join("."))
      .collect();
    assert_eq!(names, vec!["cpp.defines", "cpp.flags"]);
  }

  #[test]
  fn rule_graph_id_is_not_persisted() {
    let original = sample_project();
    original.product("app").unwrap().rules[0].set_rule_graph_id(7);
    let loaded = load_project(&store_project(&original).unwrap()).unwrap();
    assert_eq!(loaded.product("app").unwrap().rules[0].rule_graph_id(), None);
  }

  #[test]
  fn encoding_is_deterministic() {
    let project = sample_project();
    assert_eq!(store_project(&project).unwrap(), store_project(&project).unwrap());
  }
}

mod identity {
  use super::*;

  #[test]
  fn shared_objects_stay_shared() {
    let loaded = load_project(&store_project(&sample_project()).unwrap()).unwrap();
    let app = loaded.product("app").unwrap();
    let core = loaded.product("core").unwrap();

    assert!(Arc::ptr_eq(&app.rules[0].module, &app.rules[1].module));
    assert!(Arc::ptr_eq(&app.rules[0].module, &app.modules[1]));
    assert!(Arc::ptr_eq(&app.modules[0], &core.modules[0]));
    assert!(Arc::ptr_eq(&app.rules[0].script, &app.rules[1].script));
    assert!(Arc::ptr_eq(&app.file_taggers[0], &core.file_taggers[0]));
    assert!(Arc::ptr_eq(&app.uses[0], core));
  }

  #[test]
  fn shared_configuration_is_loaded_once() {
    let loaded = load_project(&store_project(&sample_project()).unwrap()).unwrap();
    let app = loaded.product("app").unwrap();

    assert!(Arc::ptr_eq(&app.configuration, &loaded.configuration));
    assert!(Arc::ptr_eq(&app.configuration, &app.sources[0].configuration));
    assert!(!Arc::ptr_eq(&app.configuration, &app.sources[1].configuration));
  }
}

mod reattachment {
  use super::*;

  #[test]
  fn loaded_products_point_at_loaded_project() {
    let loaded = load_project(&store_project(&sample_project()).unwrap()).unwrap();
    for product in &loaded.products {
      let owner = product.project().unwrap();
      assert!(Arc::ptr_eq(&owner, &loaded));
    }
  }

  #[test]
  fn environments_are_not_persisted() {
    let loaded = load_project(&store_project(&sample_project()).unwrap()).unwrap();
    for product in &loaded.products {
      assert!(product.build_environment().is_none());
      assert!(product.run_environment().is_none());
    }
  }
}

mod files {
  use super::*;

  #[test]
  fn save_then_read() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("sample.bg");
    let original = sample_project();

    save_project(&path, &original).unwrap();
    let loaded = read_project(&path).unwrap();
    assert_eq!(*loaded, *original);
  }

  #[test]
  fn save_replaces_existing_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("sample.bg");
    std::fs::write(&path, b"stale").unwrap();

    save_project(&path, &sample_project()).unwrap();
    assert_eq!(read_project(&path).unwrap().id, "sample");
  }

  #[test]
  fn truncated_file_is_rejected() {
    let bytes = store_project(&sample_project()).unwrap();
    let err = load_project(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(!matches!(err, PersistError::InvalidMagic), "unexpected error: {err}");
  }
}
