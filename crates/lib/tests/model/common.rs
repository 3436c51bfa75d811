//! Shared fixtures for the model tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use buildgraph_lib::environment::Environment;
use buildgraph_lib::model::{
  Binding, CodeLocation, Configuration, FileTagger, Group, ResolvedModule, ResolvedProduct, ResolvedProject, Rule,
  RuleArtifact, RuleScript, ScriptImport, SourceArtifact,
};
use serde_json::json;

pub fn configuration(value: serde_json::Value) -> Arc<Configuration> {
  Arc::new(Configuration::new(value.as_object().cloned().unwrap()))
}

pub fn env(pairs: &[(&str, &str)]) -> Environment {
  pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

pub fn module(name: &str, dependencies: &[&str], build_script: &str) -> Arc<ResolvedModule> {
  Arc::new(
    ResolvedModule::new(name)
      .with_dependencies(dependencies.iter().copied())
      .with_build_script(build_script),
  )
}

/// A project with one product using modules `A` and `B`, where `B` depends
/// on `A` and derives `BAR` from `A`'s `FOO` property.
pub fn ab_project() -> Arc<ResolvedProject> {
  let mut product = ResolvedProduct::new("app");
  product.configuration = configuration(json!({ "modules": { "A": { "FOO": 1 } } }));
  product.modules = vec![
    module("A", &[], "putenv('FOO', FOO)"),
    module("B", &["A"], "putenv('BAR', A.FOO + 1)"),
  ];

  let mut project = ResolvedProject::new("ab");
  project.products = vec![Arc::new(product)];
  project.into_shared()
}

/// A project exercising every entity and the sharing between them.
pub fn sample_project() -> Arc<ResolvedProject> {
  let shared_config = configuration(json!({
    "modules": { "cpp": { "optimization": "fast", "defines": ["NDEBUG"] } },
    "qbs": { "buildVariant": "release" }
  }));

  let paths = ScriptImport {
    scope_name: "Paths".to_string(),
    file_paths: vec!["/share/imports/paths.lua".to_string()],
    location: CodeLocation::new("/share/modules/cpp.qbs", 12, 5),
  };
  let cpp = Arc::new(
    ResolvedModule::new("cpp")
      .with_dependencies(["toolchain"])
      .with_build_script("putenv('CXX', 'clang++')")
      .with_run_script("putenv('LD_LIBRARY_PATH', '/opt/lib')"),
  );
  // No setup scripts, so its import is never evaluated.
  let qt = Arc::new(ResolvedModule::new("qt.core").with_imports(vec![paths.clone()]));
  let toolchain = Arc::new(ResolvedModule::new("toolchain").with_build_script("putenv('PATH', '/tc/bin')"));

  let compile = Arc::new(RuleScript::new(
    "compile(input, output)",
    CodeLocation::new("/share/modules/cpp.qbs", 40, 9),
  ));
  let object_artifact = Arc::new(RuleArtifact {
    file_script: "input.baseName + '.o'".to_string(),
    file_tags: vec!["obj".to_string()],
    bindings: vec![
      Binding {
        name: vec!["cpp".to_string(), "defines".to_string()],
        code: "['A']".to_string(),
        location: CodeLocation::new("/share/modules/cpp.qbs", 44, 13),
      },
      Binding {
        name: vec!["cpp".to_string(), "flags".to_string()],
        code: "[]".to_string(),
        location: CodeLocation::new("/share/modules/cpp.qbs", 45, 13),
      },
    ],
  });

  let mut compiler = Rule::new(cpp.clone(), compile.clone());
  compiler.imports = vec![paths];
  compiler.inputs = vec!["cpp".to_string()];
  compiler.usings = vec!["staticlibrary".to_string()];
  compiler.explicitly_depends_on = vec!["hpp".to_string()];
  compiler.object_id = "rule-1".to_string();
  compiler.artifacts = vec![object_artifact.clone()];
  compiler.transform_properties = BTreeMap::from([("compilerPath".to_string(), "/tc/bin/clang++".to_string())]);

  let mut linker = Rule::new(cpp.clone(), compile);
  linker.inputs = vec!["obj".to_string()];
  linker.multiplex = true;
  linker.object_id = "rule-2".to_string();
  linker.artifacts = vec![Arc::new(RuleArtifact {
    file_script: "product.targetName".to_string(),
    file_tags: vec!["application".to_string()],
    bindings: Vec::new(),
  })];

  let tagger = Arc::new(FileTagger::new("*.cpp", vec!["cpp".to_string()]));

  let mut library = ResolvedProduct::new("core");
  library.file_tags = vec!["staticlibrary".to_string()];
  library.target_name = "core".to_string();
  library.configuration = shared_config.clone();
  library.modules = vec![toolchain.clone(), cpp.clone()];
  library.file_taggers = vec![tagger.clone()];
  let library = Arc::new(library);

  let mut app = ResolvedProduct::new("app");
  app.file_tags = vec!["application".to_string()];
  app.target_name = "app".to_string();
  app.build_directory = "/build/app".to_string();
  app.source_directory = "/src/app".to_string();
  app.destination_directory = "/install/bin".to_string();
  app.project_file = "/src/app/app.qbs".to_string();
  app.configuration = shared_config.clone();
  app.sources = vec![
    Arc::new(SourceArtifact::new("/src/app/main.cpp", shared_config.clone()).with_file_tags(["cpp"])),
    Arc::new(
      SourceArtifact::new(
        "/src/app/util.h",
        configuration(json!({ "modules": { "cpp": { "optimization": "none" } } })),
      )
      .with_file_tags(["hpp"]),
    ),
  ];
  app.rules = vec![Arc::new(compiler), Arc::new(linker)];
  app.uses = vec![library.clone()];
  app.file_taggers = vec![tagger];
  app.modules = vec![toolchain, cpp, qt];
  app.groups = vec![Arc::new(Group {
    prefix: "src/".to_string(),
    patterns: vec!["*.cpp".to_string()],
    exclude_patterns: vec!["*_test.cpp".to_string()],
    files: ["src/extra.c".to_string()].into_iter().collect(),
    recursive: true,
  })];

  let mut project = ResolvedProject::new("sample");
  project.project_file = "/src/sample.qbs".to_string();
  project.platform_environment = json!({ "SDKROOT": "/sdk", "ARCH_BITS": 64 }).as_object().cloned().unwrap();
  project.products = vec![Arc::new(app), library];
  project.configuration = shared_config;
  project.into_shared()
}
