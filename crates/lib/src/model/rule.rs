//! Rules and the transformers instantiated from them.
//!
//! By default a rule is *non-multiplex*: the transformer stage creates one
//! transformer per matching input file. A *multiplex* rule gets a single
//! transformer that takes every matching input at once (a linker rule, for
//! example).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{CodeLocation, ResolvedModule, RuleArtifact, ScriptImport, SourceArtifact};
use crate::persist::{PoolReader, PoolWriter, Persistent, Result};

/// Value of `rule_graph_id` before the rule graph stage numbers the rule.
const RULE_GRAPH_ID_UNASSIGNED: usize = usize::MAX;

/// The script body of a rule's command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleScript {
  pub script: String,
  pub location: CodeLocation,
}

impl RuleScript {
  pub fn new(script: impl Into<String>, location: CodeLocation) -> Self {
    Self {
      script: script.into(),
      location,
    }
  }
}

impl Persistent for RuleScript {
  fn store(&self, pool: &mut PoolWriter) -> Result<()> {
    pool.write(&self.script)?;
    pool.write(&self.location)
  }

  fn load(pool: &mut PoolReader<'_>) -> Result<Self> {
    Ok(Self {
      script: pool.read()?,
      location: pool.read()?,
    })
  }
}

#[derive(Debug)]
pub struct Rule {
  pub script: Arc<RuleScript>,
  pub module: Arc<ResolvedModule>,
  pub imports: Vec<ScriptImport>,
  /// File tags of the artifacts this rule consumes.
  pub inputs: Vec<String>,
  /// File tags the rule reads without consuming them.
  pub usings: Vec<String>,
  pub explicitly_depends_on: Vec<String>,
  pub multiplex: bool,
  pub object_id: String,
  pub artifacts: Vec<Arc<RuleArtifact>>,
  /// Named script expressions evaluated for each transformer.
  pub transform_properties: BTreeMap<String, String>,
  rule_graph_id: AtomicUsize,
}

impl Rule {
  pub fn new(module: Arc<ResolvedModule>, script: Arc<RuleScript>) -> Self {
    Self {
      script,
      module,
      imports: Vec::new(),
      inputs: Vec::new(),
      usings: Vec::new(),
      explicitly_depends_on: Vec::new(),
      multiplex: false,
      object_id: String::new(),
      artifacts: Vec::new(),
      transform_properties: BTreeMap::new(),
      rule_graph_id: AtomicUsize::new(RULE_GRAPH_ID_UNASSIGNED),
    }
  }

  pub fn is_multiplex_rule(&self) -> bool {
    self.multiplex
  }

  /// Every file tag the rule's artifacts receive, sorted and without
  /// duplicates.
  pub fn output_file_tags(&self) -> Vec<String> {
    let mut tags: Vec<String> = self
      .artifacts
      .iter()
      .flat_map(|artifact| artifact.file_tags.iter().cloned())
      .collect();
    tags.sort();
    tags.dedup();
    tags
  }

  /// Group the artifacts this rule consumes the way transformers get created
  /// for them: one group with every match for a multiplex rule, one group per
  /// match otherwise.
  pub fn input_batches(&self, sources: &[Arc<SourceArtifact>]) -> Vec<Vec<Arc<SourceArtifact>>> {
    let matching: Vec<Arc<SourceArtifact>> = sources
      .iter()
      .filter(|source| self.inputs.iter().any(|tag| source.file_tags.contains(tag)))
      .cloned()
      .collect();

    if matching.is_empty() {
      return Vec::new();
    }
    if self.is_multiplex_rule() {
      return vec![matching];
    }
    matching.into_iter().map(|source| vec![source]).collect()
  }

  /// Number assigned by the rule graph stage, if it has run.
  pub fn rule_graph_id(&self) -> Option<usize> {
    match self.rule_graph_id.load(Ordering::Relaxed) {
      RULE_GRAPH_ID_UNASSIGNED => None,
      id => Some(id),
    }
  }

  pub fn set_rule_graph_id(&self, id: usize) {
    self.rule_graph_id.store(id, Ordering::Relaxed);
  }
}

impl PartialEq for Rule {
  fn eq(&self, other: &Self) -> bool {
    self.script == other.script
      && self.module == other.module
      && self.imports == other.imports
      && self.inputs == other.inputs
      && self.usings == other.usings
      && self.explicitly_depends_on == other.explicitly_depends_on
      && self.multiplex == other.multiplex
      && self.object_id == other.object_id
      && self.artifacts == other.artifacts
      && self.transform_properties == other.transform_properties
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{} -> {}]", self.inputs.join(","), self.output_file_tags().join(","))
  }
}

impl Persistent for Rule {
  fn store(&self, pool: &mut PoolWriter) -> Result<()> {
    pool.store(&self.script)?;
    pool.store(&self.module)?;
    pool.write(&self.imports)?;
    pool.write(&self.inputs)?;
    pool.write(&self.usings)?;
    pool.write(&self.explicitly_depends_on)?;
    pool.write(&self.multiplex)?;
    pool.write(&self.object_id)?;
    pool.write(&self.transform_properties)?;
    pool.store_all(&self.artifacts)
  }

  fn load(pool: &mut PoolReader<'_>) -> Result<Self> {
    let script = pool.load()?;
    let module = pool.load()?;
    let mut rule = Rule::new(module, script);
    rule.imports = pool.read()?;
    rule.inputs = pool.read()?;
    rule.usings = pool.read()?;
    rule.explicitly_depends_on = pool.read()?;
    rule.multiplex = pool.read()?;
    rule.object_id = pool.read()?;
    rule.transform_properties = pool.read()?;
    rule.artifacts = pool.load_all()?;
    Ok(rule)
  }
}

/// One instantiation of a rule against concrete inputs.
///
/// Built by the transformer stage from a [`Rule`]; it is never persisted.
#[derive(Debug, Clone)]
pub struct ResolvedTransformer {
  pub module: Arc<ResolvedModule>,
  pub inputs: Vec<String>,
  pub outputs: Vec<Arc<SourceArtifact>>,
  pub transform: Arc<RuleScript>,
  pub imports: Vec<ScriptImport>,
}

impl ResolvedTransformer {
  /// A transformer running `rule`'s script on `inputs`, with no outputs yet.
  pub fn for_rule(rule: &Rule, inputs: &[Arc<SourceArtifact>]) -> Self {
    Self {
      module: rule.module.clone(),
      inputs: inputs
        .iter()
        .map(|input| input.absolute_file_path.clone())
        .collect(),
      outputs: Vec::new(),
      transform: rule.script.clone(),
      imports: rule.imports.clone(),
    }
  }
}
