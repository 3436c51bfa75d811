use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::model::ResolvedModule;

#[derive(Debug, Error)]
pub enum ModuleGraphError {
  #[error("module dependency cycle detected at '{module}'")]
  Cycle { module: String },
}

/// Parent/child edges between the modules of one product.
///
/// Nodes are indices into the module slice the graph was built from.
#[derive(Debug)]
pub struct ModuleGraph<'a> {
  modules: &'a [Arc<ResolvedModule>],
  /// Resolved dependencies of each module, in the order they were listed.
  children: Vec<Vec<usize>>,
  /// Modules depending on each module.
  parents: Vec<Vec<usize>>,
}

impl<'a> ModuleGraph<'a> {
  /// Resolve every module's dependency names.
  ///
  /// When several modules share a name, dependencies on that name resolve to
  /// the last of them. Names matching no module are skipped.
  pub fn new(modules: &'a [Arc<ResolvedModule>]) -> Self {
    let by_name: HashMap<&str, usize> = modules
      .iter()
      .enumerate()
      .map(|(index, module)| (module.name.as_str(), index))
      .collect();

    let mut children = vec![Vec::new(); modules.len()];
    let mut parents = vec![Vec::new(); modules.len()];
    for (index, module) in modules.iter().enumerate() {
      for dependency in &module.module_dependencies {
        match by_name.get(dependency.as_str()) {
          Some(&dependency_index) => {
            children[index].push(dependency_index);
            parents[dependency_index].push(index);
          }
          None => warn!(module = %module.name, %dependency, "unresolved module dependency"),
        }
      }
    }

    Self {
      modules,
      children,
      parents,
    }
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  pub fn module(&self, index: usize) -> &'a Arc<ResolvedModule> {
    &self.modules[index]
  }

  pub fn children(&self, index: usize) -> &[usize] {
    &self.children[index]
  }

  pub fn parents(&self, index: usize) -> &[usize] {
    &self.parents[index]
  }

  /// Modules nothing depends on, in list order.
  pub fn roots(&self) -> Vec<usize> {
    (0..self.len()).filter(|&index| self.parents[index].is_empty()).collect()
  }

  /// Dependency-first order of everything reachable from `roots`.
  ///
  /// Roots are visited in the given order and each module's dependencies in
  /// their listed order; a module is emitted once all of its dependencies
  /// have been. Every name is emitted at most once, at its first completed
  /// visit. Modules with an empty name are traversed but never emitted.
  pub fn topological_order<I>(&self, roots: I) -> Result<Vec<usize>, ModuleGraphError>
  where
    I: IntoIterator<Item = usize>,
  {
    struct Frame {
      module: usize,
      next_child: usize,
    }

    let mut order = Vec::new();
    let mut emitted_names: HashSet<&str> = HashSet::new();
    let mut completed = vec![false; self.len()];
    let mut on_path = vec![false; self.len()];

    for root in roots {
      if completed[root] {
        continue;
      }

      on_path[root] = true;
      let mut stack = vec![Frame {
        module: root,
        next_child: 0,
      }];

      while let Some(frame) = stack.last_mut() {
        let module = frame.module;
        if let Some(&child) = self.children[module].get(frame.next_child) {
          frame.next_child += 1;
          if completed[child] {
            continue;
          }
          if on_path[child] {
            return Err(ModuleGraphError::Cycle {
              module: self.modules[child].name.clone(),
            });
          }
          on_path[child] = true;
          stack.push(Frame {
            module: child,
            next_child: 0,
          });
          continue;
        }

        stack.pop();
        on_path[module] = false;
        completed[module] = true;

        let name = self.modules[module].name.as_str();
        if !name.is_empty() && emitted_names.insert(name) {
          order.push(module);
        }
      }
    }

    Ok(order)
  }
}

/// The modules of a product in dependency-first order, using the whole list,
/// in list order, as roots.
pub fn sorted_modules(modules: &[Arc<ResolvedModule>]) -> Result<Vec<Arc<ResolvedModule>>, ModuleGraphError> {
  let graph = ModuleGraph::new(modules);
  let order = graph.topological_order(0..graph.len())?;
  Ok(order.into_iter().map(|index| modules[index].clone()).collect())
}
