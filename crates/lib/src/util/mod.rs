//! Small helpers shared across the crate.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glob::{MatchOptions, Pattern};

/// Lock a mutex, recovering the data if another thread panicked with it held.
///
/// Every mutex in the model guards a cache whose contents stay valid after a
/// panic elsewhere.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Match `name` against a shell wildcard pattern, case-sensitively.
///
/// With `cross_directories` unset, `*` and `?` stop at path separators.
/// Patterns that do not compile never match.
pub fn glob_matches(pattern: &str, name: &str, cross_directories: bool) -> bool {
  let options = MatchOptions {
    case_sensitive: true,
    require_literal_separator: !cross_directories,
    require_literal_leading_dot: false,
  };
  Pattern::new(pattern)
    .map(|pattern| pattern.matches_with(name, options))
    .unwrap_or(false)
}

/// Drop repeated allocations, keeping the first occurrence of each.
///
/// Two `Arc`s are the same element only if they point at the same object;
/// equal but distinct objects are all kept.
pub fn unique_by_identity<T>(items: &[Arc<T>]) -> Vec<Arc<T>> {
  let mut seen = HashSet::new();
  items
    .iter()
    .filter(|item| seen.insert(Arc::as_ptr(*item) as *const () as usize))
    .cloned()
    .collect()
}
