//! Utility functions for the registry
//!
//! Static dependency graph checks used by [`InjectorRegistry::validate`](crate::InjectorRegistry::validate),
//! and the runtime creation tracker used while resolving.

/// Dependency graph utilities
pub mod dependency {
    use std::collections::{HashMap, HashSet};
    use std::fmt::Display;
    use std::hash::Hash;
    use std::thread::{self, ThreadId};

    use parking_lot::Mutex;

    /// Tracks types currently being created to detect circular dependencies.
    ///
    /// Each thread has its own creation stack, so concurrent lookups of the
    /// same type on different threads are not reported as cycles, while any
    /// nested lookup on the same thread is, whichever entry point it used.
    #[derive(Debug)]
    pub struct CreationTracker<K> {
        creating: Mutex<HashMap<ThreadId, Vec<K>>>,
    }

    impl<K> Default for CreationTracker<K> {
        fn default() -> Self {
            Self {
                creating: Mutex::new(HashMap::new()),
            }
        }
    }

    impl<K: Eq + Clone> CreationTracker<K> {
        /// Creates a new empty creation tracker.
        pub fn new() -> Self {
            Self::default()
        }

        /// Checks if `key` is being created on the current thread.
        pub fn is_creating(&self, key: &K) -> bool {
            self.creating
                .lock()
                .get(&thread::current().id())
                .is_some_and(|stack| stack.contains(key))
        }

        /// Marks `key` as being created on the current thread.
        ///
        /// # Errors
        ///
        /// If `key` is already being created on this thread, returns the cycle:
        /// the current creation stack followed by `key`.
        pub fn start_creating(&self, key: K) -> Result<(), Vec<K>> {
            let mut creating = self.creating.lock();
            let stack = creating.entry(thread::current().id()).or_default();
            if stack.contains(&key) {
                let mut cycle = stack.clone();
                cycle.push(key);
                return Err(cycle);
            }
            stack.push(key);
            Ok(())
        }

        /// Marks `key` as finished being created on the current thread.
        pub fn finish_creating(&self, key: &K) {
            let thread_id = thread::current().id();
            let mut creating = self.creating.lock();
            if let Some(stack) = creating.get_mut(&thread_id) {
                if let Some(position) = stack.iter().rposition(|k| k == key) {
                    stack.remove(position);
                }
                if stack.is_empty() {
                    creating.remove(&thread_id);
                }
            }
        }

        /// Gets a snapshot of the types being created on the current thread, outermost first.
        pub fn current_creating(&self) -> Vec<K> {
            self.creating
                .lock()
                .get(&thread::current().id())
                .cloned()
                .unwrap_or_default()
        }
    }

    /// Dependency graph analysis result
    #[derive(Debug)]
    pub enum DependencyValidationError {
        /// Circular dependency detected
        CircularDependency {
            /// The dependency chain forming the cycle
            cycle: Vec<String>,
        },
        /// Missing dependency detected
        MissingDependency {
            /// The type that requires the dependency
            dependent: String,
            /// The missing dependency
            missing: String,
        },
    }

    impl std::fmt::Display for DependencyValidationError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::CircularDependency { cycle } => {
                    write!(f, "Circular dependency detected: {}", cycle.join(" -> "))
                }
                Self::MissingDependency { dependent, missing } => {
                    write!(f, "'{}' depends on '{}' which is not registered", dependent, missing)
                }
            }
        }
    }

    impl std::error::Error for DependencyValidationError {}

    /// Validates a dependency graph for cycles and unregistered nodes
    ///
    /// # Arguments
    ///
    /// * `dependencies` - Map of node to the nodes it depends on
    ///
    /// # Returns
    ///
    /// Returns Ok(()) if no issues found, or Err with the first detected issue
    pub fn validate_dependency_graph<K>(
        dependencies: &HashMap<K, Vec<K>>,
    ) -> Result<(), DependencyValidationError>
    where
        K: Eq + Hash + Clone + Display,
    {
        for (node, deps) in dependencies {
            if let Some(dep) = deps.iter().find(|dep| !dependencies.contains_key(*dep)) {
                return Err(DependencyValidationError::MissingDependency {
                    dependent: node.to_string(),
                    missing: dep.to_string(),
                });
            }
        }

        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for node in dependencies.keys() {
            if !visited.contains(node) {
                if let Some(cycle) = detect_cycle(node, dependencies, &mut visited, &mut stack) {
                    return Err(DependencyValidationError::CircularDependency {
                        cycle: cycle.iter().map(ToString::to_string).collect(),
                    });
                }
            }
        }

        Ok(())
    }

    /// DFS-based cycle detection
    ///
    /// Returns Some(cycle) with the first node repeated at the end, None otherwise
    fn detect_cycle<K>(
        node: &K,
        graph: &HashMap<K, Vec<K>>,
        visited: &mut HashSet<K>,
        stack: &mut Vec<K>,
    ) -> Option<Vec<K>>
    where
        K: Eq + Hash + Clone,
    {
        visited.insert(node.clone());
        stack.push(node.clone());

        for dep in graph.get(node).into_iter().flatten() {
            if let Some(start) = stack.iter().position(|x| x == dep) {
                let mut cycle = stack[start..].to_vec();
                cycle.push(dep.clone());
                return Some(cycle);
            }
            if !visited.contains(dep) {
                if let Some(cycle) = detect_cycle(dep, graph, visited, stack) {
                    return Some(cycle);
                }
            }
        }

        stack.pop();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::dependency::*;
    use std::collections::HashMap;

    #[test]
    fn test_creation_tracker() {
        let tracker = CreationTracker::new();

        assert!(tracker.start_creating("A").is_ok());
        assert!(tracker.start_creating("B").is_ok());
        assert!(tracker.is_creating(&"A"));
        assert_eq!(tracker.current_creating(), vec!["A", "B"]);

        assert_eq!(tracker.start_creating("A"), Err(vec!["A", "B", "A"]));

        tracker.finish_creating(&"B");
        tracker.finish_creating(&"A");
        assert!(!tracker.is_creating(&"A"));
        assert!(tracker.current_creating().is_empty());
    }

    #[test]
    fn test_creation_tracker_is_per_thread() {
        let tracker = CreationTracker::new();
        tracker.start_creating("A").unwrap();

        std::thread::scope(|s| {
            s.spawn(|| {
                assert!(!tracker.is_creating(&"A"));
                assert!(tracker.start_creating("A").is_ok());
                tracker.finish_creating(&"A");
            });
        });

        assert_eq!(tracker.current_creating(), vec!["A"]);
    }

    fn graph(edges: &[(&'static str, &[&'static str])]) -> HashMap<&'static str, Vec<&'static str>> {
        edges.iter().map(|(node, deps)| (*node, deps.to_vec())).collect()
    }

    #[test]
    fn test_validate_missing_dependency() {
        let deps = graph(&[("Car", &["Engine"])]);

        match validate_dependency_graph(&deps) {
            Err(DependencyValidationError::MissingDependency { dependent, missing }) => {
                assert_eq!(dependent, "Car");
                assert_eq!(missing, "Engine");
            }
            other => panic!("Expected MissingDependency error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_circular_dependency() {
        let deps = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])]);

        match validate_dependency_graph(&deps) {
            Err(DependencyValidationError::CircularDependency { cycle }) => {
                assert_eq!(cycle.len(), 4);
                assert_eq!(cycle.first(), cycle.last());
                for name in ["A", "B", "C"] {
                    assert!(cycle.iter().any(|n| n == name));
                }
            }
            other => panic!("Expected CircularDependency error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_valid_graph() {
        let deps = graph(&[
            ("Config", &[]),
            ("Database", &["Config"]),
            ("UserService", &["Database", "Config"]),
        ]);
        assert!(validate_dependency_graph(&deps).is_ok());
    }

    #[test]
    fn test_validate_self_dependency() {
        let deps = graph(&[("A", &["A"])]);

        match validate_dependency_graph(&deps) {
            Err(DependencyValidationError::CircularDependency { cycle }) => {
                assert_eq!(cycle, vec!["A", "A"]);
            }
            other => panic!("Expected CircularDependency error, got {:?}", other),
        }
    }
}
