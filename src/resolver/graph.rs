//! Dependency graph over registered names.
//!
//! The resolver itself walks the registry lazily, one request at a time. This
//! graph is built on demand from the registry for the questions a lazy walk
//! cannot answer cheaply: whether a request would deadlock on a cycle, which
//! order a closure loads in, and what the tree of a name looks like.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::DependsError;
use crate::registry::Registry;

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Graph of dependency names.
///
/// An edge `from → to` means `from` declares `to` as a dependency.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph reachable from `roots` through the registry.
    ///
    /// Unknown and malformed names become leaf nodes.
    pub fn from_registry<S: AsRef<str>>(registry: &Registry, roots: &[S]) -> Self {
        Self::from_registry_until(registry, roots, |_| false)
    }

    /// Like [`from_registry`](Self::from_registry), but names for which
    /// `stop` returns `true` are not expanded and become leaf nodes.
    ///
    /// Roots are always expanded.
    pub fn from_registry_until<S: AsRef<str>>(
        registry: &Registry,
        roots: &[S],
        stop: impl Fn(&str) -> bool,
    ) -> Self {
        let mut graph = Self::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();

        for root in roots {
            let root = root.as_ref();
            graph.ensure_node(root);
            if seen.insert(root.to_string()) {
                queue.push_back(root.to_string());
            }
        }

        while let Some(name) = queue.pop_front() {
            for dependency in registry.dependencies_of(&name) {
                graph.add_dependency(&name, dependency);
                if !stop(dependency) && seen.insert(dependency.clone()) {
                    queue.push_back(dependency.clone());
                }
            }
        }

        graph
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Record that `from` depends on `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Direct dependencies of `name` in declared order.
    pub fn direct_dependencies(&self, name: &str) -> Vec<String> {
        self.direct_indices(name).into_iter().map(|idx| self.graph[idx].clone()).collect()
    }

    fn direct_indices(&self, name: &str) -> Vec<NodeIndex> {
        match self.node_map.get(name) {
            // petgraph lists neighbors most recent edge first
            Some(&idx) => {
                let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
                neighbors.reverse();
                neighbors
            }
            None => Vec::new(),
        }
    }

    /// First cycle found, as the path that closes on itself.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        if !petgraph::algo::is_cyclic_directed(&self.graph) {
            return None;
        }

        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|idx| (idx, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                return Some(cycle.into_iter().map(|idx| self.graph[idx].clone()).collect());
            }
        }
        None
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.direct_indices(&self.graph[node]) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|&n| n == neighbor).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Fail with the first cycle found.
    pub fn detect_cycles(&self) -> Result<(), DependsError> {
        match self.find_cycle() {
            Some(cycle) => Err(DependsError::CircularDependency {
                chain: cycle.join(" → "),
            }),
            None => Ok(()),
        }
    }

    /// Dependencies-first order of everything reachable from `roots`.
    ///
    /// Dependencies are visited in declared order, so the result matches the
    /// order in which names become ready when every load completes in the
    /// order it started.
    pub fn load_order<S: AsRef<str>>(&self, roots: &[S]) -> Result<Vec<String>, DependsError> {
        self.detect_cycles()?;

        let mut order = Vec::new();
        let mut visited = HashSet::new();
        for root in roots {
            if let Some(&idx) = self.node_map.get(root.as_ref()) {
                self.post_order(idx, &mut visited, &mut order);
            }
        }
        Ok(order)
    }

    fn post_order(&self, node: NodeIndex, visited: &mut HashSet<NodeIndex>, order: &mut Vec<String>) {
        if !visited.insert(node) {
            return;
        }
        for dependency in self.direct_indices(&self.graph[node]) {
            self.post_order(dependency, visited, order);
        }
        order.push(self.graph[node].clone());
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of names in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Render the dependency tree under `root`.
    pub fn to_tree_string(&self, root: &str) -> String {
        let mut result = format!("{root}\n");
        let mut visited = HashSet::new();
        visited.insert(root.to_string());

        let deps = self.direct_dependencies(root);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, &mut result, "", i == deps.len() - 1, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        name: &str,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<String>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        result.push_str(&format!("{prefix}{connector}{name}\n"));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if !visited.insert(name.to_string()) {
            result.push_str(&format!("{child_prefix}└── (circular reference)\n"));
            return;
        }

        let deps = self.direct_dependencies(name);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, result, &child_prefix, i == deps.len() - 1, visited);
        }
        visited.remove(name);
    }
}
