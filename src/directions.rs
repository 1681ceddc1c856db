//! Merge directions: which branches propagate into which
//!
//! The graph is an immutable value, validated once when it is built. Live
//! updates replace it wholesale together with the rest of the configuration.

use crate::error::{Error, Result};
use crate::types::BranchName;
use std::collections::{HashMap, HashSet};

/// Upper bound on configured merge directions
pub const MAX_MERGE_DIRECTIONS: usize = 100;

/// A `source -> destination` propagation rule
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeEdge {
    /// Branch whose pushes are propagated
    pub source: BranchName,
    /// Branch receiving the propagated changes
    pub destination: BranchName,
}

impl MergeEdge {
    /// Create an edge
    pub fn new(source: impl Into<BranchName>, destination: impl Into<BranchName>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Validated, acyclic set of merge directions
///
/// Edges keep the order in which they were first configured; duplicates are
/// collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeDirectionGraph {
    edges: Vec<MergeEdge>,
}

impl MergeDirectionGraph {
    /// Build a graph, rejecting oversized or cyclic configurations.
    pub fn new(edges: impl IntoIterator<Item = MergeEdge>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for edge in edges {
            if seen.insert(edge.clone()) {
                unique.push(edge);
            }
        }

        if unique.len() > MAX_MERGE_DIRECTIONS {
            return Err(Error::TooManyMergeDirections {
                count: unique.len(),
                max: MAX_MERGE_DIRECTIONS,
            });
        }

        let graph = Self { edges: unique };
        if let Some(cycle) = graph.find_cycle() {
            let path: Vec<&str> = cycle.iter().map(BranchName::as_str).collect();
            return Err(Error::MergeDirectionCycle(path.join(" -> ")));
        }
        Ok(graph)
    }

    /// Destinations configured for `branch`, in configuration order
    pub fn destinations_of(&self, branch: &BranchName) -> Vec<BranchName> {
        self.edges
            .iter()
            .filter(|e| &e.source == branch)
            .map(|e| e.destination.clone())
            .collect()
    }

    /// Whether some direction merges into `branch`
    pub fn is_destination(&self, branch: &BranchName) -> bool {
        self.edges.iter().any(|e| &e.destination == branch)
    }

    /// All edges, in configuration order
    pub fn edges(&self) -> &[MergeEdge] {
        &self.edges
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether no directions are configured
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Render as a Graphviz digraph
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph merge_directions {\n");
        for edge in &self.edges {
            dot.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                edge.source, edge.destination
            ));
        }
        dot.push('}');
        dot
    }

    /// Depth-first search for a directed cycle, returning it as a closed path.
    fn find_cycle(&self) -> Option<Vec<BranchName>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            InProgress,
            Done,
        }

        fn visit<'a>(
            node: &'a BranchName,
            adjacency: &HashMap<&'a BranchName, Vec<&'a BranchName>>,
            marks: &mut HashMap<&'a BranchName, Mark>,
            stack: &mut Vec<&'a BranchName>,
        ) -> Option<Vec<BranchName>> {
            marks.insert(node, Mark::InProgress);
            stack.push(node);
            for &next in adjacency.get(node).into_iter().flatten() {
                match marks.get(next) {
                    Some(Mark::InProgress) => {
                        let start = stack.iter().position(|n| *n == next).unwrap_or(0);
                        let mut cycle: Vec<BranchName> =
                            stack[start..].iter().map(|n| (*n).clone()).collect();
                        cycle.push(next.clone());
                        return Some(cycle);
                    }
                    Some(Mark::Done) => {}
                    None => {
                        if let Some(cycle) = visit(next, adjacency, marks, stack) {
                            return Some(cycle);
                        }
                    }
                }
            }
            stack.pop();
            marks.insert(node, Mark::Done);
            None
        }

        let mut adjacency: HashMap<&BranchName, Vec<&BranchName>> = HashMap::new();
        for edge in &self.edges {
            adjacency
                .entry(&edge.source)
                .or_default()
                .push(&edge.destination);
        }

        let mut marks = HashMap::new();
        for edge in &self.edges {
            if !marks.contains_key(&edge.source) {
                let mut stack = Vec::new();
                if let Some(cycle) = visit(&edge.source, &adjacency, &mut marks, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}

impl std::fmt::Display for MergeDirectionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let records: Vec<String> = self
            .edges
            .iter()
            .map(|e| format!("{}->{}", e.source, e.destination))
            .collect();
        write!(f, "[{}]", records.join(", "))
    }
}
