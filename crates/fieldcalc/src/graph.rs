//! Dependency graph between formula fields
//!
//! Built from a [`FieldCatalog`] by asking the engine which fields each
//! formula reads. The graph only answers ordering questions (what to
//! recompute after a change, and in which order) and detects cycles;
//! evaluating the formulas stays with the caller.
//!
//! # Example
//!
//! ```rust
//! use fieldcalc::prelude::*;
//!
//! let catalog = FieldCatalog::from_fields([
//!     FieldDefinition::new("price", "Price", FieldType::Number),
//!     FieldDefinition::computed("net", "Net", FieldType::Number, "{Price} * 0.8"),
//!     FieldDefinition::computed("tax", "Tax", FieldType::Number, "{Net} * 0.2"),
//! ]).unwrap();
//!
//! let graph = FormulaGraph::build(&catalog, &FormulaEngine::default()).unwrap();
//! graph.validate().unwrap();
//!
//! let order = graph.recalc_order(&[FieldId::new("price")]);
//! assert_eq!(order, vec![FieldId::new("net"), FieldId::new("tax")]);
//! ```

use ahash::AHashMap;
use fieldcalc_core::{Error, FieldCatalog, FieldId, Result};
use fieldcalc_formula::{FormulaEngine, FormulaError};

/// Dependency graph for formula fields
///
/// Field ids live in an arena in catalog order; edges are stored as arena
/// indexes in both directions.
#[derive(Debug, Clone, Default)]
pub struct FormulaGraph {
    /// Arena of field ids
    nodes: Vec<FieldId>,
    /// Field id → arena index
    index: AHashMap<FieldId, usize>,
    /// Whether the field carries a formula
    computed: Vec<bool>,
    /// Field → fields it reads (precedents)
    precedents: Vec<Vec<usize>>,
    /// Field → fields that read it (dependents)
    dependents: Vec<Vec<usize>>,
}

impl FormulaGraph {
    /// Build the graph for every computed field in the catalog
    ///
    /// Fails with [`Error::FormulaParse`] if any formula does not validate.
    pub fn build(catalog: &FieldCatalog, engine: &FormulaEngine) -> Result<Self> {
        let mut graph = Self::default();
        for field in catalog {
            graph.insert_node(field.id.clone(), field.is_computed());
        }

        for field in catalog.computed_fields() {
            let Some(formula) = field.formula.as_deref() else {
                continue;
            };

            let parse_error =
                |e: FormulaError| Error::FormulaParse(format!("{}: {}", field.display_name, e));
            engine.validate_syntax(formula).map_err(parse_error)?;
            let deps = engine.dependencies(formula, catalog).map_err(parse_error)?;

            let Some(&dependent) = graph.index.get(&field.id) else {
                continue;
            };
            let mut precedents: Vec<usize> = deps
                .iter()
                .filter_map(|id| graph.index.get(id).copied())
                .collect();
            precedents.sort_unstable();

            for precedent in precedents {
                graph.add_edge(precedent, dependent);
            }
        }

        tracing::debug!(
            fields = graph.nodes.len(),
            edges = graph.edge_count(),
            "built formula graph"
        );
        Ok(graph)
    }

    fn insert_node(&mut self, id: FieldId, computed: bool) {
        let index = self.nodes.len();
        self.index.insert(id.clone(), index);
        self.nodes.push(id);
        self.computed.push(computed);
        self.precedents.push(Vec::new());
        self.dependents.push(Vec::new());
    }

    /// Add a dependency: dependent reads precedent
    fn add_edge(&mut self, precedent: usize, dependent: usize) {
        self.dependents[precedent].push(dependent);
        self.precedents[dependent].push(precedent);
    }

    /// Number of fields in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no fields
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of dependency edges
    pub fn edge_count(&self) -> usize {
        self.precedents.iter().map(Vec::len).sum()
    }

    /// Fields whose formulas read the given field directly
    pub fn dependents_of(&self, id: &FieldId) -> impl Iterator<Item = &FieldId> + '_ {
        self.neighbours(&self.dependents, id)
    }

    /// Fields the given field's formula reads directly
    pub fn precedents_of(&self, id: &FieldId) -> impl Iterator<Item = &FieldId> + '_ {
        self.neighbours(&self.precedents, id)
    }

    fn neighbours<'a>(
        &'a self,
        edges: &'a [Vec<usize>],
        id: &FieldId,
    ) -> impl Iterator<Item = &'a FieldId> + 'a {
        self.index
            .get(id)
            .into_iter()
            .flat_map(move |&i| edges[i].iter().map(move |&j| &self.nodes[j]))
    }

    /// Find a circular reference between formula fields
    ///
    /// Returns the fields on the cycle in dependency order, starting with the
    /// first one reached in catalog order: `[a, b]` means `a` reads `b` and
    /// `b` reads `a`.
    pub fn find_cycle(&self) -> Option<Vec<FieldId>> {
        let mut visited = vec![false; self.nodes.len()];
        let mut in_stack = vec![false; self.nodes.len()];
        let mut path = Vec::new();

        for start in 0..self.nodes.len() {
            if let Some(cycle) = self.detect_cycle(start, &mut visited, &mut in_stack, &mut path) {
                return Some(cycle.into_iter().map(|i| self.nodes[i].clone()).collect());
            }
        }

        None
    }

    fn detect_cycle(
        &self,
        node: usize,
        visited: &mut [bool],
        in_stack: &mut [bool],
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        if in_stack[node] {
            let start = path.iter().position(|&n| n == node).unwrap_or(0);
            return Some(path[start..].to_vec());
        }
        if visited[node] {
            return None;
        }

        visited[node] = true;
        in_stack[node] = true;
        path.push(node);

        for &precedent in &self.precedents[node] {
            if let Some(cycle) = self.detect_cycle(precedent, visited, in_stack, path) {
                return Some(cycle);
            }
        }

        path.pop();
        in_stack[node] = false;
        None
    }

    /// Fail if the formulas contain a circular reference
    pub fn validate(&self) -> Result<()> {
        match self.find_cycle() {
            Some(cycle) => {
                let mut names: Vec<String> = cycle.iter().map(ToString::to_string).collect();
                if let Some(first) = names.first().cloned() {
                    names.push(first);
                }
                let path = names.join(" -> ");
                tracing::warn!(cycle = %path, "circular reference between formula fields");
                Err(Error::CircularReference(path))
            }
            None => Ok(()),
        }
    }

    /// Formula fields to recompute after the given fields change
    ///
    /// Includes every computed field that reads a changed field directly or
    /// transitively, plus changed fields that are themselves computed.
    /// Precedents come before dependents. Unknown ids are ignored, and
    /// fields on a cycle are visited once.
    pub fn recalc_order(&self, changed: &[FieldId]) -> Vec<FieldId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut in_stack = vec![false; self.nodes.len()];
        let mut post_order = Vec::new();

        for id in changed {
            if let Some(&i) = self.index.get(id) {
                self.topological_sort(i, &mut post_order, &mut visited, &mut in_stack);
            }
        }

        post_order
            .into_iter()
            .rev()
            .filter(|&i| self.computed[i])
            .map(|i| self.nodes[i].clone())
            .collect()
    }

    /// Every formula field, precedents before dependents
    ///
    /// Fails with [`Error::CircularReference`] if no such order exists.
    pub fn evaluation_order(&self) -> Result<Vec<FieldId>> {
        self.validate()?;
        Ok(self.recalc_order(&self.nodes))
    }

    /// Topological sort helper (DFS over dependents, post-order)
    fn topological_sort(
        &self,
        node: usize,
        result: &mut Vec<usize>,
        visited: &mut [bool],
        in_stack: &mut [bool],
    ) {
        if visited[node] || in_stack[node] {
            return;
        }

        in_stack[node] = true;

        // Visit all dependents first
        for &dependent in &self.dependents[node] {
            self.topological_sort(dependent, result, visited, in_stack);
        }

        in_stack[node] = false;
        visited[node] = true;
        result.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcalc_core::{FieldDefinition, FieldType};
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> FieldId {
        FieldId::new(s)
    }

    fn graph(fields: Vec<FieldDefinition>) -> FormulaGraph {
        let catalog = FieldCatalog::from_fields(fields).unwrap();
        FormulaGraph::build(&catalog, &FormulaEngine::default()).unwrap()
    }

    #[test]
    fn test_edges() {
        let g = graph(vec![
            FieldDefinition::new("a", "A", FieldType::Number),
            FieldDefinition::new("b", "B", FieldType::Number),
            FieldDefinition::computed("c", "C", FieldType::Number, "{A} + {B} + {A}"),
        ]);

        assert_eq!(g.len(), 3);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.precedents_of(&id("c")).collect::<Vec<_>>(), vec![&id("a"), &id("b")]);
        assert_eq!(g.dependents_of(&id("a")).collect::<Vec<_>>(), vec![&id("c")]);
        assert_eq!(g.dependents_of(&id("c")).count(), 0);
        assert_eq!(g.dependents_of(&id("nope")).count(), 0);
    }

    #[test]
    fn test_two_field_cycle() {
        let g = graph(vec![
            FieldDefinition::computed("a", "A", FieldType::Number, "{B} + 1"),
            FieldDefinition::computed("b", "B", FieldType::Number, "{A} + 1"),
        ]);

        assert_eq!(g.find_cycle(), Some(vec![id("a"), id("b")]));
        let err = g.validate().unwrap_err();
        assert!(matches!(err, Error::CircularReference(ref p) if p == "a -> b -> a"));
        assert!(g.evaluation_order().is_err());
    }

    #[test]
    fn test_self_reference() {
        let g = graph(vec![FieldDefinition::computed(
            "a",
            "A",
            FieldType::Number,
            "{A} * 2",
        )]);
        assert_eq!(g.find_cycle(), Some(vec![id("a")]));
    }

    #[test]
    fn test_cycle_reached_through_acyclic_prefix() {
        let g = graph(vec![
            FieldDefinition::computed("a", "A", FieldType::Number, "{B}"),
            FieldDefinition::computed("b", "B", FieldType::Number, "{C}"),
            FieldDefinition::computed("c", "C", FieldType::Number, "{B}"),
        ]);
        assert_eq!(g.find_cycle(), Some(vec![id("b"), id("c")]));
    }

    #[test]
    fn test_recalc_order_diamond() {
        // base -> left, right -> total
        let g = graph(vec![
            FieldDefinition::computed("total", "Total", FieldType::Number, "{Left} + {Right}"),
            FieldDefinition::computed("left", "Left", FieldType::Number, "{Base} * 2"),
            FieldDefinition::computed("right", "Right", FieldType::Number, "{Base} * 3"),
            FieldDefinition::new("base", "Base", FieldType::Number),
            FieldDefinition::new("other", "Other", FieldType::Number),
        ]);

        let order = g.recalc_order(&[id("base")]);
        assert_eq!(order.len(), 3);
        let pos = |s: &str| order.iter().position(|f| f == &id(s)).unwrap();
        assert!(pos("left") < pos("total"));
        assert!(pos("right") < pos("total"));

        assert!(g.recalc_order(&[id("other")]).is_empty());
        assert_eq!(g.recalc_order(&[id("left")]), vec![id("left"), id("total")]);
        assert!(g.recalc_order(&[id("missing")]).is_empty());
    }

    #[test]
    fn test_evaluation_order() {
        let g = graph(vec![
            FieldDefinition::computed("c", "C", FieldType::Number, "{B} + 1"),
            FieldDefinition::computed("b", "B", FieldType::Number, "{A} + 1"),
            FieldDefinition::new("a", "A", FieldType::Number),
        ]);
        assert_eq!(g.evaluation_order().unwrap(), vec![id("b"), id("c")]);
    }

    #[test]
    fn test_invalid_formula_fails_build() {
        let catalog = FieldCatalog::from_fields([
            FieldDefinition::new("a", "A", FieldType::Number),
            FieldDefinition::computed("b", "B", FieldType::Number, "{A} + ("),
        ])
        .unwrap();
        let err = FormulaGraph::build(&catalog, &FormulaEngine::default()).unwrap_err();
        assert!(matches!(err, Error::FormulaParse(ref m) if m.starts_with("B: ")));
    }
}
