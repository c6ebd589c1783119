//! Validated Model - Proof-Carrying Type
//!
//! A [`Model`] can only be obtained from
//! [`ModelBuilder::validate`](crate::ModelBuilder::validate). Holding one
//! proves that names are unique, every reference resolves, and the
//! dependency graph is acyclic, so derivation and export never re-check.

use crate::element::{Category, Element, ElementId};
use crate::error::ModelError;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Sealed, immutable arena of structural elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    elements: Vec<Element>,
    by_name: HashMap<String, ElementId>,
    by_category: [Vec<ElementId>; Category::COUNT],
    evaluation_order: Vec<ElementId>,
}

impl Model {
    /// Assemble a model from elements that already passed validation.
    ///
    /// Element `i` must carry `ElementId(i)`.
    pub(crate) fn from_validated(elements: Vec<Element>) -> Result<Self, ModelError> {
        let mut by_name = HashMap::with_capacity(elements.len());
        let mut by_category: [Vec<ElementId>; Category::COUNT] = Default::default();
        for element in &elements {
            by_name.insert(element.name.clone(), element.id);
            by_category[element.category.index()].push(element.id);
        }

        let evaluation_order = evaluation_order(&elements)?;

        Ok(Self {
            elements,
            by_name,
            by_category,
            evaluation_order,
        })
    }

    /// Number of elements
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the model has no elements
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All elements in insertion order
    #[inline]
    pub fn elements(&self) -> impl ExactSizeIterator<Item = &Element> + '_ {
        self.elements.iter()
    }

    /// Element by id
    #[inline]
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.index())
    }

    /// Element by id, for ids known to come from this model
    #[inline]
    pub(crate) fn node(&self, id: ElementId) -> &Element {
        &self.elements[id.index()]
    }

    /// Element by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Element> {
        self.by_name.get(name).and_then(|id| self.element(*id))
    }

    /// Id of the element with this name
    #[inline]
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<ElementId> {
        self.by_name.get(name).copied()
    }

    /// Whether the id belongs to this model
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        id.index() < self.elements.len()
    }

    /// Elements of one category, in insertion order
    pub fn category(&self, category: Category) -> impl ExactSizeIterator<Item = &Element> + '_ {
        self.by_category[category.index()]
            .iter()
            .map(move |id| &self.elements[id.index()])
    }

    /// Dependencies-first order: every element appears after all elements it depends on
    #[inline]
    #[must_use]
    pub fn evaluation_order(&self) -> &[ElementId] {
        &self.evaluation_order
    }

    /// Hierarchy depth: 0 for elements without parent
    #[must_use]
    pub fn depth(&self, id: ElementId) -> usize {
        self.ancestors(id).count()
    }

    /// Whether the element or any of its ancestors is marked hidden
    #[must_use]
    pub fn is_hidden(&self, id: ElementId) -> bool {
        self.element(id).is_some_and(|e| e.hidden)
            || self
                .ancestors(id)
                .any(|ancestor| self.elements[ancestor.index()].hidden)
    }

    /// Ancestors from the direct parent upwards
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut current = self.element(id).and_then(|e| e.parent);
        std::iter::from_fn(move || {
            let next = current?;
            current = self.elements[next.index()].parent;
            Some(next)
        })
    }

    /// Every element reachable through dependency edges, in first-reach
    /// (preorder) order, excluding `id` itself
    #[must_use]
    pub fn reachable(&self, id: ElementId) -> Vec<ElementId> {
        let Some(start) = self.element(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        seen.insert(id);
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = start.depends_on.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            stack.extend(self.elements[next.index()].depends_on.iter().rev().copied());
        }
        out
    }
}

/// Topological order with dependencies first
fn evaluation_order(elements: &[Element]) -> Result<Vec<ElementId>, ModelError> {
    let mut graph: DiGraph<ElementId, ()> = DiGraph::with_capacity(elements.len(), 0);
    let nodes: Vec<NodeIndex> = elements.iter().map(|e| graph.add_node(e.id)).collect();
    for element in elements {
        for dep in &element.depends_on {
            // dependency -> dependent
            graph.add_edge(nodes[dep.index()], nodes[element.id.index()], ());
        }
    }

    toposort(&graph, None)
        .map(|order| order.into_iter().map(|n| graph[n]).collect())
        .map_err(|cycle| ModelError::CyclicDependency {
            cycle: vec![elements[graph[cycle.node_id()].index()].name.clone()],
        })
}

#[cfg(test)]
mod tests {
    use crate::element::{Category, ElementSpec};
    use crate::ModelBuilder;

    fn spec(name: &str, category: Category) -> ElementSpec {
        ElementSpec::builder(name, category).build()
    }

    #[test]
    fn evaluation_order_puts_dependencies_first() {
        let mut builder = ModelBuilder::new();
        builder
            .add(
                ElementSpec::builder("app", Category::Application)
                    .depends_on("proc")
                    .build(),
            )
            .unwrap();
        builder
            .add(
                ElementSpec::builder("proc", Category::BusinessProcess)
                    .depends_on("info")
                    .build(),
            )
            .unwrap();
        builder.add(spec("info", Category::Information)).unwrap();

        let model = builder.validate().unwrap();
        let order = model.evaluation_order();
        let pos = |name: &str| {
            let id = model.id_of(name).unwrap();
            order.iter().position(|x| *x == id).unwrap()
        };

        assert_eq!(order.len(), 3);
        assert!(pos("info") < pos("proc"));
        assert!(pos("proc") < pos("app"));
    }

    #[test]
    fn category_view_keeps_insertion_order() {
        let mut builder = ModelBuilder::new();
        builder.add(spec("b", Category::Information)).unwrap();
        builder.add(spec("x", Category::Room)).unwrap();
        builder.add(spec("a", Category::Information)).unwrap();

        let model = builder.validate().unwrap();
        let names: Vec<_> = model
            .category(Category::Information)
            .map(|e| e.name())
            .collect();

        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(model.category(Category::Building).len(), 0);
    }

    #[test]
    fn hierarchy_depth_and_hidden_inheritance() {
        let mut builder = ModelBuilder::new();
        builder
            .add(
                ElementSpec::builder("site", Category::Building)
                    .hidden(true)
                    .build(),
            )
            .unwrap();
        builder
            .add(
                ElementSpec::builder("wing", Category::Building)
                    .parent("site")
                    .build(),
            )
            .unwrap();
        builder
            .add(
                ElementSpec::builder("annex", Category::Building)
                    .parent("wing")
                    .build(),
            )
            .unwrap();
        builder.add(spec("other", Category::Building)).unwrap();

        let model = builder.validate().unwrap();
        let id = |n: &str| model.id_of(n).unwrap();

        assert_eq!(model.depth(id("site")), 0);
        assert_eq!(model.depth(id("annex")), 2);
        assert!(model.is_hidden(id("annex")));
        assert!(!model.element(id("annex")).unwrap().hidden_flag());
        assert!(!model.is_hidden(id("other")));
        assert_eq!(
            model.ancestors(id("annex")).collect::<Vec<_>>(),
            vec![id("wing"), id("site")]
        );
    }

    #[test]
    fn reachable_is_preorder_and_deduplicated() {
        let mut builder = ModelBuilder::new();
        builder
            .add(
                ElementSpec::builder("top", Category::Room)
                    .depends_on_all(["left", "right"])
                    .build(),
            )
            .unwrap();
        builder
            .add(
                ElementSpec::builder("left", Category::Infrastructure)
                    .depends_on("shared")
                    .build(),
            )
            .unwrap();
        builder
            .add(
                ElementSpec::builder("right", Category::Infrastructure)
                    .depends_on("shared")
                    .build(),
            )
            .unwrap();
        builder.add(spec("shared", Category::Application)).unwrap();

        let model = builder.validate().unwrap();
        let names: Vec<_> = model
            .reachable(model.id_of("top").unwrap())
            .into_iter()
            .map(|id| model.element(id).unwrap().name())
            .collect();

        assert_eq!(names, vec!["left", "shared", "right"]);
    }
}
