//! Construction Validator
//!
//! Performs all structural validation at construction time. Derivation never
//! re-checks the graph; a [`Model`] is only ever produced from here.

use crate::element::{Element, ElementId, ElementSpec};
use crate::error::ModelError;
use crate::model::Model;
use crate::vocabulary::Dimension;
use std::collections::{HashMap, HashSet};

/// Validate specs into a sealed model.
///
/// Order of checks:
/// 1. Parent and dependency names resolve, and none points at its own element
/// 2. Repeated dependencies collapse onto their first declaration
/// 3. Parent edges (composite depends on constituent) are appended
/// 4. The combined dependency graph is acyclic
pub(crate) fn validate(
    specs: &[ElementSpec],
    by_name: &HashMap<String, ElementId>,
) -> Result<Model, ModelError> {
    let resolve = |spec: &ElementSpec, target: &str| -> Result<ElementId, ModelError> {
        let id = by_name
            .get(target)
            .copied()
            .ok_or_else(|| ModelError::DanglingReference {
                element: spec.name.clone(),
                missing: target.to_string(),
            })?;
        if target == spec.name {
            return Err(ModelError::SelfDependency {
                element: spec.name.clone(),
            });
        }
        Ok(id)
    };

    let mut parents = Vec::with_capacity(specs.len());
    let mut edges: Vec<Vec<ElementId>> = Vec::with_capacity(specs.len());

    for spec in specs {
        let parent = spec
            .parent
            .as_deref()
            .map(|name| resolve(spec, name))
            .transpose()?;
        parents.push(parent);

        let mut seen = HashSet::with_capacity(spec.depends_on.len());
        let mut deps = Vec::with_capacity(spec.depends_on.len());
        for name in &spec.depends_on {
            let id = resolve(spec, name)?;
            if seen.insert(id) {
                deps.push(id);
            } else {
                tracing::debug!(element = %spec.name, dependency = %name, "repeated dependency ignored");
            }
        }
        edges.push(deps);
    }

    for (child, parent) in parents.iter().enumerate() {
        if let Some(parent) = parent {
            let child = ElementId(child);
            if !edges[parent.index()].contains(&child) {
                edges[parent.index()].push(child);
            }
        }
    }

    if let Some(cycle) = find_cycle(&edges) {
        let cycle: Vec<String> = cycle
            .into_iter()
            .map(|id| specs[id.index()].name.clone())
            .collect();
        return Err(ModelError::CyclicDependency { cycle });
    }

    let elements = specs
        .iter()
        .zip(parents)
        .zip(edges)
        .enumerate()
        .map(|(index, ((spec, parent), depends_on))| {
            let mut own_needs: [Option<_>; Dimension::COUNT] = Default::default();
            for (dimension, need) in &spec.needs {
                own_needs[dimension.index()] = Some(need.clone());
            }
            Element {
                id: ElementId(index),
                name: spec.name.clone(),
                category: spec.category,
                description: spec.description.clone(),
                remark: spec.remark.clone(),
                hidden: spec.hidden,
                parent,
                own_needs,
                depends_on,
            }
        })
        .collect();

    let model = Model::from_validated(elements)?;
    tracing::debug!(elements = model.len(), "model validated");
    Ok(model)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Three-color DFS over the adjacency lists.
///
/// Returns the nodes of the first cycle found, starting at the node the
/// back edge points to. Roots are tried in id order and neighbours in
/// declaration order, so the reported cycle is deterministic. Iterative to
/// keep deep dependency chains off the call stack.
fn find_cycle(edges: &[Vec<ElementId>]) -> Option<Vec<ElementId>> {
    let mut color = vec![Color::White; edges.len()];
    let mut path: Vec<ElementId> = Vec::new();
    // (node, index of next neighbour to visit)
    let mut stack: Vec<(ElementId, usize)> = Vec::new();

    for root in 0..edges.len() {
        if color[root] != Color::White {
            continue;
        }
        let root = ElementId(root);
        color[root.index()] = Color::Gray;
        path.push(root);
        stack.push((root, 0));

        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            if let Some(&neighbour) = edges[node.index()].get(*next) {
                *next += 1;
                match color[neighbour.index()] {
                    Color::White => {
                        color[neighbour.index()] = Color::Gray;
                        path.push(neighbour);
                        stack.push((neighbour, 0));
                    }
                    Color::Gray => {
                        let start = path.iter().position(|&n| n == neighbour).unwrap_or(0);
                        return Some(path[start..].to_vec());
                    }
                    Color::Black => {}
                }
            } else {
                color[node.index()] = Color::Black;
                path.pop();
                stack.pop();
            }
        }
    }

    None
}
