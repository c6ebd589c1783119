//! Derivation Engine
//!
//! Maximum-principle propagation over a validated [`Model`]: an element's
//! derived level in a dimension is the highest of its own explicit need, its
//! parent's explicit need, and the derived needs of everything it depends on.
//!
//! Each [`Derivation`] is one run with its own memo table keyed by
//! `(ElementId, Dimension)`. Every key is computed exactly once, even when a
//! shared dependency is requested concurrently from several dependents.
//!
//! # Example
//!
//! ```rust,ignore
//! let model = builder.validate()?;
//! let run = Derivation::new(&model);
//! let need = run.derive(app_id, Dimension::Confidentiality)?;
//! println!("{}: {}", need.level(), need.justification().describe(&model));
//! ```

use crate::element::ElementId;
use crate::error::DeriveError;
use crate::model::Model;
use crate::vocabulary::{Dimension, ProtectionLevel};
use dashmap::DashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Why a derived level was chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Justification {
    /// The element's own explicit need
    Own {
        /// Analyst rationale
        rationale: String,
    },
    /// Explicit need of the enclosing element
    Inherited {
        /// Element the need is assigned to
        parent: ElementId,
        /// Analyst rationale
        rationale: String,
    },
    /// Propagated from a dependency
    Dependency {
        /// Direct dependency that supplied the maximum
        via: ElementId,
        /// Element where the winning need is explicitly assigned
        origin: ElementId,
        /// Analyst rationale at the origin
        rationale: String,
        /// Path from this element to the origin, both inclusive
        trace: Vec<ElementId>,
    },
    /// Nothing assigned anywhere below; level is the scale default
    NoneAssigned,
}

impl Justification {
    /// Rationale text of the winning explicit need
    #[must_use]
    pub fn rationale(&self) -> Option<&str> {
        match self {
            Self::Own { rationale }
            | Self::Inherited { rationale, .. }
            | Self::Dependency { rationale, .. } => Some(rationale),
            Self::NoneAssigned => None,
        }
    }

    /// Human-readable form using element names from `model`
    #[must_use]
    pub fn describe(&self, model: &Model) -> String {
        let name = |id: &ElementId| {
            model
                .element(*id)
                .map_or_else(|| id.to_string(), |e| e.name().to_string())
        };
        match self {
            Self::Own { rationale } => format!("own: {rationale}"),
            Self::Inherited { parent, rationale } => {
                format!("inherited from {}: {rationale}", name(parent))
            }
            Self::Dependency {
                trace, rationale, ..
            } => {
                let path: Vec<String> = trace.iter().map(name).collect();
                format!("{}: {rationale}", path.join(" → "))
            }
            Self::NoneAssigned => "none assigned".to_string(),
        }
    }
}

/// Engine-computed need for one element in one dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedNeed {
    level: ProtectionLevel,
    justification: Justification,
}

impl DerivedNeed {
    fn none_assigned() -> Self {
        Self {
            level: ProtectionLevel::default(),
            justification: Justification::NoneAssigned,
        }
    }

    /// Derived level
    #[inline]
    #[must_use]
    pub fn level(&self) -> ProtectionLevel {
        self.level
    }

    /// Why this level was chosen
    #[inline]
    #[must_use]
    pub fn justification(&self) -> &Justification {
        &self.justification
    }

    /// Whether any explicit need contributed
    #[inline]
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        !matches!(self.justification, Justification::NoneAssigned)
    }

    /// Element holding the winning explicit need, seen from `this`
    #[must_use]
    pub fn origin(&self, this: ElementId) -> Option<ElementId> {
        match &self.justification {
            Justification::Own { .. } => Some(this),
            Justification::Inherited { parent, .. } => Some(*parent),
            Justification::Dependency { origin, .. } => Some(*origin),
            Justification::NoneAssigned => None,
        }
    }

    /// Justification for `dependent` when this need (of `dep`) wins there
    fn propagate(&self, dependent: ElementId, dep: ElementId) -> Option<Justification> {
        let (origin, rationale, trace) = match &self.justification {
            Justification::Own { rationale } => (dep, rationale, vec![dependent, dep]),
            Justification::Inherited { parent, rationale } => {
                (*parent, rationale, vec![dependent, dep, *parent])
            }
            Justification::Dependency {
                origin,
                rationale,
                trace,
                ..
            } => {
                let mut path = Vec::with_capacity(trace.len() + 1);
                path.push(dependent);
                path.extend_from_slice(trace);
                (*origin, rationale, path)
            }
            Justification::NoneAssigned => return None,
        };
        Some(Justification::Dependency {
            via: dep,
            origin,
            rationale: rationale.clone(),
            trace,
        })
    }
}

/// Keep the first candidate among those with the strictly greatest level
fn consider(
    best: &mut Option<DerivedNeed>,
    level: ProtectionLevel,
    justification: impl FnOnce() -> Justification,
) {
    if best.as_ref().map_or(true, |current| level > current.level) {
        *best = Some(DerivedNeed {
            level,
            justification: justification(),
        });
    }
}

type MemoCell = Arc<OnceLock<Arc<DerivedNeed>>>;

/// One derivation run over a validated model
#[derive(Debug)]
pub struct Derivation<'m> {
    model: &'m Model,
    memo: DashMap<(ElementId, Dimension), MemoCell>,
    evaluations: AtomicUsize,
}

impl<'m> Derivation<'m> {
    /// Start a run with an empty memo table
    #[must_use]
    pub fn new(model: &'m Model) -> Self {
        Self {
            model,
            memo: DashMap::with_capacity(model.len() * Dimension::COUNT),
            evaluations: AtomicUsize::new(0),
        }
    }

    /// The model this run derives over
    #[inline]
    #[must_use]
    pub fn model(&self) -> &'m Model {
        self.model
    }

    /// Number of `(element, dimension)` evaluations performed so far.
    ///
    /// Memo hits are not counted, so after a complete run this equals
    /// `elements * dimensions`.
    #[inline]
    #[must_use]
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Derived need of one element in one dimension.
    ///
    /// On a memo miss the element's dependency closure is evaluated first,
    /// dependencies before dependents, so chain depth never reaches the call
    /// stack.
    ///
    /// # Errors
    /// [`DeriveError::UnknownElement`] if `id` is not from this run's model.
    pub fn derive(
        &self,
        id: ElementId,
        dimension: Dimension,
    ) -> Result<Arc<DerivedNeed>, DeriveError> {
        if !self.model.contains(id) {
            return Err(DeriveError::UnknownElement(id));
        }
        if !self.is_memoized(id, dimension) {
            self.warm(id, dimension);
        }
        Ok(self.derive_known(id, dimension))
    }

    fn is_memoized(&self, id: ElementId, dimension: Dimension) -> bool {
        self.memo
            .get(&(id, dimension))
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Evaluate every unmemoized element below `id` in post-order.
    ///
    /// Explicit stack of `(node, next dependency index)`; each node is
    /// evaluated once all of its dependencies are memoized.
    fn warm(&self, id: ElementId, dimension: Dimension) {
        let mut visited = HashSet::new();
        visited.insert(id);
        let mut stack: Vec<(ElementId, usize)> = vec![(id, 0)];

        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            if let Some(&dep) = self.model.node(node).depends_on().get(*next) {
                *next += 1;
                if visited.insert(dep) && !self.is_memoized(dep, dimension) {
                    stack.push((dep, 0));
                }
            } else {
                stack.pop();
                self.derive_known(node, dimension);
            }
        }
    }

    /// Memoized evaluation; dependencies of `id` must already be memoized
    /// or the evaluation recurses into them.
    fn derive_known(&self, id: ElementId, dimension: Dimension) -> Arc<DerivedNeed> {
        // The shard guard must be released before computing: evaluation
        // reads other entries, possibly on the same shard.
        let cell: MemoCell = Arc::clone(self.memo.entry((id, dimension)).or_default().value());
        Arc::clone(cell.get_or_init(|| self.evaluate(id, dimension)))
    }

    fn evaluate(&self, id: ElementId, dimension: Dimension) -> Arc<DerivedNeed> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let element = self.model.node(id);
        let mut best: Option<DerivedNeed> = None;

        if let Some(need) = element.own_need(dimension) {
            consider(&mut best, need.level(), || Justification::Own {
                rationale: need.rationale().to_string(),
            });
        }

        if let Some(parent) = element.parent() {
            if let Some(need) = self.model.node(parent).own_need(dimension) {
                consider(&mut best, need.level(), || Justification::Inherited {
                    parent,
                    rationale: need.rationale().to_string(),
                });
            }
        }

        for &dep in element.depends_on() {
            let derived = self.derive_known(dep, dimension);
            if let Some(justification) = derived.propagate(id, dep) {
                consider(&mut best, derived.level, || justification);
            }
        }

        let result = best.unwrap_or_else(DerivedNeed::none_assigned);
        tracing::trace!(
            element = element.name(),
            %dimension,
            level = %result.level,
            "derived"
        );
        Arc::new(result)
    }

    /// Derive every element in every dimension, dependencies first
    #[tracing::instrument(level = "debug", skip(self), fields(elements = self.model.len()))]
    pub fn derive_all(&self) -> DerivedNeeds {
        for &id in self.model.evaluation_order() {
            for dimension in Dimension::ALL {
                self.derive_known(id, dimension);
            }
        }
        let table = self.collect();
        tracing::debug!(evaluations = self.evaluations(), "derivation complete");
        table
    }

    /// Derive every element in every dimension on the rayon pool.
    ///
    /// Elements are processed one dependency layer at a time, so every
    /// dependency is memoized before its dependents run. Produces the same
    /// table as [`Derivation::derive_all`]; shared dependencies are still
    /// evaluated once.
    #[tracing::instrument(level = "debug", skip(self), fields(elements = self.model.len()))]
    pub fn derive_all_parallel(&self) -> DerivedNeeds {
        let layers = layers(self.model);
        for layer in &layers {
            layer.par_iter().for_each(|&id| {
                for dimension in Dimension::ALL {
                    self.derive_known(id, dimension);
                }
            });
        }
        let table = self.collect();
        tracing::debug!(
            layers = layers.len(),
            evaluations = self.evaluations(),
            "parallel derivation complete"
        );
        table
    }

    fn collect(&self) -> DerivedNeeds {
        let rows = self
            .model
            .elements()
            .map(|e| Dimension::ALL.map(|dimension| self.derive_known(e.id(), dimension)))
            .collect();
        DerivedNeeds { rows }
    }
}

/// Group elements by longest dependency path below them.
///
/// Layer 0 has no dependencies; every dependency of an element in layer `n`
/// sits in a layer below `n`.
fn layers(model: &Model) -> Vec<Vec<ElementId>> {
    let mut layer_of = vec![0usize; model.len()];
    let mut layers: Vec<Vec<ElementId>> = Vec::new();
    for &id in model.evaluation_order() {
        let layer = model
            .node(id)
            .depends_on()
            .iter()
            .map(|dep| layer_of[dep.index()] + 1)
            .max()
            .unwrap_or(0);
        layer_of[id.index()] = layer;
        if layers.len() <= layer {
            layers.resize_with(layer + 1, Vec::new);
        }
        layers[layer].push(id);
    }
    layers
}

/// Derive a complete table for `model` in a fresh run
#[must_use]
pub fn derive_all(model: &Model) -> DerivedNeeds {
    Derivation::new(model).derive_all()
}

/// Complete derivation result, indexed by `(ElementId, Dimension)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedNeeds {
    rows: Vec<[Arc<DerivedNeed>; Dimension::COUNT]>,
}

impl DerivedNeeds {
    /// Number of elements covered
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Result for one element and dimension
    #[must_use]
    pub fn get(&self, id: ElementId, dimension: Dimension) -> Option<&DerivedNeed> {
        self.rows
            .get(id.index())
            .map(|row| &*row[dimension.index()])
    }

    /// All dimensions of one element, in [`Dimension::ALL`] order
    #[must_use]
    pub fn element(
        &self,
        id: ElementId,
    ) -> Option<impl Iterator<Item = (Dimension, &DerivedNeed)> + '_> {
        self.rows
            .get(id.index())
            .map(|row| Dimension::ALL.into_iter().zip(row.iter().map(|n| &**n)))
    }

    /// Every entry in element then dimension order
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, Dimension, &DerivedNeed)> + '_ {
        self.rows.iter().enumerate().flat_map(|(index, row)| {
            Dimension::ALL
                .into_iter()
                .zip(row.iter())
                .map(move |(dimension, need)| (ElementId(index), dimension, &**need))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Category, ElementSpec};
    use crate::vocabulary::ProtectionNeed;
    use crate::ModelBuilder;

    fn need(level: ProtectionLevel, why: &str) -> ProtectionNeed {
        ProtectionNeed::new(level, why)
    }

    fn chain_model() -> Model {
        let mut builder = ModelBuilder::new();
        builder
            .add(
                ElementSpec::builder("i1", Category::Information)
                    .need(
                        Dimension::Confidentiality,
                        need(ProtectionLevel::VeryHigh, "health records"),
                    )
                    .build(),
            )
            .unwrap();
        builder
            .add(
                ElementSpec::builder("p1", Category::BusinessProcess)
                    .depends_on("i1")
                    .build(),
            )
            .unwrap();
        builder
            .add(
                ElementSpec::builder("a1", Category::Application)
                    .depends_on("p1")
                    .build(),
            )
            .unwrap();
        builder.validate().unwrap()
    }

    #[test]
    fn propagates_through_chain_with_trace() {
        let model = chain_model();
        let run = Derivation::new(&model);
        let id = |n: &str| model.id_of(n).unwrap();

        let derived = run.derive(id("a1"), Dimension::Confidentiality).unwrap();

        assert_eq!(derived.level(), ProtectionLevel::VeryHigh);
        assert_eq!(
            derived.justification(),
            &Justification::Dependency {
                via: id("p1"),
                origin: id("i1"),
                rationale: "health records".into(),
                trace: vec![id("a1"), id("p1"), id("i1")],
            }
        );
        assert_eq!(derived.origin(id("a1")), Some(id("i1")));
        assert_eq!(
            derived.justification().describe(&model),
            "a1 → p1 → i1: health records"
        );
    }

    #[test]
    fn unassigned_dimension_defaults_to_lowest() {
        let model = chain_model();
        let run = Derivation::new(&model);

        let derived = run
            .derive(model.id_of("a1").unwrap(), Dimension::Integrity)
            .unwrap();

        assert_eq!(derived.level(), ProtectionLevel::Normal);
        assert_eq!(derived.justification(), &Justification::NoneAssigned);
        assert!(!derived.is_assigned());
        assert_eq!(derived.justification().describe(&model), "none assigned");
    }

    #[test]
    fn own_need_wins_ties_against_dependencies() {
        let mut builder = ModelBuilder::new();
        builder
            .add(
                ElementSpec::builder("dep", Category::Information)
                    .need(Dimension::Availability, need(ProtectionLevel::High, "dep"))
                    .build(),
            )
            .unwrap();
        builder
            .add(
                ElementSpec::builder("x", Category::BusinessProcess)
                    .need(Dimension::Availability, need(ProtectionLevel::High, "own"))
                    .depends_on("dep")
                    .build(),
            )
            .unwrap();
        let model = builder.validate().unwrap();

        let derived = Derivation::new(&model)
            .derive(model.id_of("x").unwrap(), Dimension::Availability)
            .unwrap();

        assert_eq!(
            derived.justification(),
            &Justification::Own {
                rationale: "own".into()
            }
        );
    }

    #[test]
    fn higher_dependency_beats_own_need() {
        let mut builder = ModelBuilder::new();
        builder
            .add(
                ElementSpec::builder("dep", Category::Information)
                    .need(Dimension::Integrity, need(ProtectionLevel::VeryHigh, "dep"))
                    .build(),
            )
            .unwrap();
        builder
            .add(
                ElementSpec::builder("x", Category::BusinessProcess)
                    .need(Dimension::Integrity, need(ProtectionLevel::High, "own"))
                    .depends_on("dep")
                    .build(),
            )
            .unwrap();
        let model = builder.validate().unwrap();

        let derived = Derivation::new(&model)
            .derive(model.id_of("x").unwrap(), Dimension::Integrity)
            .unwrap();

        assert_eq!(derived.level(), ProtectionLevel::VeryHigh);
        assert_eq!(derived.origin(model.id_of("x").unwrap()), model.id_of("dep"));
    }

    #[test]
    fn child_inherits_parent_own_need() {
        let mut builder = ModelBuilder::new();
        builder
            .add(
                ElementSpec::builder("records", Category::Information)
                    .need(
                        Dimension::Confidentiality,
                        need(ProtectionLevel::High, "all records"),
                    )
                    .build(),
            )
            .unwrap();
        builder
            .add(
                ElementSpec::builder("invoices", Category::Information)
                    .parent("records")
                    .build(),
            )
            .unwrap();
        let model = builder.validate().unwrap();
        let id = |n: &str| model.id_of(n).unwrap();
        let run = Derivation::new(&model);

        let child = run.derive(id("invoices"), Dimension::Confidentiality).unwrap();
        assert_eq!(child.level(), ProtectionLevel::High);
        assert_eq!(
            child.justification(),
            &Justification::Inherited {
                parent: id("records"),
                rationale: "all records".into()
            }
        );

        // the parent depends on its child, but its own need wins the tie
        let parent = run.derive(id("records"), Dimension::Confidentiality).unwrap();
        assert!(matches!(parent.justification(), Justification::Own { .. }));
    }

    #[test]
    fn parent_picks_up_child_maximum() {
        let mut builder = ModelBuilder::new();
        builder
            .add(ElementSpec::builder("server room", Category::Room).build())
            .unwrap();
        builder
            .add(
                ElementSpec::builder("rack", Category::Room)
                    .parent("server room")
                    .need(
                        Dimension::Availability,
                        need(ProtectionLevel::VeryHigh, "core switch"),
                    )
                    .build(),
            )
            .unwrap();
        let model = builder.validate().unwrap();

        let derived = derive_all(&model);
        let room = model.id_of("server room").unwrap();

        assert_eq!(
            derived.get(room, Dimension::Availability).unwrap().level(),
            ProtectionLevel::VeryHigh
        );
    }

    #[test]
    fn derive_rejects_foreign_id() {
        let model = chain_model();
        let run = Derivation::new(&model);

        assert_eq!(
            run.derive(ElementId(99), Dimension::Integrity),
            Err(DeriveError::UnknownElement(ElementId(99)))
        );
    }

    #[test]
    fn derive_all_evaluates_each_key_once() {
        let model = chain_model();
        let run = Derivation::new(&model);

        let table = run.derive_all();
        assert_eq!(table.len(), 3);
        assert_eq!(run.evaluations(), 3 * Dimension::COUNT);

        // further calls are memo hits
        let _ = run.derive_all();
        let _ = run.derive(model.id_of("a1").unwrap(), Dimension::Availability);
        assert_eq!(run.evaluations(), 3 * Dimension::COUNT);
    }

    #[test]
    fn iter_covers_every_entry() {
        let model = chain_model();
        let table = derive_all(&model);

        assert_eq!(table.iter().count(), model.len() * Dimension::COUNT);
        let a1: Vec<_> = table
            .element(model.id_of("a1").unwrap())
            .unwrap()
            .map(|(d, n)| (d, n.level()))
            .collect();
        assert_eq!(
            a1,
            vec![
                (Dimension::Integrity, ProtectionLevel::Normal),
                (Dimension::Availability, ProtectionLevel::Normal),
                (Dimension::Confidentiality, ProtectionLevel::VeryHigh),
            ]
        );
    }

    #[test]
    fn layers_place_dependencies_below_dependents() {
        let model = chain_model();
        let id = |n: &str| model.id_of(n).unwrap();

        assert_eq!(
            layers(&model),
            vec![vec![id("i1")], vec![id("p1")], vec![id("a1")]]
        );
    }

    #[test]
    fn cold_derive_memoizes_only_the_dependency_closure() {
        let model = chain_model();
        let run = Derivation::new(&model);

        run.derive(model.id_of("p1").unwrap(), Dimension::Confidentiality)
            .unwrap();

        assert_eq!(run.evaluations(), 2);
        assert!(run.is_memoized(model.id_of("i1").unwrap(), Dimension::Confidentiality));
        assert!(!run.is_memoized(model.id_of("a1").unwrap(), Dimension::Confidentiality));
        assert!(!run.is_memoized(model.id_of("i1").unwrap(), Dimension::Integrity));
    }
}
