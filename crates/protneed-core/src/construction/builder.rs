//! Model Builder
//!
//! The construction interface. Elements are added one by one (dependencies
//! may reference elements added later), then [`ModelBuilder::validate`]
//! produces the sealed [`Model`].

use crate::construction::validator;
use crate::element::{ElementId, ElementSpec};
use crate::error::ModelError;
use crate::model::Model;
use std::collections::HashMap;

/// Builder for validated models
///
/// Usage:
/// ```rust,ignore
/// let mut builder = ModelBuilder::new();
/// builder.add(ElementSpec::builder("Customer data", Category::Information).build())?;
/// builder.add(
///     ElementSpec::builder("Order handling", Category::BusinessProcess)
///         .depends_on("Customer data")
///         .build(),
/// )?;
/// let model: Model = builder.validate()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    specs: Vec<ElementSpec>,
    by_name: HashMap<String, ElementId>,
}

impl ModelBuilder {
    /// Create an empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements added so far
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether no element has been added
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Whether an element with this name was added
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Add an element.
    ///
    /// Returns the id the element will carry in the validated model.
    ///
    /// # Errors
    /// [`ModelError::DuplicateName`] if the name is already taken by an
    /// element of any category.
    pub fn add(&mut self, spec: ElementSpec) -> Result<ElementId, ModelError> {
        if let Some(existing) = self.by_name.get(&spec.name) {
            return Err(ModelError::DuplicateName {
                name: spec.name,
                first: self.specs[existing.index()].category,
                second: spec.category,
            });
        }

        let id = ElementId(self.specs.len());
        tracing::trace!(element = %spec.name, category = %spec.category, %id, "element added");
        self.by_name.insert(spec.name.clone(), id);
        self.specs.push(spec);
        Ok(id)
    }

    /// Add several elements, stopping at the first error
    ///
    /// # Errors
    /// See [`ModelBuilder::add`].
    pub fn add_all<I>(&mut self, specs: I) -> Result<Vec<ElementId>, ModelError>
    where
        I: IntoIterator<Item = ElementSpec>,
    {
        specs.into_iter().map(|spec| self.add(spec)).collect()
    }

    /// Add a dependency edge to an already added element.
    ///
    /// `to` may still be a forward reference; it is resolved at validation.
    ///
    /// # Errors
    /// [`ModelError::UnknownElement`] if `from` has not been added.
    pub fn add_dependency(&mut self, from: &str, to: impl Into<String>) -> Result<(), ModelError> {
        let Some(id) = self.by_name.get(from) else {
            return Err(ModelError::UnknownElement {
                name: from.to_string(),
            });
        };
        self.specs[id.index()].depends_on.push(to.into());
        Ok(())
    }

    /// Validate the collected elements into a [`Model`].
    ///
    /// Resolves all references, rejects self-dependencies, and runs a full
    /// cycle check. Leaves the builder untouched, so calling it repeatedly
    /// yields equal models.
    ///
    /// # Errors
    /// [`ModelError::DanglingReference`], [`ModelError::SelfDependency`] or
    /// [`ModelError::CyclicDependency`].
    #[tracing::instrument(level = "debug", skip(self), fields(elements = self.specs.len()))]
    pub fn validate(&self) -> Result<Model, ModelError> {
        validator::validate(&self.specs, &self.by_name).map_err(|err| {
            tracing::warn!(elements = ?err.involved_elements(), %err, "model rejected");
            err
        })
    }
}
