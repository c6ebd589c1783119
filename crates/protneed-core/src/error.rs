//! Error types for protneed core
//!
//! Structural problems are reported eagerly by the
//! [`ModelBuilder`](crate::ModelBuilder), either when an element is added or
//! during validation. Derivation only fails on programming misuse.

use crate::element::{Category, ElementId};

/// Model construction and validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Two elements share a name, in any categories
    #[error("duplicate element name {name:?}: already used by a {first}, rejected for a {second}")]
    DuplicateName {
        /// The shared name
        name: String,
        /// Category of the element registered first
        first: Category,
        /// Category of the rejected element
        second: Category,
    },

    /// A dependency or parent reference names no known element
    #[error("element {element:?} references unknown element {missing:?}")]
    DanglingReference {
        /// Referencing element
        element: String,
        /// Name that did not resolve
        missing: String,
    },

    /// An element lists itself as dependency or parent
    #[error("element {element:?} depends on itself")]
    SelfDependency {
        /// Offending element
        element: String,
    },

    /// The dependency graph contains a cycle
    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency {
        /// Element names on the cycle, in traversal order
        cycle: Vec<String>,
    },

    /// An incremental edge was added from an element the builder does not know
    #[error("unknown element {name:?}")]
    UnknownElement {
        /// Name that did not resolve
        name: String,
    },
}

impl ModelError {
    /// Names of all elements the error refers to
    #[must_use]
    pub fn involved_elements(&self) -> Vec<&str> {
        match self {
            Self::DuplicateName { name, .. } => vec![name.as_str()],
            Self::DanglingReference { element, missing } => {
                vec![element.as_str(), missing.as_str()]
            }
            Self::SelfDependency { element } => vec![element.as_str()],
            Self::CyclicDependency { cycle } => cycle.iter().map(String::as_str).collect(),
            Self::UnknownElement { name } => vec![name.as_str()],
        }
    }
}

/// Derivation errors
///
/// Only raised on misuse, such as asking one model's derivation about an id
/// from another model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeriveError {
    /// The id does not belong to the derived model
    #[error("unknown element id {0}")]
    UnknownElement(ElementId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_path() {
        let err = ModelError::CyclicDependency {
            cycle: vec!["A".into(), "B".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency: A -> B");
        assert_eq!(err.involved_elements(), vec!["A", "B"]);
    }

    #[test]
    fn duplicate_message_names_both_categories() {
        let err = ModelError::DuplicateName {
            name: "Server".into(),
            first: Category::Infrastructure,
            second: Category::Room,
        };
        let msg = err.to_string();
        assert!(msg.contains("Server"));
        assert!(msg.contains("infrastructure"));
        assert!(msg.contains("room"));
    }
}
