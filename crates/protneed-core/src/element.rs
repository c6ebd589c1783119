//! Structural elements
//!
//! [`ElementSpec`] is the unvalidated description an analyst hands to the
//! [`ModelBuilder`](crate::ModelBuilder); references to other elements are by
//! name and may point forward. [`Element`] is the validated arena node, with
//! every reference resolved to an [`ElementId`].

use crate::vocabulary::{Dimension, ProtectionNeed};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable arena index, assigned in insertion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub usize);

impl ElementId {
    /// Position in the model's element arena
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element kind.
///
/// Only used to group elements for export; derivation is category-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Information asset
    Information,
    /// Business process
    BusinessProcess,
    /// Application
    Application,
    /// IT infrastructure
    Infrastructure,
    /// Room
    Room,
    /// Building
    Building,
}

impl Category {
    /// Export order
    pub const ALL: [Self; 6] = [
        Self::Information,
        Self::BusinessProcess,
        Self::Application,
        Self::Infrastructure,
        Self::Room,
        Self::Building,
    ];

    /// Number of categories
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index into per-category tables
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Information => 0,
            Self::BusinessProcess => 1,
            Self::Application => 2,
            Self::Infrastructure => 3,
            Self::Room => 4,
            Self::Building => 5,
        }
    }

    /// Deterministic file stem for the category's table
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Information => "1_information",
            Self::BusinessProcess => "2_business_processes",
            Self::Application => "3_applications",
            Self::Infrastructure => "4_infrastructures",
            Self::Room => "5_rooms",
            Self::Building => "6_buildings",
        }
    }

    /// Category whose elements this category normally depends on
    #[must_use]
    pub const fn dependency_category(self) -> Option<Self> {
        match self {
            Self::Information => None,
            Self::BusinessProcess => Some(Self::Information),
            Self::Application => Some(Self::BusinessProcess),
            Self::Infrastructure => Some(Self::Application),
            Self::Room => Some(Self::Infrastructure),
            Self::Building => Some(Self::Room),
        }
    }

    /// Plural column label for a list of elements of this category
    #[must_use]
    pub const fn plural_key(self) -> &'static str {
        match self {
            Self::Information => "information",
            Self::BusinessProcess => "business_processes",
            Self::Application => "applications",
            Self::Infrastructure => "infrastructures",
            Self::Room => "rooms",
            Self::Building => "buildings",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Information => "information",
            Self::BusinessProcess => "business process",
            Self::Application => "application",
            Self::Infrastructure => "infrastructure",
            Self::Room => "room",
            Self::Building => "building",
        };
        f.write_str(s)
    }
}

/// Unvalidated element description.
///
/// Built with [`ElementSpec::builder`]; consumed by
/// [`ModelBuilder::add`](crate::ModelBuilder::add).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    pub(crate) name: String,
    pub(crate) category: Category,
    pub(crate) description: Option<String>,
    pub(crate) remark: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) parent: Option<String>,
    pub(crate) needs: BTreeMap<Dimension, ProtectionNeed>,
    pub(crate) depends_on: Vec<String>,
}

impl ElementSpec {
    /// Start describing an element
    #[inline]
    pub fn builder(name: impl Into<String>, category: Category) -> ElementSpecBuilder {
        ElementSpecBuilder {
            spec: ElementSpec {
                name: name.into(),
                category,
                description: None,
                remark: None,
                hidden: false,
                parent: None,
                needs: BTreeMap::new(),
                depends_on: Vec::new(),
            },
        }
    }

    /// Element name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element category
    #[inline]
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Declared dependency names, in declaration order
    #[inline]
    #[must_use]
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }
}

/// Builder for [`ElementSpec`]
#[derive(Debug, Clone)]
#[must_use]
pub struct ElementSpecBuilder {
    spec: ElementSpec,
}

impl ElementSpecBuilder {
    /// Free-text description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = Some(description.into());
        self
    }

    /// Analyst remark
    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.spec.remark = Some(remark.into());
        self
    }

    /// Exclude from export when hidden elements are skipped
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.spec.hidden = hidden;
        self
    }

    /// Enclosing element (composite asset) by name
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.spec.parent = Some(parent.into());
        self
    }

    /// Explicit need for one dimension; a later call for the same dimension replaces it
    pub fn need(mut self, dimension: Dimension, need: ProtectionNeed) -> Self {
        self.spec.needs.insert(dimension, need);
        self
    }

    /// Add one dependency by name
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.spec.depends_on.push(name.into());
        self
    }

    /// Add several dependencies by name, keeping their order
    pub fn depends_on_all<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.depends_on.extend(names.into_iter().map(Into::into));
        self
    }

    /// Finish the description
    #[must_use]
    pub fn build(self) -> ElementSpec {
        self.spec
    }
}

/// Validated structural element.
///
/// Owned by a [`Model`](crate::Model); never mutated after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub(crate) id: ElementId,
    pub(crate) name: String,
    pub(crate) category: Category,
    pub(crate) description: Option<String>,
    pub(crate) remark: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) parent: Option<ElementId>,
    pub(crate) own_needs: [Option<ProtectionNeed>; Dimension::COUNT],
    pub(crate) depends_on: Vec<ElementId>,
}

impl Element {
    /// Arena id
    #[inline]
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Globally unique name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category
    #[inline]
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Description, if any
    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Remark, if any
    #[inline]
    #[must_use]
    pub fn remark(&self) -> Option<&str> {
        self.remark.as_deref()
    }

    /// Whether this element itself was marked hidden.
    ///
    /// See [`Model::is_hidden`](crate::Model::is_hidden) for the inherited flag.
    #[inline]
    #[must_use]
    pub fn hidden_flag(&self) -> bool {
        self.hidden
    }

    /// Enclosing element
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// Explicit need in a dimension
    #[inline]
    #[must_use]
    pub fn own_need(&self, dimension: Dimension) -> Option<&ProtectionNeed> {
        self.own_needs[dimension.index()].as_ref()
    }

    /// Resolved dependencies in declaration order, parent edges last
    #[inline]
    #[must_use]
    pub fn depends_on(&self) -> &[ElementId] {
        &self.depends_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::ProtectionLevel;

    #[test]
    fn builder_collects_fields_in_order() {
        let spec = ElementSpec::builder("CRM", Category::Application)
            .description("customer relationship management")
            .need(
                Dimension::Availability,
                ProtectionNeed::new(ProtectionLevel::High, "sales depends on it"),
            )
            .depends_on("Sales")
            .depends_on_all(["Billing", "Support"])
            .build();

        assert_eq!(spec.name(), "CRM");
        assert_eq!(spec.category(), Category::Application);
        assert_eq!(spec.depends_on(), ["Sales", "Billing", "Support"]);
        assert_eq!(
            spec.needs[&Dimension::Availability].level(),
            ProtectionLevel::High
        );
    }

    #[test]
    fn later_need_replaces_earlier() {
        let spec = ElementSpec::builder("Payroll", Category::Information)
            .need(
                Dimension::Confidentiality,
                ProtectionNeed::new(ProtectionLevel::High, "first"),
            )
            .need(
                Dimension::Confidentiality,
                ProtectionNeed::new(ProtectionLevel::VeryHigh, "second"),
            )
            .build();

        assert_eq!(spec.needs.len(), 1);
        assert_eq!(spec.needs[&Dimension::Confidentiality].rationale(), "second");
    }

    #[test]
    fn categories_chain_downwards() {
        let mut category = Category::Building;
        let mut chain = vec![category];
        while let Some(next) = category.dependency_category() {
            chain.push(next);
            category = next;
        }
        chain.reverse();
        assert_eq!(chain, Category::ALL);
    }
}
