//! protneed core
//!
//! Dependency-graph model of an organization's assets and the
//! maximum-principle derivation of protection needs (BSI 200-2 style
//! structural analysis).
//!
//! # Core Concepts
//!
//! - [`ProtectionLevel`] / [`Dimension`]: the fixed scale and the independent
//!   security dimensions
//! - [`ElementSpec`]: unvalidated element description, built by name
//! - [`ModelBuilder`] → [`Model`]: construction phase; a `Model` only exists
//!   once names are unique, references resolve, and the graph is acyclic
//! - [`Derivation`]: one memoized derivation run producing [`DerivedNeed`]s
//!   with a [`Justification`] for each
//!
//! # Example
//!
//! ```rust,ignore
//! use protneed_core::prelude::*;
//!
//! let mut builder = ModelBuilder::new();
//! builder.add(
//!     ElementSpec::builder("Patient files", Category::Information)
//!         .need(Dimension::Confidentiality, ProtectionNeed::new(ProtectionLevel::VeryHigh, "health data"))
//!         .build(),
//! )?;
//! builder.add(
//!     ElementSpec::builder("Admission", Category::BusinessProcess)
//!         .depends_on("Patient files")
//!         .build(),
//! )?;
//! let model = builder.validate()?;
//! let derived = derive_all(&model);
//! ```

pub mod construction;
pub mod derivation;
pub mod element;
pub mod error;
pub mod logging;
pub mod model;
pub mod vocabulary;

pub use construction::ModelBuilder;
pub use derivation::{derive_all, Derivation, DerivedNeed, DerivedNeeds, Justification};
pub use element::{Category, Element, ElementId, ElementSpec, ElementSpecBuilder};
pub use error::{DeriveError, ModelError};
pub use model::Model;
pub use vocabulary::{Dimension, ProtectionLevel, ProtectionNeed};

/// Commonly used types
pub mod prelude {
    pub use crate::construction::ModelBuilder;
    pub use crate::derivation::{derive_all, Derivation, DerivedNeed, DerivedNeeds, Justification};
    pub use crate::element::{Category, ElementId, ElementSpec};
    pub use crate::error::{DeriveError, ModelError};
    pub use crate::model::Model;
    pub use crate::vocabulary::{Dimension, ProtectionLevel, ProtectionNeed};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
