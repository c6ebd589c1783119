//! Testing utilities for protneed workspace
//!
//! Shared fixtures and builders.

#![allow(missing_docs)]

use protneed_core::{
    Category, Dimension, ElementSpec, Model, ModelBuilder, ProtectionLevel, ProtectionNeed,
};

pub fn need(level: ProtectionLevel, rationale: &str) -> ProtectionNeed {
    ProtectionNeed::new(level, rationale)
}

pub fn leaf(name: &str, category: Category) -> ElementSpec {
    ElementSpec::builder(name, category).build()
}

pub fn rated(
    name: &str,
    category: Category,
    dimension: Dimension,
    level: ProtectionLevel,
) -> ElementSpec {
    ElementSpec::builder(name, category)
        .need(dimension, need(level, &format!("{name} rating")))
        .build()
}

pub fn depending(name: &str, category: Category, deps: &[&str]) -> ElementSpec {
    ElementSpec::builder(name, category)
        .depends_on_all(deps.iter().copied())
        .build()
}

pub fn build_model(specs: impl IntoIterator<Item = ElementSpec>) -> Model {
    let mut builder = ModelBuilder::new();
    builder.add_all(specs).unwrap();
    builder.validate().unwrap()
}

/// `i1` (confidentiality very high) <- `p1` <- `a1`
pub fn chain_model() -> Model {
    build_model([
        rated(
            "i1",
            Category::Information,
            Dimension::Confidentiality,
            ProtectionLevel::VeryHigh,
        ),
        depending("p1", Category::BusinessProcess, &["i1"]),
        depending("a1", Category::Application, &["p1"]),
    ])
}

/// `A -> {B, C}`, `B -> D`, `C -> D`; only `D` is rated (integrity high)
pub fn diamond_model() -> Model {
    build_model([
        depending("A", Category::Application, &["B", "C"]),
        depending("B", Category::BusinessProcess, &["D"]),
        depending("C", Category::BusinessProcess, &["D"]),
        rated("D", Category::Information, Dimension::Integrity, ProtectionLevel::High),
    ])
}

/// One element per category, each depending on the one below, plus a
/// hidden branch and a parent/child pair
pub fn campus_model() -> Model {
    build_model([
        ElementSpec::builder("Customer data", Category::Information)
            .description("names; addresses")
            .need(
                Dimension::Confidentiality,
                need(ProtectionLevel::High, "personal data"),
            )
            .need(
                Dimension::Integrity,
                need(ProtectionLevel::Normal, "recoverable"),
            )
            .build(),
        ElementSpec::builder("Contracts", Category::Information)
            .parent("Customer data")
            .need(
                Dimension::Availability,
                need(ProtectionLevel::VeryHigh, "deadline \"critical\""),
            )
            .build(),
        ElementSpec::builder("Scratch notes", Category::Information)
            .hidden(true)
            .build(),
        depending("Sales", Category::BusinessProcess, &["Customer data"]),
        depending("CRM", Category::Application, &["Sales"]),
        depending("App server", Category::Infrastructure, &["CRM"]),
        depending("Server room", Category::Room, &["App server"]),
        depending("Head office", Category::Building, &["Server room"]),
    ])
}
