//! Per-category tables
//!
//! Rows are laid out in memory first; [`Table::render`] produces the final
//! CSV text in one piece so the writer can replace files atomically.

use crate::config::ExportConfig;
use crate::error::ExportError;
use protneed_core::{Category, DerivedNeeds, Dimension, Element, ElementId, Model};
use std::borrow::Cow;

const BOM: char = '\u{feff}';

/// Column used on categories that have no natural dependency category
const DEPENDENCIES_COLUMN: &str = "dependencies";

/// One exported table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    category: Category,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Category the table covers
    #[inline]
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Column names
    #[inline]
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows, without header
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// CSV text, header first, `\n` line endings
    #[must_use]
    pub fn render(&self, config: &ExportConfig) -> String {
        let mut out = String::new();
        if config.utf8_bom {
            out.push(BOM);
        }
        for line in std::iter::once(&self.header).chain(&self.rows) {
            for (i, field) in line.iter().enumerate() {
                if i > 0 {
                    out.push(config.delimiter);
                }
                out.push_str(&escape_csv_field(field, config.delimiter));
            }
            out.push('\n');
        }
        out
    }
}

/// Quote a field if it contains the delimiter, a quote, or a line break
pub(crate) fn escape_csv_field(s: &str, delimiter: char) -> Cow<'_, str> {
    if s.contains(|c: char| c == delimiter || matches!(c, '"' | '\n' | '\r')) {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}

/// Builds every category's table from one model and its derived needs
pub(crate) struct TableBuilder<'a> {
    model: &'a Model,
    derived: &'a DerivedNeeds,
    config: &'a ExportConfig,
    /// 1-based row id within the element's category; `None` when not exported
    row_ids: Vec<Option<usize>>,
}

impl<'a> TableBuilder<'a> {
    pub(crate) fn new(
        model: &'a Model,
        derived: &'a DerivedNeeds,
        config: &'a ExportConfig,
    ) -> Self {
        let mut row_ids = vec![None; model.len()];
        for category in Category::ALL {
            let visible = model
                .category(category)
                .filter(|e| !(config.skip_hidden && model.is_hidden(e.id())));
            for (row, element) in visible.enumerate() {
                row_ids[element.id().index()] = Some(row + 1);
            }
        }
        Self {
            model,
            derived,
            config,
            row_ids,
        }
    }

    fn exported(&self, id: ElementId) -> bool {
        self.row_ids[id.index()].is_some()
    }

    /// `<id>: <name>` for an exported element, the bare name otherwise
    fn reference(&self, id: ElementId) -> Option<String> {
        let element = self.model.element(id)?;
        Some(match self.row_ids[id.index()] {
            Some(row) => format!("{row}: {}", element.name()),
            None => element.name().to_string(),
        })
    }

    /// Whether `dep` belongs in `owner`'s dependency column
    fn listed(&self, owner: &Element, dep: ElementId) -> bool {
        let Some(element) = self.model.element(dep) else {
            return false;
        };
        match owner.category().dependency_category() {
            Some(category) => element.category() == category,
            // no natural target: list everything except the owner's own parts
            None => !self.model.ancestors(dep).any(|a| a == owner.id()),
        }
    }

    fn dependencies(&self, owner: &Element) -> Vec<ElementId> {
        let candidates = if self.config.transitive_dependencies {
            self.model.reachable(owner.id())
        } else {
            owner.depends_on().to_vec()
        };
        candidates
            .into_iter()
            .filter(|&dep| self.listed(owner, dep))
            .collect()
    }

    fn dependency_column(&self, category: Category) -> Option<&'static str> {
        if !self.config.list_dependencies {
            return None;
        }
        match category.dependency_category() {
            Some(target) => Some(target.plural_key()),
            None => {
                let any = self
                    .model
                    .category(category)
                    .filter(|e| self.exported(e.id()))
                    .any(|e| !self.dependencies(e).is_empty());
                any.then_some(DEPENDENCIES_COLUMN)
            }
        }
    }

    pub(crate) fn build(&self, category: Category) -> Result<Table, ExportError> {
        let dependency_column = self.dependency_column(category);

        let mut header: Vec<String> = ["name", "id", "depth", "description", "remark", "parent"]
            .into_iter()
            .map(String::from)
            .collect();
        header.extend(dependency_column.map(String::from));
        for dimension in Dimension::ALL {
            header.push(format!("{}_level", dimension.key()));
            header.push(format!("{}_justification", dimension.key()));
        }

        let mut rows = Vec::new();
        for element in self.model.category(category) {
            let Some(row_id) = self.row_ids[element.id().index()] else {
                continue;
            };
            let mut row = Vec::with_capacity(header.len());
            row.push(element.name().to_string());
            row.push(row_id.to_string());
            row.push(self.model.depth(element.id()).to_string());
            row.push(element.description().unwrap_or_default().to_string());
            row.push(element.remark().unwrap_or_default().to_string());
            row.push(
                element
                    .parent()
                    .and_then(|p| self.reference(p))
                    .unwrap_or_default(),
            );
            if dependency_column.is_some() {
                let listed: Vec<String> = self
                    .dependencies(element)
                    .into_iter()
                    .filter_map(|dep| self.reference(dep))
                    .collect();
                row.push(listed.join("; "));
            }
            for dimension in Dimension::ALL {
                let derived = self.derived.get(element.id(), dimension).ok_or_else(|| {
                    ExportError::MissingResults {
                        element: element.name().to_string(),
                    }
                })?;
                row.push(derived.level().label().to_string());
                row.push(derived.justification().describe(self.model));
            }
            rows.push(row);
        }

        Ok(Table {
            category,
            header,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protneed_core::{derive_all, ElementSpec, ModelBuilder, ProtectionLevel, ProtectionNeed};

    fn model() -> Model {
        let mut builder = ModelBuilder::new();
        builder
            .add_all([
                ElementSpec::builder("ledger", Category::Information)
                    .need(
                        Dimension::Integrity,
                        ProtectionNeed::new(ProtectionLevel::High, "bookkeeping"),
                    )
                    .build(),
                ElementSpec::builder("drafts", Category::Information)
                    .hidden(true)
                    .build(),
                ElementSpec::builder("billing", Category::BusinessProcess)
                    .depends_on_all(["drafts", "ledger"])
                    .build(),
            ])
            .unwrap();
        builder.validate().unwrap()
    }

    #[test]
    fn escape_quotes_only_when_needed() {
        assert_eq!(escape_csv_field("plain", ';'), "plain");
        assert_eq!(escape_csv_field("a;b", ';'), "\"a;b\"");
        assert_eq!(escape_csv_field("a,b", ';'), "a,b");
        assert_eq!(escape_csv_field("say \"hi\"", ';'), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv_field("two\nlines", ','), "\"two\nlines\"");
    }

    #[test]
    fn row_ids_skip_hidden_elements() {
        let model = model();
        let derived = derive_all(&model);
        let config = ExportConfig::default().with_skip_hidden(true);

        let table = TableBuilder::new(&model, &derived, &config)
            .build(Category::BusinessProcess)
            .unwrap();

        assert_eq!(table.header()[6], "information");
        assert_eq!(table.rows()[0][1], "1");
        assert_eq!(table.rows()[0][6], "drafts; 1: ledger");
    }

    #[test]
    fn hidden_elements_are_listed_when_not_skipped() {
        let model = model();
        let derived = derive_all(&model);
        let config = ExportConfig::default();

        let table = TableBuilder::new(&model, &derived, &config)
            .build(Category::BusinessProcess)
            .unwrap();

        assert_eq!(table.rows()[0][6], "2: drafts; 1: ledger");
    }

    #[test]
    fn information_without_dependencies_has_no_dependency_column() {
        let model = model();
        let derived = derive_all(&model);
        let config = ExportConfig::default();

        let table = TableBuilder::new(&model, &derived, &config)
            .build(Category::Information)
            .unwrap();

        assert_eq!(table.header().len(), 6 + 2 * Dimension::COUNT);
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn render_writes_bom_and_header() {
        let model = model();
        let derived = derive_all(&model);
        let config = ExportConfig::default().with_delimiter(',');

        let text = TableBuilder::new(&model, &derived, &config)
            .build(Category::Room)
            .unwrap()
            .render(&config);

        assert!(text.starts_with('\u{feff}'));
        assert!(text.contains("name,id,depth,description,remark,parent,infrastructures,"));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn mismatched_results_are_reported() {
        let model = model();
        let other = ModelBuilder::new().validate().unwrap();
        let derived = derive_all(&other);
        let config = ExportConfig::default();

        let err = TableBuilder::new(&model, &derived, &config)
            .build(Category::Information)
            .unwrap_err();

        assert!(matches!(err, ExportError::MissingResults { ref element } if element == "ledger"));
    }
}
