//! CSV Exporter
//!
//! Writes one table per category into a destination directory. Each table is
//! rendered in memory, written to a temporary file beside its target and then
//! renamed over it, so a failed export never leaves a truncated table under
//! the final name.

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::table::{Table, TableBuilder};
use protneed_core::{Category, DerivedNeeds, Model};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One written table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    /// Final path of the table
    pub path: PathBuf,
    /// Category the table covers
    pub category: Category,
    /// Data rows, without header
    pub rows: usize,
}

/// Summary of a completed export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Written tables in [`Category::ALL`] order
    pub files: Vec<ExportedFile>,
}

impl ExportReport {
    /// Total data rows across all tables
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }

    /// Entry for one category
    #[must_use]
    pub fn file(&self, category: Category) -> Option<&ExportedFile> {
        self.files.iter().find(|f| f.category == category)
    }
}

/// Per-category CSV exporter
#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    config: ExportConfig,
}

impl CsvExporter {
    /// Exporter with the given configuration
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Build every category's table without touching the filesystem
    ///
    /// # Errors
    /// [`ExportError::Config`] for an invalid delimiter,
    /// [`ExportError::MissingResults`] if `derived` was not computed for `model`.
    pub fn tables(
        &self,
        model: &Model,
        derived: &DerivedNeeds,
    ) -> Result<Vec<Table>, ExportError> {
        self.config.validate()?;
        let builder = TableBuilder::new(model, derived, &self.config);
        Category::ALL
            .into_iter()
            .map(|category| builder.build(category))
            .collect()
    }

    /// Write `<dir>/<file_stem>.csv` for every category.
    ///
    /// The directory is created if missing. Tables are replaced one at a time;
    /// if a later table fails, earlier ones are already in place.
    ///
    /// # Errors
    /// As [`CsvExporter::tables`], plus [`ExportError::Io`] if the directory or
    /// a table cannot be written.
    #[tracing::instrument(level = "debug", skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn export(
        &self,
        model: &Model,
        derived: &DerivedNeeds,
        dir: impl AsRef<Path>,
    ) -> Result<ExportReport, ExportError> {
        let dir = dir.as_ref();
        let tables = self.tables(model, derived)?;

        std::fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;

        let mut report = ExportReport::default();
        for table in &tables {
            let path = dir.join(format!("{}.csv", table.category().file_stem()));
            write_atomic(&path, table.render(&self.config).as_bytes())?;
            tracing::debug!(
                path = %path.display(),
                category = %table.category(),
                rows = table.rows().len(),
                "table written"
            );
            report.files.push(ExportedFile {
                path,
                category: table.category(),
                rows: table.rows().len(),
            });
        }

        tracing::info!(
            files = report.files.len(),
            rows = report.total_rows(),
            "export complete"
        );
        Ok(report)
    }
}

/// Write `data` to a temporary file in `path`'s directory and rename it over `path`
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), ExportError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(|e| ExportError::io(path, e))?;
    file.write_all(data).map_err(|e| ExportError::io(path, e))?;
    file.as_file()
        .sync_all()
        .map_err(|e| ExportError::io(path, e))?;
    file.persist(path)
        .map_err(|e| ExportError::io(path, e.error))?;
    Ok(())
}
