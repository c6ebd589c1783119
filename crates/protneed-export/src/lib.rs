//! protneed export
//!
//! Writes a validated [`Model`](protneed_core::Model) and its
//! [`DerivedNeeds`](protneed_core::DerivedNeeds) as one CSV table per
//! category.
//!
//! # Example
//!
//! ```rust,ignore
//! use protneed_core::derive_all;
//! use protneed_export::{CsvExporter, ExportConfig};
//!
//! let config = ExportConfig::load("export.toml")?;
//! let report = CsvExporter::new(config).export(&model, &derive_all(&model), "out")?;
//! for file in &report.files {
//!     println!("{} ({} rows)", file.path.display(), file.rows);
//! }
//! ```

pub mod config;
pub mod error;
pub mod table;
pub mod writer;

pub use config::ExportConfig;
pub use error::{ConfigError, Error, ExportError, Result};
pub use table::Table;
pub use writer::{CsvExporter, ExportReport, ExportedFile};
