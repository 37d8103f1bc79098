//! `mtab_core` turns tag-delimited data model documents into versioned tables
//! and annotates how each row changed between releases of the same model.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Model document text
//!   → Document builder (splits text into a flat stream of tags and text)
//!   → Table parser (tables one container, keyed by hierarchical path)
//!   → Differ (folds every historical version, oldest first, into one table)
//!   → Markup engine (resolves `{{directive|arg}}` tokens in cell text)
//!   → Renderer (HTML or tab separated text)
//! ```
//!
//! ## Modules
//!
//! - [`config`] — Configuration loading from `mtab.toml`: columns, labels and attribute substitutes.
//! - [`markup`] — The two-pass markup substitution engine and its directive processors.
//! - [`report`] — The pipeline driver that resolves imports, folds versions and substitutes markup.
//! - [`resolver`] — Locating model documents on disk.
//! - [`render`] — HTML and plain text output.
//!
//! ## Key Types
//!
//! - [`Tag`] and [`Document`] — The flat token stream a model document is read into.
//! - [`TableParser`] — Builds a [`Table`] from the container named by a [`ContainerSpec`].
//! - [`Table`], [`Row`] and [`Cell`] — Ordered rows of fixed width carrying fresh and changed flags.
//! - [`Differ`] — Merges an older table into a newer one.
//! - [`MarkupEngine`] — Replaces directives and collects [`MarkupWarning`]s.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mtab_core::DirResolver;
//! use mtab_core::ReportOptions;
//! use mtab_core::TableParser;
//! use mtab_core::build_report;
//!
//! let resolver = DirResolver::new("models");
//! let report = build_report(
//! 	&resolver,
//! 	"tr-181-2-1.xml",
//! 	"Device:2.1",
//! 	&ReportOptions::default(),
//! 	&TableParser::default(),
//! )
//! .unwrap();
//!
//! for warning in &report.warnings {
//! 	eprintln!("{warning}");
//! }
//! ```

pub use cell::*;
pub use columns::*;
pub use config::*;
pub use differ::*;
pub use document::*;
pub use error::*;
pub use handlers::*;
pub use imports::*;
pub use markup::*;
pub use parser::*;
pub use path::*;
pub use render::*;
pub use report::*;
pub use resolver::*;
pub use row::*;
pub use table::*;
pub use tag::*;

mod cell;
mod columns;
pub mod config;
mod differ;
mod document;
#[allow(unused_assignments)]
mod error;
mod handlers;
mod imports;
pub(crate) mod lexer;
pub mod markup;
mod parser;
pub mod path;
pub mod render;
pub mod report;
pub mod resolver;
mod row;
mod table;
mod tag;

#[cfg(test)]
mod __fixtures;
