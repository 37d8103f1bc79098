use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Column;
use crate::ColumnSchema;
use crate::MtabError;
use crate::MtabResult;
use crate::ReportOptions;
use crate::Substitute;
use crate::TableParser;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["mtab.toml", ".mtab.toml", ".config/mtab.toml"];

/// Configuration loaded from an `mtab.toml` file. Every field is optional.
///
/// ```toml
/// major_item = "object"
/// labels = ["name", "base"]
/// diff = true
/// profiles = true
/// anchor_column = 0
///
/// [[columns]]
/// name = "Name"
/// tag = "name"
///
/// [[substitutes]]
/// missing = "name"
/// from = "base"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtabConfig {
	/// Tag type that opens a new key prefix.
	#[serde(default)]
	pub major_item: Option<String>,
	/// Attributes tried in order to name a row.
	#[serde(default)]
	pub labels: Option<Vec<String>>,
	/// Fold historical versions into one annotated table.
	#[serde(default)]
	pub diff: Option<bool>,
	/// Keep profile rows in their own table.
	#[serde(default)]
	pub profiles: Option<bool>,
	/// Column whose cells become link targets.
	#[serde(default)]
	pub anchor_column: Option<usize>,
	/// The report columns. Replaces the model schema when not empty.
	#[serde(default)]
	pub columns: Vec<Column>,
	/// Attribute fallbacks applied to every tag before it is tabled.
	#[serde(default)]
	pub substitutes: Option<Vec<Substitute>>,
}

impl MtabConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> MtabResult<Option<MtabConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: MtabConfig =
			toml::from_str(&content).map_err(|e| MtabError::ConfigParse(e.to_string()))?;

		tracing::debug!(path = %config_path.display(), "loaded config");
		Ok(Some(config))
	}

	pub fn column_schema(&self) -> ColumnSchema {
		if self.columns.is_empty() {
			return ColumnSchema::model();
		}

		ColumnSchema::new(
			self.columns
				.iter()
				.map(|column| (column.name.clone(), column.tag.clone())),
		)
	}

	/// A parser for the configured columns and substitutes.
	pub fn table_parser(&self) -> TableParser {
		let parser = TableParser::new(self.column_schema());

		match &self.substitutes {
			Some(substitutes) => parser.with_substitutes(substitutes.clone()),
			None => parser,
		}
	}

	/// Report options with every unset field left at its default.
	pub fn report_options(&self) -> ReportOptions {
		let defaults = ReportOptions::default();

		ReportOptions {
			diff: self.diff.unwrap_or(defaults.diff),
			profiles: self.profiles.unwrap_or(defaults.profiles),
			major_item: self.major_item.clone().unwrap_or(defaults.major_item),
			labels: self.labels.clone().unwrap_or(defaults.labels),
			anchor_column: self.anchor_column.or(defaults.anchor_column),
		}
	}
}
