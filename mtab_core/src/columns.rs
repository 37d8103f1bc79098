use serde::Deserialize;
use serde::Serialize;

use crate::Row;

/// Key of the row holding the column display names.
pub const HEADER_ROW_KEY: &str = "HEADER";
/// Display name of the column stamped with each row's model version.
pub const VERSION_COLUMN_NAME: &str = "Version";
/// Display name of the column holding each row's item type.
pub const TYPE_COLUMN_NAME: &str = "Type";

/// A column's display name and the tag type that fills it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
	pub name: String,
	pub tag: String,
}

impl Column {
	pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			tag: tag.into(),
		}
	}
}

/// Ordered column definitions. The schema fixes both the width of every row
/// and which handler writes each column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSchema {
	columns: Vec<Column>,
}

impl ColumnSchema {
	pub fn new<I, N, T>(columns: I) -> Self
	where
		I: IntoIterator<Item = (N, T)>,
		N: Into<String>,
		T: Into<String>,
	{
		Self {
			columns: columns
				.into_iter()
				.map(|(name, tag)| Column::new(name, tag))
				.collect(),
		}
	}

	/// Columns used for data model reports.
	pub fn model() -> Self {
		Self::new([
			("Name", "name"),
			(TYPE_COLUMN_NAME, "syntax"),
			("Write", "access"),
			("Description", "description"),
			("Default", "default"),
			(VERSION_COLUMN_NAME, "version"),
		])
	}

	/// Columns used for bibliography tables.
	pub fn bibliography() -> Self {
		Self::new([
			("Name", "name"),
			("Title", "title"),
			("Org", "organization"),
			("Category", "category"),
			("Date", "date"),
			("Link", "hyperlink"),
		])
	}

	pub fn width(&self) -> usize {
		self.columns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Column> {
		self.columns.iter()
	}

	pub fn get(&self, index: usize) -> Option<&Column> {
		self.columns.get(index)
	}

	pub fn index_of_name(&self, name: &str) -> Option<usize> {
		self.columns
			.iter()
			.position(|column| column.name.eq_ignore_ascii_case(name))
	}

	/// Index of the column filled by tags of the given type.
	pub fn index_of_tag(&self, tag: &str) -> Option<usize> {
		self.columns
			.iter()
			.position(|column| column.tag.eq_ignore_ascii_case(tag))
	}

	pub fn version_column(&self) -> Option<usize> {
		self.index_of_name(VERSION_COLUMN_NAME)
	}

	pub fn type_column(&self) -> Option<usize> {
		self.index_of_name(TYPE_COLUMN_NAME)
	}

	/// A row of the display names, to be stored under [`HEADER_ROW_KEY`].
	pub fn header_row(&self) -> Row {
		Row::from_values(self.columns.iter().map(|column| column.name.clone()))
	}

	/// A blank row as wide as the schema.
	pub fn blank_row(&self) -> Row {
		Row::new(self.width())
	}
}

impl Default for ColumnSchema {
	fn default() -> Self {
		Self::model()
	}
}
