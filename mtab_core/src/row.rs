use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::Cell;
use crate::MergeAction;
use crate::MtabError;
use crate::MtabResult;

/// A value declared by a `<enumeration>` tag inside a parameter's syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumeration {
	pub value: String,
	pub description: Option<String>,
	pub access: Option<String>,
}

/// Side-channel data attached to a row while parsing and consumed by the
/// markup engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketItem {
	Enumeration(Enumeration),
	Pattern(String),
}

/// A fixed-width sequence of cells.
///
/// The width is set at construction and never changes. Writes past the last
/// column are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
	cells: Vec<Cell>,
	empty: bool,
	attributes: BTreeMap<String, String>,
	bucket: Vec<BucketItem>,
}

impl Row {
	/// A row of `width` blank cells.
	pub fn new(width: usize) -> Self {
		Self {
			cells: vec![Cell::default(); width],
			empty: true,
			attributes: BTreeMap::new(),
			bucket: Vec::new(),
		}
	}

	/// A row holding the given values in fresh cells.
	pub fn from_values<I, S>(values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			cells: values.into_iter().map(Cell::new).collect(),
			empty: false,
			attributes: BTreeMap::new(),
			bucket: Vec::new(),
		}
	}

	pub fn width(&self) -> usize {
		self.cells.len()
	}

	pub fn cells(&self) -> &[Cell] {
		&self.cells
	}

	pub fn get(&self, index: usize) -> Option<&Cell> {
		self.cells.get(index)
	}

	pub fn get_mut(&mut self, index: usize) -> Option<&mut Cell> {
		self.cells.get_mut(index)
	}

	pub fn value(&self, index: usize) -> Option<&str> {
		self.cells.get(index).map(Cell::value)
	}

	pub fn set(&mut self, index: usize, value: impl Into<String>) {
		self.set_with(index, value, MergeAction::Replace);
	}

	/// Write a cell, recording how later merges combine with it.
	pub fn set_with(&mut self, index: usize, value: impl Into<String>, action: MergeAction) {
		if let Some(cell) = self.cells.get_mut(index) {
			self.empty = false;
			cell.set(value, action);
		}
	}

	pub fn silent_set(&mut self, index: usize, value: impl Into<String>) {
		if let Some(cell) = self.cells.get_mut(index) {
			cell.silent_set(value);
		}
	}

	pub fn is_empty(&self) -> bool {
		self.empty
	}

	pub fn has_first_column_filled(&self) -> bool {
		self.cells.first().is_some_and(|cell| !cell.is_blank())
	}

	/// A row may be committed to a table once data has been written and its
	/// first cell holds a value.
	pub fn is_real(&self) -> bool {
		!self.empty && self.has_first_column_filled()
	}

	pub fn attributes(&self) -> &BTreeMap<String, String> {
		&self.attributes
	}

	pub fn attribute(&self, key: &str) -> Option<&str> {
		self.attributes.get(key).map(String::as_str)
	}

	pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.attributes.insert(key.into(), value.into());
	}

	pub fn bucket(&self) -> &[BucketItem] {
		&self.bucket
	}

	pub fn add_to_bucket(&mut self, item: BucketItem) {
		self.bucket.push(item);
	}

	pub fn enumerations(&self) -> impl Iterator<Item = &Enumeration> {
		self.bucket.iter().filter_map(|item| {
			match item {
				BucketItem::Enumeration(enumeration) => Some(enumeration),
				BucketItem::Pattern(_) => None,
			}
		})
	}

	pub fn patterns(&self) -> impl Iterator<Item = &str> {
		self.bucket.iter().filter_map(|item| {
			match item {
				BucketItem::Pattern(pattern) => Some(pattern.as_str()),
				BucketItem::Enumeration(_) => None,
			}
		})
	}

	/// The most recently added enumeration.
	pub fn last_enumeration_mut(&mut self) -> Option<&mut Enumeration> {
		self.bucket.iter_mut().rev().find_map(|item| {
			match item {
				BucketItem::Enumeration(enumeration) => Some(enumeration),
				BucketItem::Pattern(_) => None,
			}
		})
	}

	/// Declare a pattern name once, keeping declaration order.
	pub fn declare_pattern(&mut self, name: &str) {
		if !self.patterns().any(|pattern| pattern == name) {
			self.bucket.push(BucketItem::Pattern(name.to_string()));
		}
	}

	pub fn make_stale(&mut self) {
		self.cells.iter_mut().for_each(Cell::make_stale);
	}

	pub fn make_fresh(&mut self) {
		self.cells.iter_mut().for_each(Cell::make_fresh);
	}

	pub fn all_cells_fresh(&self) -> bool {
		self.cells.iter().all(Cell::is_fresh)
	}

	pub fn something_changed(&self) -> bool {
		self.cells.iter().any(Cell::is_changed)
	}

	pub fn contains_in_cell(&self, index: usize, needle: &str, ignore_case: bool) -> bool {
		self.value(index).is_some_and(|value| {
			if ignore_case {
				value.to_lowercase().contains(&needle.to_lowercase())
			} else {
				value.contains(needle)
			}
		})
	}

	/// Merge a newer version of this row into a copy of it.
	///
	/// Every column other than `version_column` whose value differs in
	/// `newer` (and is not blank there) takes the newer value. A newer cell
	/// marked [`MergeAction::Append`] or [`MergeAction::Prefix`] is joined
	/// after or before the older text instead. Those cells are marked
	/// changed. All other cells keep their state.
	pub fn merge(&self, newer: &Row, version_column: usize) -> MtabResult<Row> {
		if self.width() != newer.width() {
			return Err(MtabError::SchemaMismatch {
				left: self.width(),
				right: newer.width(),
			});
		}

		let mut merged = self.clone();

		for (index, (cell, incoming)) in merged.cells.iter_mut().zip(&newer.cells).enumerate() {
			if index == version_column || incoming.is_blank() || incoming.value() == cell.value() {
				continue;
			}

			let value = match incoming.merge_action() {
				MergeAction::Append if !cell.is_blank() => {
					format!("{} {}", cell.value(), incoming.value())
				}
				MergeAction::Prefix if !cell.is_blank() => {
					format!("{} {}", incoming.value(), cell.value())
				}
				_ => incoming.value().to_string(),
			};

			cell.set(value, incoming.merge_action());
			cell.mark_changed();
		}

		for item in &newer.bucket {
			if !merged.bucket.contains(item) {
				merged.bucket.push(item.clone());
			}
		}

		merged.attributes.extend(
			newer
				.attributes
				.iter()
				.map(|(key, value)| (key.clone(), value.clone())),
		);
		merged.empty = self.empty && newer.empty;
		Ok(merged)
	}
}
