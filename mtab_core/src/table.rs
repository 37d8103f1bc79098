use derive_more::Deref;
use derive_more::DerefMut;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::Component;
use crate::Document;
use crate::MtabError;
use crate::MtabResult;
use crate::Row;
use crate::path::DELIMITER;
use crate::path::trim_delimiter;

/// Insertion-ordered rows keyed by their full hierarchical path.
///
/// Rows are owned values. Copying rows between tables always clones them, so
/// later mutation of one table never leaks into another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
	rows: IndexMap<String, Row>,
	version: String,
	/// Row key to the key (or partial key) of the element it follows.
	previous_links: IndexMap<String, String>,
	#[serde(skip)]
	preamble: Document,
	#[serde(skip)]
	trailer: Document,
}

impl Table {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_version(mut self, version: impl Into<String>) -> Self {
		self.version = version.into();
		self
	}

	pub fn version(&self) -> &str {
		&self.version
	}

	pub fn set_version(&mut self, version: impl Into<String>) {
		self.version = version.into();
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.rows.contains_key(key)
	}

	pub fn get(&self, key: &str) -> Option<&Row> {
		self.rows.get(key)
	}

	pub fn get_mut(&mut self, key: &str) -> Option<&mut Row> {
		self.rows.get_mut(key)
	}

	pub fn get_index(&self, index: usize) -> Option<(&str, &Row)> {
		self.rows
			.get_index(index)
			.map(|(key, row)| (key.as_str(), row))
	}

	pub fn get_index_mut(&mut self, index: usize) -> Option<(&str, &mut Row)> {
		self.rows
			.get_index_mut(index)
			.map(|(key, row)| (key.as_str(), row))
	}

	pub fn index_of(&self, key: &str) -> Option<usize> {
		self.rows.get_index_of(key)
	}

	pub fn first_key(&self) -> Option<&str> {
		self.rows.keys().next().map(String::as_str)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.rows.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Row)> {
		self.rows.iter().map(|(key, row)| (key.as_str(), row))
	}

	pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
		self.rows.values_mut()
	}

	/// Replace the row stored under `key` in place, or append it.
	pub fn insert(&mut self, key: impl Into<String>, row: Row) -> Option<Row> {
		self.rows.insert(key.into(), row)
	}

	/// Insert at a position. An existing row with the same key is moved there.
	pub fn insert_at(&mut self, index: usize, key: impl Into<String>, row: Row) {
		let key = key.into();
		let mut index = index;

		if let Some(existing) = self.rows.get_index_of(&key) {
			self.rows.shift_remove_index(existing);
			if existing < index {
				index -= 1;
			}
		}

		self.rows.shift_insert(index.min(self.rows.len()), key, row);
	}

	/// Copy every row of `other` into this table, replacing rows with equal
	/// keys in place and appending the rest.
	pub fn extend_from(&mut self, other: &Table) {
		for (key, row) in &other.rows {
			self.rows.insert(key.clone(), row.clone());
		}
	}

	/// Copy every row of `other` into this table starting at `index`.
	///
	/// Returns the index just past the last inserted row.
	pub fn insert_table_at(&mut self, index: usize, other: &Table) -> usize {
		let mut at = index.min(self.rows.len());

		for (key, row) in &other.rows {
			if let Some(existing) = self.rows.get_index_of(key) {
				self.rows.shift_remove_index(existing);
				if existing < at {
					at -= 1;
				}
			}

			self.rows.shift_insert(at, key.clone(), row.clone());
			at += 1;
		}

		at
	}

	pub fn remove(&mut self, key: &str) -> Option<Row> {
		self.rows.shift_remove(key)
	}

	pub fn make_stale(&mut self) {
		self.rows.values_mut().for_each(Row::make_stale);
	}

	pub fn make_fresh(&mut self) {
		self.rows.values_mut().for_each(Row::make_fresh);
	}

	pub fn something_changed(&self) -> bool {
		self.rows.values().any(Row::something_changed)
	}

	pub fn keys_starting_with<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> {
		self.keys().filter(move |key| key.starts_with(prefix))
	}

	pub fn count_starting_with(&self, prefix: &str) -> usize {
		self.keys_starting_with(prefix).count()
	}

	/// Resolve a partial key to a row index.
	///
	/// An exact key always wins. Otherwise every key ending with `partial` is
	/// a candidate, and the candidate positioned nearest to `scope` is chosen
	/// (ties go to the earlier row). Without a resolvable scope the first
	/// candidate is returned.
	pub fn closest_match(&self, partial: &str, scope: Option<&str>) -> Option<usize> {
		if partial.is_empty() {
			return None;
		}

		if let Some(index) = self.rows.get_index_of(partial) {
			return Some(index);
		}

		let candidates: Vec<usize> = self
			.rows
			.keys()
			.enumerate()
			.filter(|(_, key)| key.ends_with(partial))
			.map(|(index, _)| index)
			.collect();

		let first = *candidates.first()?;

		match scope.and_then(|key| self.index_of(key)) {
			Some(origin) => {
				candidates
					.into_iter()
					.min_by_key(|index| index.abs_diff(origin))
			}
			None => Some(first),
		}
	}

	/// The index immediately after `path` and all of its descendants.
	///
	/// `path` may also match a key with its trailing delimiter removed.
	pub fn find_spot_after(&self, path: &str) -> MtabResult<usize> {
		let key = if self.contains_key(path) {
			path
		} else if self.contains_key(trim_delimiter(path)) {
			trim_delimiter(path)
		} else {
			return Err(MtabError::UnresolvedReference(path.to_string()));
		};

		let start = self.index_of(key).unwrap_or_default();

		if !key.ends_with(DELIMITER) {
			return Ok(start + 1);
		}

		let last = self
			.rows
			.keys()
			.enumerate()
			.filter(|(_, candidate)| candidate.starts_with(key))
			.map(|(index, _)| index)
			.max()
			.unwrap_or(start);

		Ok(last.max(start) + 1)
	}

	pub fn previous_links(&self) -> &IndexMap<String, String> {
		&self.previous_links
	}

	/// Record that the row `key` follows `previous`. Self links are ignored.
	pub fn add_previous_link(&mut self, key: impl Into<String>, previous: impl Into<String>) {
		let key = key.into();
		let previous = previous.into();

		if key != previous {
			self.previous_links.insert(key, previous);
		}
	}

	/// Move every row with a recorded predecessor to just after it.
	///
	/// Predecessors are resolved with [`Table::closest_match`] scoped to the
	/// row being moved. Unresolvable links are skipped.
	pub fn reorder_by_previous_links(&mut self) {
		let links: Vec<(String, String)> = self
			.previous_links
			.iter()
			.map(|(key, previous)| (key.clone(), previous.clone()))
			.collect();

		for (key, previous) in links {
			let Some(target) = self.closest_match(&previous, Some(&key)) else {
				tracing::debug!(row = %key, previous = %previous, "unresolved previous link");
				continue;
			};

			let Some(from) = self.index_of(&key) else {
				continue;
			};

			if from == target {
				continue;
			}

			let Some(row) = self.rows.shift_remove(&key) else {
				continue;
			};

			let target = if from < target { target } else { target + 1 };
			self.rows.shift_insert(target.min(self.rows.len()), key, row);
		}
	}

	pub fn preamble(&self) -> &Document {
		&self.preamble
	}

	pub fn set_preamble(&mut self, preamble: Document) {
		self.preamble = preamble;
	}

	pub fn trailer(&self) -> &Document {
		&self.trailer
	}

	pub fn set_trailer(&mut self, trailer: Document) {
		self.trailer = trailer;
	}
}

impl<'a> IntoIterator for &'a Table {
	type IntoIter = indexmap::map::Iter<'a, String, Row>;
	type Item = (&'a String, &'a Row);

	fn into_iter(self) -> Self::IntoIter {
		self.rows.iter()
	}
}

/// A model report table together with its bibliography and extracted
/// profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut, Serialize, Deserialize)]
pub struct ModelTable {
	#[deref]
	#[deref_mut]
	table: Table,
	biblio: Option<Table>,
	profiles: Table,
}

impl ModelTable {
	pub fn new(table: Table) -> Self {
		Self {
			table,
			biblio: None,
			profiles: Table::default(),
		}
	}

	pub fn table(&self) -> &Table {
		&self.table
	}

	pub fn into_table(self) -> Table {
		self.table
	}

	pub fn biblio(&self) -> Option<&Table> {
		self.biblio.as_ref()
	}

	pub fn set_biblio(&mut self, biblio: Option<Table>) {
		self.biblio = biblio;
	}

	pub fn profiles(&self) -> &Table {
		&self.profiles
	}

	pub fn profiles_mut(&mut self) -> &mut Table {
		&mut self.profiles
	}

	/// Move every row whose type column reads `profile` into the profile
	/// table. Returns how many rows moved.
	pub fn extract_profiles(&mut self, type_column: usize) -> usize {
		let keys: Vec<String> = self
			.table
			.iter()
			.filter(|(_, row)| {
				row.value(type_column)
					.is_some_and(|value| value.eq_ignore_ascii_case("profile"))
			})
			.map(|(key, _)| key.to_string())
			.collect();

		for key in &keys {
			if let Some(row) = self.table.remove(key) {
				self.profiles.insert(key.clone(), row);
			}
		}

		keys.len()
	}

	/// Splice a component's rows in after its anchor. An empty anchor is the
	/// root, so the rows go to the end.
	pub fn insert_component(&mut self, component: &Component) -> MtabResult<usize> {
		let anchor = component.anchor();
		let spot = if anchor.is_empty() {
			self.table.len()
		} else {
			self.table.find_spot_after(&anchor)?
		};

		tracing::debug!(
			component = %component.name,
			anchor = %anchor,
			spot,
			"inserting component"
		);

		Ok(self.table.insert_table_at(spot, &component.table))
	}
}
