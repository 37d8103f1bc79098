use std::collections::HashMap;

use crate::ColumnSchema;
use crate::HEADER_ROW_KEY;
use crate::ModelTable;
use crate::MtabResult;
use crate::Row;
use crate::Table;
use crate::path::abbreviate_version;

/// A contiguous run of rows starting at a major item (or at the top of the
/// table for rows before the first major item).
struct Block<'a> {
	rows: Vec<(&'a str, &'a Row)>,
}

impl<'a> Block<'a> {
	fn first_key(&self) -> Option<&'a str> {
		self.rows.first().map(|(key, _)| *key)
	}

	fn get(&self, key: &str) -> Option<&'a Row> {
		self.rows
			.iter()
			.find_map(|(candidate, row)| (*candidate == key).then_some(*row))
	}
}

/// Merges an older table into a newer one, flagging what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Differ {
	major_item: String,
	version_column: usize,
	type_column: usize,
}

impl Differ {
	/// The type column defaults to the second column.
	pub fn new(major_item: impl Into<String>, version_column: usize) -> Self {
		Self {
			major_item: major_item.into(),
			version_column,
			type_column: 1,
		}
	}

	/// Take the version and type columns from a schema.
	pub fn for_columns(columns: &ColumnSchema, major_item: impl Into<String>) -> Self {
		let mut differ = Self::new(
			major_item,
			columns
				.version_column()
				.unwrap_or_else(|| columns.width().saturating_sub(1)),
		);

		if let Some(type_column) = columns.type_column() {
			differ.type_column = type_column;
		}

		differ
	}

	#[must_use]
	pub fn with_type_column(mut self, type_column: usize) -> Self {
		self.type_column = type_column;
		self
	}

	pub fn version_column(&self) -> usize {
		self.version_column
	}

	fn is_major(&self, row: &Row) -> bool {
		row.value(self.type_column)
			.is_some_and(|value| value.eq_ignore_ascii_case(&self.major_item))
	}

	fn partition<'a>(&self, table: &'a Table) -> Vec<Block<'a>> {
		let mut blocks: Vec<Block<'a>> = Vec::new();
		let mut current = Block { rows: Vec::new() };

		for (key, row) in table.iter() {
			if self.is_major(row) && !current.rows.is_empty() {
				blocks.push(std::mem::replace(&mut current, Block { rows: Vec::new() }));
			}

			current.rows.push((key, row));
		}

		if !current.rows.is_empty() {
			blocks.push(current);
		}

		blocks
	}

	/// Diff `newer` against `older`.
	///
	/// Neither input is modified. Both are copied and reset to stale first, so
	/// the flags on the result describe this step alone:
	///
	/// - rows only in `older` keep their values, stale;
	/// - rows in both are merged with [`Row::merge`], and cells that differ are
	///   marked changed;
	/// - rows only in `newer` are fresh.
	pub fn diff(&self, newer: &ModelTable, older: &ModelTable) -> MtabResult<ModelTable> {
		let mut newer_rows = newer.table().clone();
		let mut older_rows = older.table().clone();
		newer_rows.make_stale();
		older_rows.make_stale();

		let newer_blocks = self.partition(&newer_rows);
		let older_blocks = self.partition(&older_rows);

		let newer_by_first_key: HashMap<&str, usize> = newer_blocks
			.iter()
			.enumerate()
			.filter_map(|(index, block)| block.first_key().map(|key| (key, index)))
			.collect();

		let mut result = Table::new();

		for older_block in &older_blocks {
			let matched = older_block
				.first_key()
				.and_then(|key| newer_by_first_key.get(key))
				.map(|index| &newer_blocks[*index]);

			let Some(newer_block) = matched else {
				for (key, row) in &older_block.rows {
					result.insert(*key, (*row).clone());
				}
				continue;
			};

			for (key, older_row) in &older_block.rows {
				let row = match newer_block.get(key) {
					Some(newer_row) => older_row.merge(newer_row, self.version_column)?,
					None => (*older_row).clone(),
				};
				result.insert(*key, row);
			}

			// Rows only in `newer` follow every row of the older block.
			for (key, newer_row) in &newer_block.rows {
				if result.contains_key(key) {
					continue;
				}

				let mut row = (*newer_row).clone();
				row.make_fresh();
				result.insert(*key, row);
			}
		}

		for newer_block in &newer_blocks {
			let Some(first_key) = newer_block.first_key() else {
				continue;
			};

			if result.contains_key(first_key) {
				continue;
			}

			for (key, row) in &newer_block.rows {
				let mut row = (*row).clone();
				row.make_fresh();
				result.insert(*key, row);
			}
		}

		let abbreviation = abbreviate_version(newer.version());
		for row in result.rows_mut() {
			if row.something_changed() {
				row.silent_set(self.version_column, abbreviation);
			} else if !row.all_cells_fresh() && row.value(self.version_column) != Some(abbreviation) {
				row.make_stale();
			}
		}

		if let Some(header) = result.get_mut(HEADER_ROW_KEY) {
			header.make_stale();
		}

		for (key, previous) in older.previous_links().iter().chain(newer.previous_links()) {
			result.add_previous_link(key.clone(), previous.clone());
		}

		result.set_version(format!(
			"{} diffed against {}",
			newer.version(),
			older.version()
		));
		result.set_preamble(newer.preamble().clone());
		result.set_trailer(newer.trailer().clone());

		tracing::debug!(
			version = result.version(),
			rows = result.len(),
			"diffed tables"
		);

		let mut diffed = ModelTable::new(result);
		diffed.set_biblio(newer.biblio().cloned());
		*diffed.profiles_mut() = newer.profiles().clone();

		Ok(diffed)
	}

	/// Fold a history of tables, oldest first, into one annotated table.
	///
	/// Each step diffs the next table against the running result. Returns
	/// `None` for an empty history.
	pub fn fold<I>(&self, history: I) -> MtabResult<Option<ModelTable>>
	where
		I: IntoIterator<Item = ModelTable>,
	{
		let mut result: Option<ModelTable> = None;

		for mut table in history {
			table.make_stale();
			result = Some(match result {
				Some(previous) => self.diff(&table, &previous)?,
				None => table,
			});
		}

		Ok(result)
	}
}

/// Diff `newer` against `older` with the type column in second position.
pub fn diff_tables(
	newer: &ModelTable,
	older: &ModelTable,
	major_item: &str,
	version_column: usize,
) -> MtabResult<ModelTable> {
	Differ::new(major_item, version_column).diff(newer, older)
}
