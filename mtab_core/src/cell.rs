use serde::Deserialize;
use serde::Serialize;

/// Sentinel stored in cells that have never received data.
pub const BLANK_CELL: &str = "&nbsp;";

/// How a later version's value combines with this cell during a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeAction {
	#[default]
	Replace,
	/// Newer text goes after the older text.
	Append,
	/// Newer text goes before the older text.
	Prefix,
}

/// One table cell together with its diff state.
///
/// A freshly constructed cell is `fresh`. The first explicit [`Cell::set`]
/// clears `fresh`, and `changed` reports whether that write altered the value.
/// [`Cell::silent_set`] rewrites the value without touching any flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
	value: String,
	empty: bool,
	fresh: bool,
	changed: bool,
	action: MergeAction,
}

impl Default for Cell {
	fn default() -> Self {
		Self::new(BLANK_CELL)
	}
}

impl Cell {
	pub fn new(value: impl Into<String>) -> Self {
		let value = value.into();
		Self {
			empty: value == BLANK_CELL,
			value,
			fresh: true,
			changed: false,
			action: MergeAction::Replace,
		}
	}

	pub fn value(&self) -> &str {
		&self.value
	}

	pub fn is_blank(&self) -> bool {
		self.value == BLANK_CELL
	}

	pub fn is_empty(&self) -> bool {
		self.empty
	}

	pub fn is_fresh(&self) -> bool {
		self.fresh
	}

	pub fn is_changed(&self) -> bool {
		self.changed
	}

	pub fn merge_action(&self) -> MergeAction {
		self.action
	}

	/// Whether merges should concatenate onto this cell instead of replacing it.
	pub fn is_append(&self) -> bool {
		self.action == MergeAction::Append
	}

	/// Write a value and record whether it changed.
	pub fn set(&mut self, value: impl Into<String>, action: MergeAction) {
		let value = value.into();
		self.action = action;
		self.fresh = false;
		self.empty = value == BLANK_CELL;
		self.changed = value != self.value;

		if self.changed {
			self.value = value;
		}
	}

	/// Rewrite the value for presentation only.
	pub fn silent_set(&mut self, value: impl Into<String>) {
		self.value = value.into();
	}

	/// Prefix the value without touching flags.
	pub fn prepend(&mut self, prefix: &str) {
		self.value.insert_str(0, prefix);
	}

	pub fn make_stale(&mut self) {
		self.fresh = false;
		self.changed = false;
	}

	pub fn make_fresh(&mut self) {
		self.fresh = true;
		self.changed = false;
	}

	pub(crate) fn mark_changed(&mut self) {
		self.changed = true;
	}
}
