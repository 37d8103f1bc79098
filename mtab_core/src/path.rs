use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Segment marking a repeating (multi-instance) element.
pub const ARRAY_MARKER: &str = "{i}";
/// Separator between path segments.
pub const DELIMITER: char = '.';
/// Display name of the empty path.
pub const ROOT_NAME: &str = "ROOT";

/// A dotted hierarchical key such as `Device.Hosts.Host.{i}.`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path {
	segments: Vec<String>,
}

impl Path {
	pub fn new<I, S>(segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			segments: segments.into_iter().map(Into::into).collect(),
		}
	}

	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	pub fn is_root(&self) -> bool {
		self.segments.is_empty()
	}

	/// Number of segments, array markers excluded.
	pub fn depth(&self) -> usize {
		self.segments.iter().filter(|s| *s != ARRAY_MARKER).count()
	}

	/// A copy of this path with every array marker removed.
	#[must_use]
	pub fn without_array_markers(&self) -> Self {
		Self::new(self.segments.iter().filter(|s| *s != ARRAY_MARKER).cloned())
	}

	/// Everything but the last segment.
	#[must_use]
	pub fn parent(&self) -> Self {
		let mut segments = self.segments.clone();
		segments.pop();
		Self { segments }
	}

	/// The last segment, or [`ROOT_NAME`] for the empty path.
	pub fn last_part(&self) -> &str {
		self.segments.last().map_or(ROOT_NAME, String::as_str)
	}

	/// `true` when the final segment is the array marker.
	pub fn is_array(&self) -> bool {
		self.segments.last().is_some_and(|s| s == ARRAY_MARKER)
	}

	/// `true` when `self` sits exactly one level below `other`, ignoring array
	/// markers on both sides.
	pub fn is_direct_child_of(&self, other: &Path) -> bool {
		let own = self.without_array_markers();
		!own.is_root() && own.parent() == other.without_array_markers()
	}

	/// `true` when both paths share a parent, ignoring array markers.
	pub fn is_on_same_level_as(&self, other: &Path) -> bool {
		self.without_array_markers().parent() == other.without_array_markers().parent()
	}

	/// Compare by depth only, array markers excluded.
	///
	/// `Greater` means `self` is nested more deeply than `other`. Paths of the
	/// same depth compare `Equal` whatever their segments say; use `==` for
	/// identity.
	pub fn compare_depth(&self, other: &Path) -> Ordering {
		self.depth().cmp(&other.depth())
	}

	pub fn is_deeper_than(&self, other: &Path) -> bool {
		self.compare_depth(other) == Ordering::Greater
	}

	pub fn is_shallower_than(&self, other: &Path) -> bool {
		self.compare_depth(other) == Ordering::Less
	}
}

impl FromStr for Path {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::new(s.split(DELIMITER).filter(|segment| !segment.is_empty())))
	}
}

impl From<&str> for Path {
	fn from(value: &str) -> Self {
		Self::new(value.split(DELIMITER).filter(|segment| !segment.is_empty()))
	}
}

impl Display for Path {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.segments.is_empty() {
			return write!(f, "{ROOT_NAME}");
		}

		let separator = DELIMITER.to_string();
		write!(f, "{}", self.segments.join(separator.as_str()))
	}
}

/// Append a row label to a key prefix, inserting a delimiter when the prefix
/// does not already end with one.
///
/// ```rust
/// use mtab_core::path::join_key;
///
/// assert_eq!(join_key("Device.", "Enable"), "Device.Enable");
/// assert_eq!(join_key("Foo", "X"), "Foo.X");
/// assert_eq!(join_key("", "Device."), "Device.");
/// ```
pub fn join_key(prefix: &str, label: &str) -> String {
	if prefix.is_empty() || prefix.ends_with(DELIMITER) {
		format!("{prefix}{label}")
	} else {
		format!("{prefix}{DELIMITER}{label}")
	}
}

/// Strip a single trailing delimiter.
pub fn trim_delimiter(key: &str) -> &str {
	key.strip_suffix(DELIMITER).unwrap_or(key)
}

/// Everything after the first `:` of a model version, e.g. `Device:2.4`
/// becomes `2.4`.
pub fn abbreviate_version(version: &str) -> &str {
	version.split_once(':').map_or(version, |(_, short)| short)
}
