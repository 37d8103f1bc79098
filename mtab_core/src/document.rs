use std::collections::VecDeque;
use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::MtabError;
use crate::MtabResult;
use crate::Tag;
use crate::lexer::find_tag_end;

/// One entry of a [`Document`] stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
	Tag(Tag),
	Text(String),
}

impl Item {
	pub fn as_tag(&self) -> Option<&Tag> {
		match self {
			Item::Tag(tag) => Some(tag),
			Item::Text(_) => None,
		}
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			Item::Text(text) => Some(text),
			Item::Tag(_) => None,
		}
	}
}

impl Display for Item {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Item::Tag(tag) => write!(f, "{tag}"),
			Item::Text(text) => write!(f, "{text}"),
		}
	}
}

/// A linear FIFO stream of tags and text taken from one source file.
///
/// Nothing here validates nesting. Consumers poll items off the front and
/// decide for themselves which closer ends which opener. `Clone` yields an
/// independent snapshot, so a consumer can work on a copy and leave the
/// original untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
	items: VecDeque<Item>,
	version: String,
	source_path: String,
}

impl Document {
	/// Build a document by scanning `text` end to end.
	///
	/// Text between tags is trimmed and kept only when non-empty. Comments
	/// (`<!-- ... -->`) are dropped.
	pub fn parse(text: &str) -> MtabResult<Self> {
		let mut document = Self::default();
		let mut rest = text;

		loop {
			let Some(start) = rest.find('<') else {
				document.push_text(rest);
				break;
			};

			document.push_text(&rest[..start]);
			let tail = &rest[start..];

			if let Some(comment) = tail.strip_prefix("<!--") {
				let Some(end) = comment.find("-->") else {
					return Err(MtabError::UnterminatedTag(snippet(tail)));
				};
				rest = &comment[end + 3..];
				continue;
			}

			let Some(end) = find_tag_end(tail) else {
				return Err(MtabError::UnterminatedTag(snippet(tail)));
			};

			let raw = &tail[..=end];
			if raw[..end].ends_with(char::is_whitespace) {
				tracing::warn!(tag = raw, "whitespace before closing `>`");
			}

			document.push(Item::Tag(Tag::parse(raw)?));
			rest = &tail[end + 1..];
		}

		Ok(document)
	}

	/// Create an empty document sharing this document's version and path.
	pub fn empty_like(&self) -> Self {
		Self {
			items: VecDeque::new(),
			version: self.version.clone(),
			source_path: self.source_path.clone(),
		}
	}

	#[must_use]
	pub fn with_version(mut self, version: impl Into<String>) -> Self {
		self.version = version.into();
		self
	}

	#[must_use]
	pub fn with_source_path(mut self, source_path: impl Into<String>) -> Self {
		self.source_path = source_path.into();
		self
	}

	pub fn version(&self) -> &str {
		&self.version
	}

	pub fn source_path(&self) -> &str {
		&self.source_path
	}

	fn push_text(&mut self, text: &str) {
		let text = text.trim();
		if !text.is_empty() {
			self.push(Item::Text(text.to_string()));
		}
	}

	pub fn push(&mut self, item: Item) {
		self.items.push_back(item);
	}

	pub fn peek(&self) -> Option<&Item> {
		self.items.front()
	}

	/// The front item when it is a tag.
	pub fn peek_tag(&self) -> Option<&Tag> {
		self.peek().and_then(Item::as_tag)
	}

	pub fn poll(&mut self) -> Option<Item> {
		self.items.pop_front()
	}

	/// Poll the front item only when it is text.
	pub fn poll_text(&mut self) -> Option<String> {
		match self.items.front() {
			Some(Item::Text(_)) => {
				match self.items.pop_front() {
					Some(Item::Text(text)) => Some(text),
					_ => None,
				}
			}
			_ => None,
		}
	}

	/// Poll the front item only when it is the closer of `type`.
	pub fn poll_closer(&mut self, r#type: &str) -> Option<Tag> {
		if self.peek_tag().is_some_and(|tag| tag.closes(r#type)) {
			return match self.items.pop_front() {
				Some(Item::Tag(tag)) => Some(tag),
				_ => None,
			};
		}

		None
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Item> {
		self.items.iter()
	}

	pub fn tags(&self) -> impl Iterator<Item = &Tag> {
		self.items.iter().filter_map(Item::as_tag)
	}

	/// Split the stream in front of the first tag of the given type.
	///
	/// Returns `(skipped, remainder)`: everything before that tag, and the
	/// rest of the stream starting with it. When no such tag exists the
	/// remainder is empty.
	pub fn skip_to_tag_of_type(mut self, r#type: &str) -> (Self, Self) {
		let mut skipped = self.empty_like();

		while let Some(item) = self.items.front() {
			if item.as_tag().is_some_and(|tag| tag.is_type(r#type)) {
				break;
			}

			if let Some(item) = self.items.pop_front() {
				skipped.push(item);
			}
		}

		(skipped, self)
	}

	/// Case-insensitive search for `needle` within any text item.
	pub fn contains_text(&self, needle: &str) -> bool {
		let needle = needle.to_lowercase();
		self.items.iter().any(|item| {
			item.as_text()
				.is_some_and(|text| text.to_lowercase().contains(&needle))
		})
	}

	/// `true` if any tag has the given type, ignoring case.
	pub fn contains_tag_type(&self, r#type: &str) -> bool {
		self.tags().any(|tag| tag.is_type(r#type))
	}
}

impl Extend<Item> for Document {
	fn extend<T: IntoIterator<Item = Item>>(&mut self, iter: T) {
		self.items.extend(iter);
	}
}

impl IntoIterator for Document {
	type IntoIter = std::collections::vec_deque::IntoIter<Item>;
	type Item = Item;

	fn into_iter(self) -> Self::IntoIter {
		self.items.into_iter()
	}
}

impl Display for Document {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for item in &self.items {
			writeln!(f, "{item}")?;
		}

		Ok(())
	}
}

fn snippet(text: &str) -> String {
	text.chars().take(40).collect()
}
