use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::MtabResult;
use crate::lexer::tokenize_tag;

/// The attribute every non-closer tag carries, mirroring its own type.
pub const TYPE_ATTRIBUTE: &str = "type";

/// A single parsed `<...>` construct.
///
/// Tags are flat tokens: nothing links an opener to its closer. Consumers
/// match them up by type while walking a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
	/// The tag name, e.g. `parameter` for `<parameter name="X">`.
	r#type: String,
	/// Attribute pairs with quotes stripped. Non-closers always contain a
	/// synthetic `type` entry.
	attributes: BTreeMap<String, String>,
	/// `true` for `</type>`.
	is_closer: bool,
	/// `true` when a `/` sits immediately before the final `>`.
	is_self_closing: bool,
}

impl Tag {
	/// Tokenize the raw text of exactly one tag.
	///
	/// ```rust
	/// use mtab_core::Tag;
	///
	/// let tag = Tag::parse(r#"<parameter name="Enable" access="readWrite"/>"#).unwrap();
	/// assert_eq!(tag.r#type(), "parameter");
	/// assert_eq!(tag.attribute("name"), Some("Enable"));
	/// assert!(tag.is_self_closing());
	/// ```
	pub fn parse(raw: &str) -> MtabResult<Self> {
		tokenize_tag(raw)
	}

	/// Create an opening tag with only the synthetic `type` attribute.
	pub fn new(r#type: impl Into<String>) -> Self {
		let r#type = r#type.into();
		let mut attributes = BTreeMap::new();
		attributes.insert(TYPE_ATTRIBUTE.to_string(), r#type.clone());

		Self::from_parts(r#type, attributes, false, false)
	}

	/// Create a closing tag, `</type>`.
	pub fn closer(r#type: impl Into<String>) -> Self {
		Self::from_parts(r#type.into(), BTreeMap::new(), true, false)
	}

	pub(crate) fn from_parts(
		r#type: String,
		attributes: BTreeMap<String, String>,
		is_closer: bool,
		is_self_closing: bool,
	) -> Self {
		Self {
			r#type,
			attributes,
			is_closer,
			is_self_closing,
		}
	}

	/// Builder style attribute injection.
	#[must_use]
	pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.set_attribute(key, value);
		self
	}

	pub(crate) fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.attributes.insert(key.into(), value.into());
	}

	#[must_use]
	pub fn self_closing(mut self) -> Self {
		self.is_self_closing = true;
		self
	}

	pub fn r#type(&self) -> &str {
		&self.r#type
	}

	/// Case-insensitive comparison of the tag type.
	pub fn is_type(&self, r#type: &str) -> bool {
		self.r#type.eq_ignore_ascii_case(r#type)
	}

	pub fn attributes(&self) -> &BTreeMap<String, String> {
		&self.attributes
	}

	pub fn attribute(&self, key: &str) -> Option<&str> {
		self.attributes.get(key).map(String::as_str)
	}

	pub fn has_attribute(&self, key: &str) -> bool {
		self.attributes.contains_key(key)
	}

	/// The value of the first attribute in `keys` that is present.
	pub fn first_attribute<S: AsRef<str>>(&self, keys: &[S]) -> Option<&str> {
		keys.iter().find_map(|key| self.attribute(key.as_ref()))
	}

	pub fn is_closer(&self) -> bool {
		self.is_closer
	}

	pub fn is_self_closing(&self) -> bool {
		self.is_self_closing
	}

	/// `true` for the closer of a tag with the given type.
	pub fn closes(&self, r#type: &str) -> bool {
		self.is_closer && self.is_type(r#type)
	}
}

impl Display for Tag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.is_closer {
			return write!(f, "</{}>", self.r#type);
		}

		write!(f, "<{}", self.r#type)?;

		for (key, value) in &self.attributes {
			if key == TYPE_ATTRIBUTE {
				continue;
			}

			if value.contains('"') {
				write!(f, " {key}='{value}'")?;
			} else {
				write!(f, " {key}=\"{value}\"")?;
			}
		}

		if self.is_self_closing {
			write!(f, "/>")
		} else {
			write!(f, ">")
		}
	}
}
