use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::BLANK_CELL;
use crate::BucketItem;
use crate::ColumnSchema;
use crate::Document;
use crate::Enumeration;
use crate::Item;
use crate::MergeAction;
use crate::MtabError;
use crate::MtabResult;
use crate::Row;
use crate::Tag;

/// Writes one column of a row from a column tag.
///
/// `tag` has already been polled from `doc`. A handler may keep polling
/// `doc` to consume the tag's content up to and including its closer.
pub trait TagHandler: Send + Sync {
	/// The tag type this handler is registered under.
	fn tag_type(&self) -> &str;

	fn handle(
		&self,
		doc: &mut Document,
		tag: &Tag,
		columns: &ColumnSchema,
		row: &mut Row,
		column: usize,
	) -> MtabResult<()>;
}

/// Collect every item up to the closer of `tag_type`, joined by spaces.
/// The closer itself is consumed.
fn collect_until_closer(doc: &mut Document, tag_type: &str) -> String {
	let mut parts = Vec::new();

	while let Some(item) = doc.poll() {
		match item {
			Item::Tag(tag) if tag.closes(tag_type) => break,
			Item::Tag(tag) => parts.push(tag.to_string()),
			Item::Text(text) => parts.push(text),
		}
	}

	parts.join(" ")
}

/// Copies the tag's text content into the cell.
#[derive(Debug, Clone)]
pub struct TextHandler {
	tag_type: String,
}

impl TextHandler {
	pub fn new(tag_type: impl Into<String>) -> Self {
		Self {
			tag_type: tag_type.into(),
		}
	}
}

impl TagHandler for TextHandler {
	fn tag_type(&self) -> &str {
		&self.tag_type
	}

	fn handle(
		&self,
		doc: &mut Document,
		tag: &Tag,
		_columns: &ColumnSchema,
		row: &mut Row,
		column: usize,
	) -> MtabResult<()> {
		if tag.is_self_closing() {
			return Ok(());
		}

		let text = collect_until_closer(doc, tag.r#type());
		if !text.is_empty() {
			row.set(column, text);
		}

		Ok(())
	}
}

/// Wraps the tag's text content in a link to itself.
#[derive(Debug, Clone, Default)]
pub struct HyperlinkHandler;

impl TagHandler for HyperlinkHandler {
	fn tag_type(&self) -> &str {
		"hyperlink"
	}

	fn handle(
		&self,
		doc: &mut Document,
		tag: &Tag,
		_columns: &ColumnSchema,
		row: &mut Row,
		column: usize,
	) -> MtabResult<()> {
		if tag.is_self_closing() {
			return Ok(());
		}

		let link = collect_until_closer(doc, tag.r#type());
		if !link.is_empty() {
			row.set(column, format!("<a href=\"{link}\">{link}</a>"));
		}

		Ok(())
	}
}

/// Description text. An `action` of `append` or `prefix` marks the cell so
/// merges join it after or before the older description.
#[derive(Debug, Clone, Default)]
pub struct DescriptionHandler;

impl DescriptionHandler {
	pub fn merge_action(tag: &Tag) -> MergeAction {
		match tag.attribute("action") {
			Some("append") => MergeAction::Append,
			Some("prefix") => MergeAction::Prefix,
			_ => MergeAction::Replace,
		}
	}
}

impl TagHandler for DescriptionHandler {
	fn tag_type(&self) -> &str {
		"description"
	}

	fn handle(
		&self,
		doc: &mut Document,
		tag: &Tag,
		_columns: &ColumnSchema,
		row: &mut Row,
		column: usize,
	) -> MtabResult<()> {
		if tag.is_self_closing() {
			return Ok(());
		}

		let text = collect_until_closer(doc, tag.r#type());
		row.set_with(column, text, Self::merge_action(tag));

		Ok(())
	}
}

/// Parameter syntax: data type, defaults and value facets.
#[derive(Debug, Clone, Default)]
pub struct SyntaxHandler;

impl SyntaxHandler {
	fn data_type_of(tag: &Tag) -> String {
		if tag.is_type("dataType") {
			return tag
				.first_attribute(&["ref", "base"])
				.unwrap_or("dataType")
				.to_string();
		}

		tag.r#type().to_lowercase()
	}
}

impl TagHandler for SyntaxHandler {
	fn tag_type(&self) -> &str {
		"syntax"
	}

	fn handle(
		&self,
		doc: &mut Document,
		tag: &Tag,
		columns: &ColumnSchema,
		row: &mut Row,
		column: usize,
	) -> MtabResult<()> {
		if tag.is_self_closing() {
			return Ok(());
		}

		let default_column = columns.index_of_tag("default");
		let description_column = columns.index_of_tag("description");
		let mut data_type: Option<String> = None;
		let mut max_length: Option<String> = None;
		let mut is_list = false;
		let mut in_enumeration = false;

		while let Some(item) = doc.poll() {
			let Item::Tag(inner) = item else {
				continue;
			};

			if inner.closes("syntax") {
				break;
			}

			if inner.closes("enumeration") {
				in_enumeration = false;
			}

			if inner.is_closer() {
				continue;
			}

			match inner.r#type().to_lowercase().as_str() {
				"list" if data_type.is_none() => is_list = true,
				"size" => {
					if data_type.is_some() {
						max_length = inner.attribute("maxLength").map(str::to_string);
					}
				}
				"default" => {
					let Some(default_column) = default_column else {
						continue;
					};

					let status = inner.attribute("status").filter(|s| !s.is_empty());
					let value = match (inner.attribute("value").filter(|v| !v.is_empty()), status) {
						(Some(value), _) => value.to_string(),
						(None, Some(status)) => format!("STATUS = {status}"),
						(None, None) => BLANK_CELL.to_string(),
					};
					row.set(default_column, value);

					if let (Some(status), Some(description_column)) = (status, description_column) {
						if row.get(description_column).is_some_and(crate::Cell::is_blank) {
							row.set(description_column, format!("STATUS = {status}"));
						}
					}
				}
				"enumeration" => {
					if let Some(value) = inner.attribute("value") {
						row.add_to_bucket(BucketItem::Enumeration(Enumeration {
							value: value.to_string(),
							description: None,
							access: inner.attribute("access").map(str::to_string),
						}));
						in_enumeration = !inner.is_self_closing();
					}
				}
				"description" => {
					let text = collect_until_closer(doc, "description");
					if in_enumeration {
						if let Some(enumeration) = row.last_enumeration_mut() {
							enumeration.description = Some(text);
						}
					}
				}
				"range" | "pathref" | "instanceref" | "enumerationref" => {}
				"pattern" => {
					if let Some(value) = inner.attribute("value") {
						row.declare_pattern(value);
					}
				}
				"units" => {
					if let Some(value) = inner.attribute("value") {
						row.set_attribute("units", value);
					}
				}
				_ if data_type.is_none() => {
					data_type = Some(Self::data_type_of(&inner));
					max_length = inner.attribute("maxLength").map(str::to_string);
				}
				_ => {}
			}
		}

		let mut value = match (data_type, max_length) {
			(Some(data_type), Some(max_length)) if data_type == "string" => {
				format!("string({max_length})")
			}
			(Some(data_type), _) => data_type,
			(None, _) => BLANK_CELL.to_string(),
		};

		if is_list {
			value = format!("list of {value}");
		}

		row.set(column, value);

		Ok(())
	}
}

/// Tag-type to handler lookup, built from an explicit list.
pub struct HandlerRegistry {
	handlers: BTreeMap<String, Box<dyn TagHandler>>,
}

impl HandlerRegistry {
	/// An empty registry.
	pub fn empty() -> Self {
		Self {
			handlers: BTreeMap::new(),
		}
	}

	/// The built-in handler set for model and bibliography documents.
	pub fn standard() -> Self {
		let mut registry = Self::empty();

		for text in ["name", "title", "date", "organization", "category"] {
			registry.register(TextHandler::new(text));
		}

		registry.register(HyperlinkHandler);
		registry.register(DescriptionHandler);
		registry.register(SyntaxHandler);
		registry
	}

	pub fn register(&mut self, handler: impl TagHandler + 'static) {
		self.handlers
			.insert(handler.tag_type().to_lowercase(), Box::new(handler));
	}

	pub fn get(&self, tag_type: &str) -> Option<&dyn TagHandler> {
		self.handlers
			.get(&tag_type.to_lowercase())
			.map(|handler| &**handler)
	}

	/// Like [`HandlerRegistry::get`], failing with
	/// [`MtabError::MissingHandler`].
	pub fn require(&self, tag_type: &str) -> MtabResult<&dyn TagHandler> {
		self.get(tag_type)
			.ok_or_else(|| MtabError::MissingHandler(tag_type.to_string()))
	}

	pub fn tag_types(&self) -> impl Iterator<Item = &str> {
		self.handlers.keys().map(String::as_str)
	}
}

impl Default for HandlerRegistry {
	fn default() -> Self {
		Self::standard()
	}
}

impl Debug for HandlerRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_set().entries(self.handlers.keys()).finish()
	}
}
