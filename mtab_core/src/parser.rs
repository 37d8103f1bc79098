use serde::Deserialize;
use serde::Serialize;

use crate::ColumnSchema;
use crate::Document;
use crate::HEADER_ROW_KEY;
use crate::HandlerRegistry;
use crate::Item;
use crate::ModelTable;
use crate::MtabError;
use crate::MtabResult;
use crate::Row;
use crate::Table;
use crate::Tag;
use crate::path::abbreviate_version;
use crate::path::join_key;

/// Attributes used to name rows when no other list is given.
pub const STANDARD_LABELS: [&str; 2] = ["name", "base"];

/// Attributes naming the element a row follows, checked in order.
pub const PREVIOUS_LINK_ATTRIBUTES: [&str; 3] = [
	"dmr:previousParameter",
	"dmr:previousObject",
	"dmr:previousProfile",
];

/// Identifies the container to table and how its rows are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
	/// Attribute that marks the container tag.
	pub attribute: String,
	/// Required value of [`ContainerSpec::attribute`].
	pub value: String,
	/// Tag type whose occurrences open a new key prefix, e.g. `object`.
	pub major_item: Option<String>,
	/// Attributes tried in order to name a row.
	pub labels: Vec<String>,
	/// Whether the container tag itself produces a row.
	pub include_container: bool,
}

impl ContainerSpec {
	pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			attribute: attribute.into(),
			value: value.into(),
			major_item: None,
			labels: STANDARD_LABELS.iter().map(ToString::to_string).collect(),
			include_container: false,
		}
	}

	/// The container of a model document: `<model name="...">`.
	pub fn model(name: impl Into<String>) -> Self {
		Self::new("name", name).with_major_item("object")
	}

	/// The container of a bibliography document: `<bibliography>`.
	pub fn bibliography() -> Self {
		Self::new("type", "bibliography").with_labels(["id"])
	}

	#[must_use]
	pub fn with_major_item(mut self, major_item: impl Into<String>) -> Self {
		self.major_item = Some(major_item.into());
		self
	}

	#[must_use]
	pub fn with_labels<I, S>(mut self, labels: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.labels = labels.into_iter().map(Into::into).collect();
		self
	}

	#[must_use]
	pub fn including_container(mut self) -> Self {
		self.include_container = true;
		self
	}

	fn is_major(&self, tag: &Tag) -> bool {
		self.major_item
			.as_deref()
			.is_some_and(|major| tag.is_type(major))
	}
}

/// When `missing` is absent from a tag, copy the value of `from` into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitute {
	pub missing: String,
	pub from: String,
}

impl Substitute {
	pub fn new(missing: impl Into<String>, from: impl Into<String>) -> Self {
		Self {
			missing: missing.into(),
			from: from.into(),
		}
	}

	fn apply(&self, tag: &mut Tag) {
		if tag.has_attribute(&self.missing) {
			return;
		}

		if let Some(value) = tag.attribute(&self.from).map(str::to_string) {
			tag.set_attribute(self.missing.clone(), value);
		}
	}
}

/// A reusable fragment parsed on its own, waiting to be spliced into a
/// parent table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
	/// Name of the `<component>` definition.
	pub name: String,
	pub description: Option<String>,
	/// Path prefix every row key received.
	pub path: String,
	/// The element the component follows, relative to `path`.
	pub previous: Option<String>,
	pub table: Table,
}

impl Component {
	/// The full key of the row this component is inserted after.
	pub fn anchor(&self) -> String {
		match &self.previous {
			Some(previous) => format!("{}{previous}", self.path),
			None => self.path.clone(),
		}
	}
}

/// The output of [`TableParser::parse_container`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContainer {
	pub table: ModelTable,
	pub components: Vec<Component>,
}

/// Turns a [`Document`] into a path keyed table.
#[derive(Debug)]
pub struct TableParser {
	columns: ColumnSchema,
	handlers: HandlerRegistry,
	substitutes: Vec<Substitute>,
}

impl Default for TableParser {
	fn default() -> Self {
		Self::new(ColumnSchema::model())
	}
}

/// Loop state of a single container walk.
struct Walk {
	row: Row,
	key: Option<String>,
	previous: Option<String>,
	/// Full keys of the major items currently open, innermost last.
	major_keys: Vec<String>,
}

impl Walk {
	fn prefix(&self) -> &str {
		self.major_keys.last().map_or("", String::as_str)
	}
}

impl TableParser {
	pub fn new(columns: ColumnSchema) -> Self {
		Self {
			columns,
			handlers: HandlerRegistry::standard(),
			substitutes: vec![Substitute::new("name", "base")],
		}
	}

	#[must_use]
	pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
		self.handlers = handlers;
		self
	}

	#[must_use]
	pub fn with_substitutes(mut self, substitutes: Vec<Substitute>) -> Self {
		self.substitutes = substitutes;
		self
	}

	pub fn columns(&self) -> &ColumnSchema {
		&self.columns
	}

	pub fn handlers(&self) -> &HandlerRegistry {
		&self.handlers
	}

	fn substitute(&self, tag: &mut Tag) {
		if tag.is_closer() {
			return;
		}

		for substitute in &self.substitutes {
			substitute.apply(tag);
		}
	}

	/// Table the container identified by `spec`.
	///
	/// `doc` is not consumed. Items before the container become the table's
	/// preamble and items after it the trailer.
	pub fn parse_container(
		&self,
		doc: &Document,
		spec: &ContainerSpec,
		biblio: Option<&Table>,
	) -> MtabResult<ParsedContainer> {
		let table = self.parse_body(doc.clone(), spec)?;
		let mut table = ModelTable::new(table);
		table.set_biblio(biblio.cloned());

		let components = if doc.contains_tag_type("component") && doc.contains_tag_type("model") {
			self.extract_components(doc, spec)?
		} else {
			Vec::new()
		};

		Ok(ParsedContainer { table, components })
	}

	/// Parse a bibliography document into a table with a header row whose
	/// name cells carry link targets.
	pub fn parse_bibliography(doc: &Document) -> MtabResult<Table> {
		let parser = Self::new(ColumnSchema::bibliography()).with_substitutes(Vec::new());
		let mut body = parser.parse_body(doc.clone(), &ContainerSpec::bibliography())?;

		for index in 0..body.len() {
			if let Some((key, row)) = body.get_index_mut(index) {
				let anchor = format!("<a name=\"{key}\"></a>");
				if let Some(cell) = row.get_mut(0) {
					cell.prepend(&anchor);
				}
			}
		}

		let mut table = Table::new().with_version(doc.version());
		table.insert(HEADER_ROW_KEY, parser.columns.header_row());
		table.extend_from(&body);
		table.make_stale();

		Ok(table)
	}

	fn parse_body(&self, mut doc: Document, spec: &ContainerSpec) -> MtabResult<Table> {
		let mut preamble = doc.empty_like();

		let container = loop {
			let Some(item) = doc.poll() else {
				return Err(MtabError::UnresolvedBoundary {
					attribute: spec.attribute.clone(),
					value: spec.value.clone(),
				});
			};

			match item {
				Item::Tag(mut tag) => {
					self.substitute(&mut tag);
					if !tag.is_closer() && tag.attribute(&spec.attribute) == Some(spec.value.as_str()) {
						break tag;
					}
					preamble.push(Item::Tag(tag));
				}
				text @ Item::Text(_) => preamble.push(text),
			}
		};

		let container_type = container.r#type().to_string();
		let mut table = Table::new().with_version(doc.version());
		table.set_preamble(preamble);

		let mut walk = Walk {
			row: self.columns.blank_row(),
			key: None,
			previous: None,
			major_keys: Vec::new(),
		};

		let mut pending = spec.include_container.then_some(container);

		loop {
			let tag = match pending.take() {
				Some(tag) => tag,
				None => {
					if doc
						.peek_tag()
						.is_some_and(|tag| tag.closes(&container_type))
					{
						doc.poll();
						break;
					}

					match doc.poll() {
						Some(Item::Tag(tag)) => tag,
						Some(Item::Text(text)) => {
							tracing::warn!(text = %text, "ignoring text outside of a column tag");
							continue;
						}
						None => break,
					}
				}
			};

			self.process_tag(tag, &mut doc, spec, &mut walk, &mut table)?;
		}

		self.commit(&mut walk, &mut table);

		if let Some(version_column) = self.columns.version_column() {
			let version = abbreviate_version(doc.version()).to_string();
			for row in table.rows_mut() {
				row.set(version_column, version.clone());
			}
		}

		table.set_trailer(doc);
		Ok(table)
	}

	fn process_tag(
		&self,
		mut tag: Tag,
		doc: &mut Document,
		spec: &ContainerSpec,
		walk: &mut Walk,
		table: &mut Table,
	) -> MtabResult<()> {
		self.substitute(&mut tag);

		if let Some(column) = self.columns.index_of_tag(tag.r#type()) {
			// Handlers consume their own closers, so a closer here is stray.
			if !tag.is_closer() {
				let handler = self.handlers.require(tag.r#type())?;
				handler.handle(doc, &tag, &self.columns, &mut walk.row, column)?;
			}

			return Ok(());
		}

		if tag.is_closer() {
			self.commit(walk, table);

			if spec.is_major(&tag) {
				walk.major_keys.pop();
			}

			return Ok(());
		}

		self.commit(walk, table);

		let prefix = walk.prefix().to_string();
		let key = tag
			.first_attribute(&spec.labels)
			.map(|label| join_key(&prefix, label));

		if spec.is_major(&tag) && !tag.is_self_closing() {
			walk.major_keys.push(key.clone().unwrap_or_else(|| prefix.clone()));
		}

		walk.previous = tag
			.first_attribute(&PREVIOUS_LINK_ATTRIBUTES)
			.map(|previous| {
				if previous.is_empty() {
					prefix.clone()
				} else {
					previous.to_string()
				}
			});
		walk.key = key;

		if let Some(type_column) = self.columns.type_column() {
			walk.row.set(type_column, tag.r#type());
		}

		for (index, column) in self.columns.iter().enumerate() {
			if let Some(value) = tag.attribute(&column.tag) {
				walk.row.set(index, value);
			}
		}

		for (key, value) in tag.attributes() {
			walk.row.set_attribute(key.clone(), value.clone());
		}

		Ok(())
	}

	/// Store the accumulated row if it is real, then start a new one.
	fn commit(&self, walk: &mut Walk, table: &mut Table) {
		let row = std::mem::replace(&mut walk.row, self.columns.blank_row());
		let key = walk.key.take();
		let previous = walk.previous.take();

		if !row.is_real() {
			return;
		}

		let Some(key) = key else {
			tracing::debug!("dropping a row without a label");
			return;
		};

		if let Some(previous) = previous {
			table.add_previous_link(key.clone(), previous);
		}

		table.insert(key, row);
	}

	/// Parse every `<component>` definition referenced from the model into
	/// its own table.
	fn extract_components(&self, doc: &Document, spec: &ContainerSpec) -> MtabResult<Vec<Component>> {
		let mut references: Vec<Tag> = Vec::new();
		let mut inside_model = false;

		for tag in doc.tags() {
			if tag.is_type("model") {
				if tag.is_closer() {
					inside_model = false;
				} else {
					inside_model = tag.attribute("name") == Some(spec.value.as_str());
				}
				continue;
			}

			if inside_model && tag.is_type("component") && !tag.is_closer() && tag.has_attribute("ref") {
				references.push(tag.clone());
			}
		}

		let mut components = Vec::new();

		for reference in references {
			let Some(name) = reference.attribute("ref") else {
				continue;
			};

			let Some((definition, description)) = component_definition(doc, name) else {
				tracing::warn!(component = name, "component referenced but never defined");
				continue;
			};

			let mut component_spec = ContainerSpec::new("name", name).with_labels(spec.labels.clone());
			component_spec.major_item.clone_from(&spec.major_item);
			let body = self.parse_body(definition, &component_spec)?;

			let path = reference.attribute("path").unwrap_or_default().to_string();
			let type_column = self.columns.type_column();
			let major_item = spec.major_item.as_deref();
			let mut table = Table::new().with_version(doc.version());

			for (key, row) in &body {
				let mut row = row.clone();
				let is_major = match (type_column, major_item) {
					(Some(column), Some(major)) => {
						row.value(column)
							.is_some_and(|value| value.eq_ignore_ascii_case(major))
					}
					_ => false,
				};

				if is_major {
					if let Some(cell) = row.get_mut(0) {
						cell.prepend(&path);
					}
				}

				table.insert(format!("{path}{key}"), row);
			}

			tracing::debug!(component = name, rows = table.len(), path = %path, "parsed component");

			components.push(Component {
				name: name.to_string(),
				description,
				path,
				previous: reference.attribute("dmr:previousObject").map(str::to_string),
				table,
			});
		}

		Ok(components)
	}
}

/// Copy the items of the `<component name="...">` definition into a new
/// document, opener included and closer excluded. A leading description is
/// split off.
fn component_definition(doc: &Document, name: &str) -> Option<(Document, Option<String>)> {
	let mut items = doc.iter();

	let opener = items.by_ref().find_map(|item| {
		item.as_tag().filter(|tag| {
			tag.is_type("component")
				&& !tag.is_closer()
				&& !tag.is_self_closing()
				&& tag.attribute("name") == Some(name)
		})
	})?;

	let mut definition = doc.empty_like();
	definition.push(Item::Tag(opener.clone()));

	let mut depth = 0usize;
	let mut description: Option<String> = None;
	let mut reading_description = false;
	let mut body_started = false;

	for item in items {
		if let Some(tag) = item.as_tag() {
			if tag.is_type("component") && !tag.is_self_closing() {
				if tag.is_closer() {
					if depth == 0 {
						break;
					}
					depth -= 1;
				} else {
					depth += 1;
				}
			}

			if !body_started && tag.is_type("description") {
				if tag.is_closer() {
					reading_description = false;
					body_started = true;
				} else {
					reading_description = true;
					description = Some(String::new());
				}
				continue;
			}

			body_started = true;
		}

		if reading_description {
			if let (Some(text), Some(description)) = (item.as_text(), description.as_mut()) {
				if !description.is_empty() {
					description.push(' ');
				}
				description.push_str(text);
			}
			continue;
		}

		definition.push(item.clone());
	}

	Some((definition, description))
}
