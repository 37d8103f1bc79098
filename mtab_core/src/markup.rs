use std::collections::HashMap;
use std::fmt::Display;
use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

use crate::HEADER_ROW_KEY;
use crate::MtabError;
use crate::MtabResult;
use crate::Path;
use crate::Row;
use crate::Table;
use crate::path::ARRAY_MARKER;
use crate::path::DELIMITER;

/// Every directive name the engine understands.
pub const KNOWN_DIRECTIVES: [&str; 22] = [
	"bibref",
	"section",
	"param",
	"object",
	"list",
	"nolist",
	"reference",
	"noreference",
	"enum",
	"noenum",
	"pattern",
	"nopattern",
	"hidden",
	"nohidden",
	"keys",
	"nokeys",
	"units",
	"false",
	"true",
	"empty",
	"null",
	"datatype",
];

/// Value of the BBF "Unknown Time".
const UNKNOWN_TIME: &str = "0001-01-01T00:00:00Z";

/// One `{{name|arg|...}}` occurrence inside cell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
	/// Byte range of the whole directive, braces included.
	pub range: Range<usize>,
	pub name: &'a str,
	pub args: Vec<&'a str>,
}

impl Directive<'_> {
	/// The text shown when the directive cannot be resolved.
	pub fn fallback(&self) -> String {
		format!("[{}]", self.args.last().copied().unwrap_or(self.name))
	}

	fn raw_fallback(&self) -> String {
		let mut parts = vec![self.name];
		parts.extend(self.args.iter().copied());
		format!("[{}]", parts.join("|"))
	}
}

/// Find every complete directive in `text`. An unterminated `{{` ends the
/// scan.
pub fn find_directives(text: &str) -> Vec<Directive<'_>> {
	let mut directives = Vec::new();
	let mut offset = 0;

	while let Some(start) = text[offset..].find("{{").map(|index| index + offset) {
		let Some(end) = text[start + 2..].find("}}").map(|index| index + start + 2) else {
			break;
		};

		let mut parts = text[start + 2..end].split('|').map(str::trim);
		let name = parts.next().unwrap_or_default();

		directives.push(Directive {
			range: start..end + 2,
			name,
			args: parts.collect(),
		});

		offset = end + 2;
	}

	directives
}

/// A problem found while resolving directives. Warnings never stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupWarning {
	pub row: String,
	pub message: String,
}

impl Display for MarkupWarning {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.row, self.message)
	}
}

/// Everything the engine had to say about a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupReport {
	pub warnings: Vec<MarkupWarning>,
}

impl MarkupReport {
	pub fn is_clean(&self) -> bool {
		self.warnings.is_empty()
	}

	fn warn(&mut self, row: &str, message: impl Into<String>) {
		let warning = MarkupWarning {
			row: row.to_string(),
			message: message.into(),
		};
		tracing::warn!("{warning}");
		self.warnings.push(warning);
	}
}

/// Read-only view of the row whose cell is being resolved.
pub struct MarkupContext<'a> {
	pub table: &'a Table,
	pub key: &'a str,
	pub row: &'a Row,
	pub type_column: Option<usize>,
	pub reference_names: Option<&'a HashMap<String, String>>,
}

impl MarkupContext<'_> {
	/// Lowercased value of the row's type column.
	pub fn data_type(&self) -> String {
		self.type_column
			.and_then(|column| self.row.value(column))
			.unwrap_or_default()
			.to_lowercase()
	}

	/// Resolve the first candidate that matches a row, scoped to this row.
	fn find_row(&self, candidates: &[String]) -> Option<(&str, &Row)> {
		candidates
			.iter()
			.find_map(|candidate| self.table.closest_match(candidate, Some(self.key)))
			.and_then(|index| self.table.get_index(index))
	}
}

/// Outcome of resolving a single directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
	Text(String),
	/// Leave the bracketed fallback and record the message.
	Unresolved(String),
}

/// Resolves one family of directives.
pub trait MarkupProcessor: Send + Sync {
	/// Directive names handled by this processor.
	fn directives(&self) -> &[&'static str];

	fn resolve(&self, directive: &Directive<'_>, context: &MarkupContext<'_>) -> MtabResult<Resolution>;
}

/// The link target name of a row key.
pub fn anchor_name(key: &str) -> String {
	key.replace(DELIMITER, "_")
}

fn link(key: &str, suffix: &str, text: &str) -> String {
	format!("<a href=\"#{}{suffix}\">{text}</a>", anchor_name(key))
}

fn target(key: &str, suffix: &str, text: &str) -> String {
	format!("<a name=\"{}{suffix}\">{text}</a>", anchor_name(key))
}

/// The display value of "null" for a data type.
pub fn null_value(data_type: &str) -> Option<&'static str> {
	let data_type = data_type.to_lowercase();

	let value = if data_type.starts_with("list") {
		"&lt;Empty&gt;"
	} else if data_type.contains("datetime") {
		UNKNOWN_TIME
	} else if data_type.contains("boolean") {
		"false"
	} else if data_type.contains("int") || data_type.contains("long") {
		"0"
	} else if data_type.contains("string") || data_type.contains("hexbinary") {
		"&lt;Empty&gt;"
	} else if data_type.contains("base64") || data_type.contains("object") || data_type.contains("datatype") {
		"null"
	} else {
		return None;
	};

	Some(value)
}

struct BoolProcessor;

impl MarkupProcessor for BoolProcessor {
	fn directives(&self) -> &[&'static str] {
		&["true", "false"]
	}

	fn resolve(&self, directive: &Directive<'_>, _context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		Ok(Resolution::Text(format!("<b>{}</b>", directive.name)))
	}
}

struct BibrefProcessor;

impl MarkupProcessor for BibrefProcessor {
	fn directives(&self) -> &[&'static str] {
		&["bibref"]
	}

	fn resolve(&self, directive: &Directive<'_>, context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		let Some(names) = context.reference_names else {
			return Err(MtabError::MissingCollaboratorData("bibliography".to_string()));
		};

		let Some(code) = directive.args.first() else {
			return Ok(Resolution::Unresolved("bibref without a reference code".to_string()));
		};

		let name = names.get(*code).or_else(|| {
			names
				.iter()
				.find(|(key, _)| key.eq_ignore_ascii_case(code))
				.map(|(_, name)| name)
		});

		let Some(name) = name else {
			return Ok(Resolution::Unresolved(format!("unknown bibliography reference {code}")));
		};

		let mut text = format!("<a href=\"#{code}\">{name}</a>");
		if let Some(section) = directive.args.get(1) {
			text.push_str(&format!(" ({section})"));
		}

		Ok(Resolution::Text(text))
	}
}

struct MiscProcessor;

impl MarkupProcessor for MiscProcessor {
	fn directives(&self) -> &[&'static str] {
		&["empty", "null"]
	}

	fn resolve(&self, directive: &Directive<'_>, context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		let data_type = context.data_type();

		if directive.name == "empty" {
			let text = if data_type.contains("string") {
				"<b>an empty string</b>"
			} else {
				"<b>&lt;Empty&gt;</b>"
			};
			return Ok(Resolution::Text(text.to_string()));
		}

		Ok(match null_value(&data_type) {
			Some(value) => Resolution::Text(format!("<b>{value}</b>")),
			None => Resolution::Unresolved(format!("no null value for type `{data_type}`")),
		})
	}
}

struct EnumProcessor;

impl MarkupProcessor for EnumProcessor {
	fn directives(&self) -> &[&'static str] {
		&["enum", "noenum"]
	}

	fn resolve(&self, directive: &Directive<'_>, context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		if directive.name == "noenum" {
			return Ok(Resolution::Text(String::new()));
		}

		match directive.args.as_slice() {
			[] => {
				let values: Vec<String> = context
					.row
					.enumerations()
					.map(|enumeration| {
						format!(
							"\n\t{}",
							target(context.key, &format!("_e:{}", enumeration.value), &enumeration.value)
						)
					})
					.collect();

				if values.is_empty() {
					return Ok(Resolution::Unresolved("no enumerations declared".to_string()));
				}

				Ok(Resolution::Text(format!("<pre>{}</pre>", values.concat())))
			}
			[value] => {
				if context.row.enumerations().any(|e| e.value == *value) {
					Ok(Resolution::Text(link(context.key, &format!("_e:{value}"), value)))
				} else {
					Ok(Resolution::Unresolved(format!("{value} is not an enumeration of this row")))
				}
			}
			[value, other, ..] => {
				let Some((other_key, other_row)) = context.find_row(&[(*other).to_string()]) else {
					return Ok(Resolution::Unresolved(format!(
						"not able to find {other} for the row {}",
						context.key
					)));
				};

				if other_row.enumerations().any(|e| e.value == *value) {
					Ok(Resolution::Text(link(other_key, &format!("_e:{value}"), value)))
				} else {
					Ok(Resolution::Unresolved(format!("{value} is not an enumeration of {other_key}")))
				}
			}
		}
	}
}

struct HiddenProcessor;

impl MarkupProcessor for HiddenProcessor {
	fn directives(&self) -> &[&'static str] {
		&["hidden", "nohidden"]
	}

	fn resolve(&self, directive: &Directive<'_>, context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		if directive.name == "nohidden" {
			return Ok(Resolution::Text(String::new()));
		}

		let value = null_value(&context.data_type()).unwrap_or("null");
		Ok(Resolution::Text(format!(
			"When read, this parameter returns <b>{value}</b>, regardless of the actual value."
		)))
	}
}

struct KeyProcessor;

impl MarkupProcessor for KeyProcessor {
	fn directives(&self) -> &[&'static str] {
		&["keys", "nokeys"]
	}

	fn resolve(&self, _directive: &Directive<'_>, _context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		Ok(Resolution::Text(String::new()))
	}
}

struct ListProcessor;

impl MarkupProcessor for ListProcessor {
	fn directives(&self) -> &[&'static str] {
		&["list", "nolist"]
	}

	fn resolve(&self, directive: &Directive<'_>, _context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		if directive.name == "nolist" {
			return Ok(Resolution::Text(String::new()));
		}

		Ok(Resolution::Text(match directive.args.first() {
			Some(detail) => format!("A list of this type of item, {detail}."),
			None => "A list of this type of item.".to_string(),
		}))
	}
}

/// `{{param}}` and `{{object}}` cross links.
struct PathProcessor;

impl MarkupProcessor for PathProcessor {
	fn directives(&self) -> &[&'static str] {
		&["param", "object"]
	}

	fn resolve(&self, directive: &Directive<'_>, context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		let Some(name) = directive.args.first().filter(|name| !name.is_empty()) else {
			let path = Path::from(context.key).without_array_markers();
			return Ok(Resolution::Text(link(context.key, "", path.last_part())));
		};

		let name = name.trim_end_matches(DELIMITER);
		let candidates = if directive.name == "object" {
			vec![
				format!("{name}{DELIMITER}{ARRAY_MARKER}{DELIMITER}"),
				format!("{name}{DELIMITER}"),
				name.to_string(),
			]
		} else {
			vec![name.to_string(), format!("{name}{DELIMITER}")]
		};

		Ok(match context.find_row(&candidates) {
			Some((key, _)) => Resolution::Text(link(key, "", directive.args[0])),
			None => {
				Resolution::Unresolved(format!(
					"not able to find {} for the row {}",
					directive.args[0], context.key
				))
			}
		})
	}
}

struct PatternProcessor;

impl MarkupProcessor for PatternProcessor {
	fn directives(&self) -> &[&'static str] {
		&["pattern", "nopattern"]
	}

	fn resolve(&self, directive: &Directive<'_>, context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		if directive.name == "nopattern" {
			return Ok(Resolution::Text(String::new()));
		}

		match directive.args.as_slice() {
			[] => {
				let patterns: Vec<String> = context
					.row
					.patterns()
					.map(|pattern| target(context.key, &format!("_p:{pattern}"), pattern))
					.collect();

				if patterns.is_empty() {
					return Ok(Resolution::Unresolved("no patterns declared".to_string()));
				}

				Ok(Resolution::Text(format!(
					"\nPossible patterns:<pre>\t{}.</pre>",
					patterns.join(", ")
				)))
			}
			[pattern] => {
				if context.row.patterns().any(|declared| declared == *pattern) {
					Ok(Resolution::Text(link(context.key, &format!("_p:{pattern}"), pattern)))
				} else {
					Ok(Resolution::Unresolved(format!("pattern {pattern} is not declared")))
				}
			}
			[pattern, other, ..] => {
				let candidates = [
					(*other).to_string(),
					format!("{other}{DELIMITER}"),
					format!("{other}{DELIMITER}{ARRAY_MARKER}{DELIMITER}"),
				];

				match context.find_row(&candidates) {
					Some((other_key, other_row)) if other_row.patterns().any(|declared| declared == *pattern) => {
						Ok(Resolution::Text(link(other_key, &format!("_p:{pattern}"), pattern)))
					}
					_ => {
						Ok(Resolution::Unresolved(format!(
							"pattern {pattern} is not declared by {other}"
						)))
					}
				}
			}
		}
	}
}

struct ReferenceProcessor;

impl MarkupProcessor for ReferenceProcessor {
	fn directives(&self) -> &[&'static str] {
		&["reference", "noreference"]
	}

	fn resolve(&self, directive: &Directive<'_>, context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		if directive.name == "noreference" {
			return Ok(Resolution::Text(String::new()));
		}

		Ok(Resolution::Text(match directive.args.first() {
			Some(detail) => format!("{} ({detail})", context.key),
			None => context.key.to_string(),
		}))
	}
}

struct SectionProcessor;

impl MarkupProcessor for SectionProcessor {
	fn directives(&self) -> &[&'static str] {
		&["section"]
	}

	fn resolve(&self, directive: &Directive<'_>, _context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		Ok(Resolution::Text(match directive.args.first() {
			Some(title) => format!("<br><b>{title}</b><br>"),
			None => "<br>".to_string(),
		}))
	}
}

struct UnitsProcessor;

impl MarkupProcessor for UnitsProcessor {
	fn directives(&self) -> &[&'static str] {
		&["units"]
	}

	fn resolve(&self, _directive: &Directive<'_>, context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		Ok(match context.row.attribute("units") {
			Some(units) => Resolution::Text(format!("<i>{units}</i>")),
			None => Resolution::Unresolved("no units declared".to_string()),
		})
	}
}

struct DataTypeProcessor;

impl MarkupProcessor for DataTypeProcessor {
	fn directives(&self) -> &[&'static str] {
		&["datatype"]
	}

	fn resolve(&self, directive: &Directive<'_>, context: &MarkupContext<'_>) -> MtabResult<Resolution> {
		if directive.args.first() == Some(&"expand") || directive.args.is_empty() {
			let data_type = context.data_type();
			if data_type.is_empty() {
				return Ok(Resolution::Unresolved("row has no data type".to_string()));
			}
			return Ok(Resolution::Text(format!("<i>{data_type}</i>")));
		}

		Ok(Resolution::Text(format!("<i>{}</i>", directive.args[0])))
	}
}

/// Resolves `{{directive|arg}}` markup in every cell of a finished table.
pub struct MarkupEngine {
	processors: Vec<Box<dyn MarkupProcessor>>,
	anchor_column: Option<usize>,
	type_column: Option<usize>,
}

impl Default for MarkupEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl MarkupEngine {
	/// The standard processor sequence. Column 0 is anchored and column 1
	/// holds data types.
	pub fn new() -> Self {
		Self {
			processors: vec![
				Box::new(BoolProcessor),
				Box::new(BibrefProcessor),
				Box::new(MiscProcessor),
				Box::new(EnumProcessor),
				Box::new(HiddenProcessor),
				Box::new(KeyProcessor),
				Box::new(ListProcessor),
				Box::new(PathProcessor),
				Box::new(PatternProcessor),
				Box::new(ReferenceProcessor),
				Box::new(SectionProcessor),
				Box::new(UnitsProcessor),
				Box::new(DataTypeProcessor),
			],
			anchor_column: Some(0),
			type_column: Some(1),
		}
	}

	#[must_use]
	pub fn with_anchor_column(mut self, anchor_column: Option<usize>) -> Self {
		self.anchor_column = anchor_column;
		self
	}

	#[must_use]
	pub fn with_type_column(mut self, type_column: Option<usize>) -> Self {
		self.type_column = type_column;
		self
	}

	/// Resolve every directive in `table`.
	///
	/// Only a `{{bibref}}` without `reference_names` is an error. Everything
	/// else that cannot be resolved becomes a warning.
	pub fn run(
		&self,
		table: &mut Table,
		reference_names: Option<&HashMap<String, String>>,
	) -> MtabResult<MarkupReport> {
		let mut report = MarkupReport::default();

		self.collect(table, &mut report);

		for processor in &self.processors {
			self.substitute(table, reference_names, &mut report, |name| {
				processor.directives().contains(&name)
			}, |directive, context| processor.resolve(directive, context))?;
		}

		self.substitute(
			table,
			reference_names,
			&mut report,
			|_| true,
			|directive, _| Ok(Resolution::Text(directive.raw_fallback())),
		)?;

		Ok(report)
	}

	/// First pass: anchor rows, validate directive names and declare every
	/// one-argument pattern on its row.
	fn collect(&self, table: &mut Table, report: &mut MarkupReport) {
		for index in 0..table.len() {
			let Some((key, row)) = table.get_index_mut(index) else {
				continue;
			};

			if key == HEADER_ROW_KEY {
				continue;
			}

			let key = key.to_string();
			let mut declared: Vec<String> = Vec::new();
			let mut skip_patterns = false;

			for cell in row.cells() {
				let value = cell.value();

				if value.matches("{{").count() > value.matches("}}").count() {
					report.warn(&key, format!("unterminated markup in `{value}`"));
				}

				for directive in find_directives(value) {
					if !KNOWN_DIRECTIVES.contains(&directive.name) {
						report.warn(&key, format!("unknown markup: {}", directive.name));
					}

					match (directive.name, directive.args.as_slice()) {
						("nopattern", _) => skip_patterns = true,
						("pattern", [pattern]) => declared.push((*pattern).to_string()),
						_ => {}
					}
				}
			}

			if !skip_patterns {
				for pattern in &declared {
					row.declare_pattern(pattern);
				}
			}

			if let Some(column) = self.anchor_column {
				if let Some(value) = row.value(column).map(str::to_string) {
					row.silent_set(column, format!("<a name=\"{}\">{value}</a>", anchor_name(&key)));
				}
			}
		}
	}

	fn substitute<M, R>(
		&self,
		table: &mut Table,
		reference_names: Option<&HashMap<String, String>>,
		report: &mut MarkupReport,
		accepts: M,
		resolve: R,
	) -> MtabResult<()>
	where
		M: Fn(&str) -> bool,
		R: Fn(&Directive<'_>, &MarkupContext<'_>) -> MtabResult<Resolution>,
	{
		for index in 0..table.len() {
			let Some((key, row)) = table.get_index(index) else {
				continue;
			};

			if key == HEADER_ROW_KEY {
				continue;
			}

			let mut updates: Vec<(usize, String)> = Vec::new();

			{
				let context = MarkupContext {
					table: &*table,
					key,
					row,
					type_column: self.type_column,
					reference_names,
				};

				for (column, cell) in row.cells().iter().enumerate() {
					let text = cell.value();
					let directives: Vec<Directive<'_>> = find_directives(text)
						.into_iter()
						.filter(|directive| accepts(directive.name))
						.collect();

					if directives.is_empty() {
						continue;
					}

					let mut output = String::with_capacity(text.len());
					let mut last = 0;

					for directive in &directives {
						output.push_str(&text[last..directive.range.start]);

						match resolve(directive, &context)? {
							Resolution::Text(resolved) => output.push_str(&resolved),
							Resolution::Unresolved(message) => {
								report.warn(key, message);
								output.push_str(&directive.fallback());
							}
						}

						last = directive.range.end;
					}

					output.push_str(&text[last..]);
					updates.push((column, output));
				}
			}

			if let Some((_, row)) = table.get_index_mut(index) {
				for (column, value) in updates {
					row.silent_set(column, value);
				}
			}
		}

		Ok(())
	}
}

/// Map bibliography codes to display names, stripping link targets from the
/// name cells.
pub fn reference_names(biblio: &Table) -> HashMap<String, String> {
	biblio
		.iter()
		.filter(|(key, _)| *key != HEADER_ROW_KEY)
		.filter_map(|(key, row)| {
			let name = row.value(0)?;
			let name = match name.find("</a>") {
				Some(end) if name.starts_with("<a name=") => &name[end + 4..],
				_ => name,
			};
			Some((key.to_string(), name.to_string()))
		})
		.collect()
}
