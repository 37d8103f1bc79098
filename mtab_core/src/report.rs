use std::cmp::Ordering;
use std::collections::HashSet;
use std::collections::VecDeque;

use serde::Deserialize;
use serde::Serialize;

use crate::ContainerSpec;
use crate::Differ;
use crate::Document;
use crate::HEADER_ROW_KEY;
use crate::Imports;
use crate::MarkupEngine;
use crate::MarkupWarning;
use crate::ModelTable;
use crate::MtabError;
use crate::MtabResult;
use crate::Table;
use crate::TableParser;
use crate::markup::reference_names;
use crate::parser::STANDARD_LABELS;
use crate::path::abbreviate_version;
use crate::resolver::FileResolver;

/// Switches for [`build_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
	/// Fold every historical version instead of tabling only the newest.
	pub diff: bool,
	/// Keep the extracted profile rows.
	pub profiles: bool,
	pub major_item: String,
	pub labels: Vec<String>,
	/// Column whose cells become link targets. `None` disables anchoring.
	pub anchor_column: Option<usize>,
}

impl Default for ReportOptions {
	fn default() -> Self {
		Self {
			diff: true,
			profiles: true,
			major_item: "object".to_string(),
			labels: STANDARD_LABELS.iter().map(ToString::to_string).collect(),
			anchor_column: Some(0),
		}
	}
}

/// A finished, diffed and substituted model table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
	pub table: ModelTable,
	pub warnings: Vec<MarkupWarning>,
}

/// Compare two abbreviated versions numerically, segment by segment.
/// Segments that are not numbers compare as text.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
	let mut left_parts = left.split('.');
	let mut right_parts = right.split('.');

	loop {
		match (left_parts.next(), right_parts.next()) {
			(None, None) => return Ordering::Equal,
			(None, Some(_)) => return Ordering::Less,
			(Some(_), None) => return Ordering::Greater,
			(Some(left), Some(right)) => {
				let ordering = match (left.parse::<u64>(), right.parse::<u64>()) {
					(Ok(left), Ok(right)) => left.cmp(&right),
					_ => left.cmp(right),
				};

				if ordering != Ordering::Equal {
					return ordering;
				}
			}
		}
	}
}

/// Table one model version out of `doc`, splicing in its components. The
/// rows keep the flags the parser gave them.
pub fn table_model(
	parser: &TableParser,
	doc: &Document,
	model: &str,
	options: &ReportOptions,
) -> MtabResult<ModelTable> {
	let spec = ContainerSpec::model(model)
		.with_major_item(options.major_item.clone())
		.with_labels(options.labels.clone());
	let parsed = parser.parse_container(doc, &spec, None)?;
	let mut table = parsed.table;

	for component in &parsed.components {
		table.insert_component(component)?;
	}

	tracing::debug!(model, rows = table.len(), "made table");
	Ok(table)
}

/// Merge bibliographies so the first table holding a key wins.
fn merge_bibliographies(bibliographies: Vec<Table>) -> Option<Table> {
	let mut bibliographies = bibliographies.into_iter();
	let mut merged = bibliographies.next()?;

	for bibliography in bibliographies {
		for (key, row) in &bibliography {
			if !merged.contains_key(key) {
				merged.insert(key.clone(), row.clone());
			}
		}
	}

	Some(merged)
}

/// Build the report for `model`, declared in `root_file`.
///
/// Every version the model is based on is resolved through its import
/// declarations, tabled, then folded oldest to newest.
pub fn build_report(
	resolver: &dyn FileResolver,
	root_file: &str,
	model: &str,
	options: &ReportOptions,
	parser: &TableParser,
) -> MtabResult<Report> {
	let mut queue: VecDeque<(String, String)> = VecDeque::from([(model.to_string(), root_file.to_string())]);
	let mut seen: HashSet<String> = HashSet::from([model.to_string()]);
	let mut tables: Vec<ModelTable> = Vec::new();
	let mut bibliographies: Vec<Table> = Vec::new();

	while let Some((model, file)) = queue.pop_front() {
		tracing::debug!(model = %model, file = %file, "adding input");

		let text = resolver.resolve(&file)?;
		let doc = Document::parse(&text)?
			.with_version(model.clone())
			.with_source_path(file.clone());
		let imports = Imports::from_document(&doc);

		if let Some(biblio_file) = imports.bibliography() {
			match resolver.resolve(biblio_file) {
				Ok(text) => {
					let biblio_doc = Document::parse(&text)?.with_version(biblio_file);
					bibliographies.push(TableParser::parse_bibliography(&biblio_doc)?);
				}
				Err(MtabError::FileNotFound(name)) => {
					tracing::warn!(file = %name, "bibliography not found, skipping");
				}
				Err(error) => return Err(error),
			}
		}

		if let Some((base, base_file)) = imports.dependency(&doc, &model)? {
			if seen.insert(base.clone()) {
				queue.push_back((base, base_file));
			}
		}

		tables.push(table_model(parser, &doc, &model, options)?);
	}

	tables.sort_by(|left, right| {
		compare_versions(abbreviate_version(left.version()), abbreviate_version(right.version()))
	});

	let mut table = if options.diff {
		Differ::for_columns(parser.columns(), options.major_item.clone()).fold(tables)?
	} else {
		tables.pop().map(|mut newest| {
			newest.make_stale();
			newest
		})
	}
	.ok_or_else(|| MtabError::ModelNotFound(model.to_string()))?;

	table.reorder_by_previous_links();

	let mut header = parser.columns().header_row();
	header.make_stale();
	table.insert_at(0, HEADER_ROW_KEY, header.clone());

	table.set_biblio(merge_bibliographies(bibliographies));

	if let Some(type_column) = parser.columns().type_column() {
		let moved = table.extract_profiles(type_column);
		if options.profiles && moved > 0 {
			table.profiles_mut().insert_at(0, HEADER_ROW_KEY, header);
		} else {
			*table.profiles_mut() = Table::new();
		}
	}

	let names = table.biblio().map(reference_names);
	let engine = MarkupEngine::new()
		.with_anchor_column(options.anchor_column)
		.with_type_column(parser.columns().type_column());

	let mut warnings = engine.run(&mut table, names.as_ref())?.warnings;
	if !table.profiles().is_empty() {
		warnings.extend(engine.run(table.profiles_mut(), names.as_ref())?.warnings);
	}

	tracing::debug!(rows = table.len(), warnings = warnings.len(), "report built");

	Ok(Report { table, warnings })
}
