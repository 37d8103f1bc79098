use std::fmt::Write;

use crate::HEADER_ROW_KEY;
use crate::ModelTable;
use crate::Row;
use crate::Table;

const HEADER_COLOR: &str = "silver";
const MAJOR_COLOR: &str = "khaki";
const FRESH_COLOR: &str = "palegreen";
const CHANGED_COLOR: &str = "red";

/// Sentences are broken once a line grows past this many characters.
pub const LOOKS_WIDTH: usize = 60;

/// Presentation switches shared by the renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
	/// Highlight fresh rows and changed cells.
	pub diff: bool,
	/// Wrap long cells at sentence boundaries.
	pub looks: bool,
	pub major_item: String,
	pub type_column: Option<usize>,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self {
			diff: true,
			looks: false,
			major_item: "object".to_string(),
			type_column: Some(1),
		}
	}
}

impl RenderOptions {
	fn is_major(&self, row: &Row) -> bool {
		self.type_column
			.and_then(|column| row.value(column))
			.is_some_and(|value| value.eq_ignore_ascii_case(&self.major_item))
	}
}

/// Break `text` with `<br>` after a sentence once the current line is longer
/// than `width`.
pub fn wrap_sentences(text: &str, width: usize) -> String {
	let mut wrapped = String::with_capacity(text.len());
	let mut line_length = 0;

	for word in text.split(' ') {
		if line_length > 0 {
			wrapped.push(' ');
			line_length += 1;
		}

		wrapped.push_str(word);
		line_length += word.chars().count();

		if line_length > width && word.ends_with('.') {
			wrapped.push_str("<br>");
			line_length = 0;
		}
	}

	wrapped.replace("<br> ", "<br>")
}

fn html_rows(output: &mut String, table: &Table, options: &RenderOptions) {
	output.push_str("<table border=\"1\" cellpadding=\"2\" cellspacing=\"0\">\n");

	for (key, row) in table.iter() {
		let is_header = key == HEADER_ROW_KEY;
		let background = if is_header {
			Some(HEADER_COLOR)
		} else if options.diff && row.all_cells_fresh() {
			Some(FRESH_COLOR)
		} else if options.is_major(row) {
			Some(MAJOR_COLOR)
		} else {
			None
		};

		match background {
			Some(color) => {
				let _ = writeln!(output, "<tr style=\"background-color: {color}\">");
			}
			None => output.push_str("<tr>\n"),
		}

		let element = if is_header { "th" } else { "td" };

		for cell in row.cells() {
			let value = if options.looks {
				wrap_sentences(cell.value(), LOOKS_WIDTH)
			} else {
				cell.value().to_string()
			};

			if options.diff && cell.is_changed() {
				let _ = writeln!(
					output,
					"\t<{element} style=\"color: {CHANGED_COLOR}\">{value}</{element}>"
				);
			} else {
				let _ = writeln!(output, "\t<{element}>{value}</{element}>");
			}
		}

		output.push_str("</tr>\n");
	}

	output.push_str("</table>\n");
}

/// Render a report as a standalone HTML page. Profiles and the bibliography
/// follow the main table when present.
pub fn render_html(table: &ModelTable, options: &RenderOptions) -> String {
	let mut output = String::new();
	let title = table.version();

	let _ = writeln!(output, "<!DOCTYPE html>");
	let _ = writeln!(
		output,
		"<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>"
	);
	let _ = writeln!(output, "<h1>{title}</h1>");

	html_rows(&mut output, table, options);

	if !table.profiles().is_empty() {
		output.push_str("<h2>Profiles</h2>\n");
		html_rows(&mut output, table.profiles(), options);
	}

	if let Some(biblio) = table.biblio() {
		let plain = RenderOptions {
			diff: false,
			..options.clone()
		};
		output.push_str("<h2>References</h2>\n");
		html_rows(&mut output, biblio, &plain);
	}

	output.push_str("</body>\n</html>\n");
	output
}

/// Render rows as tab separated text.
///
/// Fresh rows start with `+` in diff mode and changed cells start with `*`.
pub fn render_text(table: &Table, options: &RenderOptions) -> String {
	let mut output = String::new();

	for (key, row) in table.iter() {
		let marker = if options.diff && key != HEADER_ROW_KEY && row.all_cells_fresh() {
			"+"
		} else {
			" "
		};

		let cells: Vec<String> = row
			.cells()
			.iter()
			.map(|cell| {
				if options.diff && cell.is_changed() {
					format!("*{}", cell.value())
				} else {
					cell.value().to_string()
				}
			})
			.collect();

		let _ = writeln!(output, "{marker} {key}\t{}", cells.join("\t"));
	}

	output
}
