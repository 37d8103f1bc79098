use indexmap::IndexMap;

use crate::Document;
use crate::MtabError;
use crate::MtabResult;
use crate::Tag;

/// The `<import>` declarations of one model document.
///
/// ```xml
/// <import file="tr-181-2-0.xml">
///   <model name="Device:2.0"/>
/// </import>
/// <import file="tr-069-biblio.xml"/>
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Imports {
	/// Imported model name to the file declaring it.
	models: IndexMap<String, String>,
	bibliography: Option<String>,
}

impl Imports {
	pub fn from_document(doc: &Document) -> Self {
		let mut imports = Self::default();
		let mut current_file: Option<String> = None;

		for tag in doc.tags() {
			if tag.is_type("import") {
				if tag.is_closer() {
					current_file = None;
					continue;
				}

				let Some(file) = tag.attribute("file") else {
					continue;
				};

				if file.contains("biblio") && imports.bibliography.is_none() {
					imports.bibliography = Some(file.to_string());
				}

				if !tag.is_self_closing() {
					current_file = Some(file.to_string());
				}

				continue;
			}

			let Some(file) = &current_file else {
				continue;
			};

			if tag.is_type("model") && !tag.is_closer() {
				if let Some(name) = tag.attribute("name") {
					imports.models.insert(name.to_string(), file.clone());
				}
			}
		}

		tracing::debug!(
			models = imports.models.len(),
			bibliography = imports.bibliography.as_deref().unwrap_or("none"),
			"read imports"
		);

		imports
	}

	/// The file an imported model is declared in.
	pub fn file_of(&self, model: &str) -> Option<&str> {
		self.models.get(model).map(String::as_str)
	}

	pub fn models(&self) -> impl Iterator<Item = (&str, &str)> {
		self.models
			.iter()
			.map(|(model, file)| (model.as_str(), file.as_str()))
	}

	pub fn bibliography(&self) -> Option<&str> {
		self.bibliography.as_deref()
	}

	/// The `(model, file)` pair `model` is based on, if it has a base.
	///
	/// A base model that was never imported is looked up in the document's
	/// own file.
	pub fn dependency(&self, doc: &Document, model: &str) -> MtabResult<Option<(String, String)>> {
		let definition = find_model(doc, model)?;

		let Some(base) = definition.attribute("base").filter(|base| !base.is_empty()) else {
			return Ok(None);
		};

		let file = self
			.file_of(base)
			.unwrap_or(doc.source_path())
			.to_string();

		Ok(Some((base.to_string(), file)))
	}
}

/// The `<model name="...">` tag defining `model`, skipping import
/// declarations.
pub fn find_model<'a>(doc: &'a Document, model: &str) -> MtabResult<&'a Tag> {
	let mut inside_import = false;

	for tag in doc.tags() {
		if tag.is_type("import") {
			inside_import = !tag.is_closer() && !tag.is_self_closing();
			continue;
		}

		if !inside_import && tag.is_type("model") && !tag.is_closer() && tag.attribute("name") == Some(model) {
			return Ok(tag);
		}
	}

	Err(MtabError::ModelNotFound(model.to_string()))
}
