use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::MtabError;
use crate::MtabResult;

/// Looks up model documents by file name.
pub trait FileResolver {
	/// Return the raw text of `name`.
	fn resolve(&self, name: &str) -> MtabResult<String>;
}

/// Resolves names against the files of one directory.
///
/// An exact name wins. Otherwise the first entry (sorted by file name) that
/// contains the requested stem is used, so `tr-181-2-0.xml` can still find
/// `tr-181-2-0-1.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirResolver {
	root: PathBuf,
}

impl DirResolver {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// The path `name` resolves to, if any.
	pub fn locate(&self, name: &str) -> MtabResult<PathBuf> {
		let exact = self.root.join(name);
		if exact.is_file() {
			return Ok(exact);
		}

		let requested = Path::new(name);
		let stem = requested
			.file_stem()
			.and_then(|stem| stem.to_str())
			.unwrap_or(name);

		let mut entries: Vec<PathBuf> = fs::read_dir(&self.root)?
			.filter_map(Result::ok)
			.map(|entry| entry.path())
			.filter(|path| path.is_file())
			.collect();
		entries.sort();

		entries
			.into_iter()
			.find(|path| {
				path.file_name()
					.and_then(|file_name| file_name.to_str())
					.is_some_and(|file_name| file_name.contains(stem))
			})
			.inspect(|path| {
				tracing::debug!(requested = name, found = %path.display(), "resolved by stem");
			})
			.ok_or_else(|| MtabError::FileNotFound(name.to_string()))
	}
}

impl FileResolver for DirResolver {
	fn resolve(&self, name: &str) -> MtabResult<String> {
		let path = self.locate(name)?;
		tracing::debug!(path = %path.display(), "reading model document");
		Ok(fs::read_to_string(path)?)
	}
}
