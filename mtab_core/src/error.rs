use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MtabError {
	#[error(transparent)]
	#[diagnostic(code(mtab::io_error))]
	Io(#[from] std::io::Error),

	#[error("unterminated tag: no closing `>` after `{0}`")]
	#[diagnostic(
		code(mtab::unterminated_tag),
		help("every `<` in a model document must be closed by a matching `>`")
	)]
	UnterminatedTag(String),

	#[error("malformed tag `{tag}`: {reason}")]
	#[diagnostic(code(mtab::malformed_tag))]
	MalformedTag { tag: String, reason: String },

	#[error("could not find a container tag with `{attribute}=\"{value}\"`")]
	#[diagnostic(
		code(mtab::unresolved_boundary),
		help("check that the model name matches the `name` attribute of a `<model>` tag")
	)]
	UnresolvedBoundary { attribute: String, value: String },

	#[error("no handler is bound for column tag `{0}`")]
	#[diagnostic(
		code(mtab::missing_handler),
		help(
			"available handlers: name, title, date, organization, category, hyperlink, \
			 description, syntax"
		)
	)]
	MissingHandler(String),

	#[error("row width mismatch: {left} columns vs {right} columns")]
	#[diagnostic(
		code(mtab::schema_mismatch),
		help("all tables being diffed must be parsed with the same column schema")
	)]
	SchemaMismatch { left: usize, right: usize },

	#[error("unable to resolve `{0}` to a row in the table")]
	#[diagnostic(code(mtab::unresolved_reference))]
	UnresolvedReference(String),

	#[error("{0} was referenced but no data was supplied for it")]
	#[diagnostic(
		code(mtab::missing_collaborator_data),
		help("import a bibliography file so `{{{{bibref}}}}` directives can be resolved")
	)]
	MissingCollaboratorData(String),

	#[error("file not found: `{0}`")]
	#[diagnostic(code(mtab::file_not_found))]
	FileNotFound(String),

	#[error("model `{0}` not found in document")]
	#[diagnostic(
		code(mtab::model_not_found),
		help("the model name must match a `<model name=\"...\">` tag exactly")
	)]
	ModelNotFound(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mtab::config_parse),
		help("check that mtab.toml is valid TOML with optional [[columns]] and [[substitutes]] tables")
	)]
	ConfigParse(String),
}

pub type MtabResult<T> = Result<T, MtabError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
