use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Tabulate data model documents and annotate what changed between versions.",
	long_about = "mtab (model tables) reads tag-delimited data model documents, follows their \
	              import chain back to the first version of a model and folds every release \
	              into one table.\n\nRows and cells that are new in the latest version are \
	              highlighted, and markup such as {{param|Name}} is resolved into \
	              links.\n\nQuick start:\n  mtab report tr-181-2-1.xml --model Device:2.1  \
	              Build an HTML report\n  mtab rows tr-181-2-1.xml --model Device:2.1    \
	              List the rows of one version\n  mtab tags tr-181-2-1.xml                       \
	              Dump the tag stream"
)]
pub struct MtabCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Directory holding the model documents and `mtab.toml`.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Build the full report for a model.
	///
	/// Resolves every version the model is based on through the import
	/// declarations of `FILE`, folds them oldest to newest and substitutes
	/// markup. Markup warnings are written to `--warnings` or to stderr.
	Report {
		/// The document declaring the model.
		file: String,

		/// Model name including its version, e.g. `Device:2.1`.
		#[arg(long, short)]
		model: String,

		/// Write the report here instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Write markup warnings here instead of stderr.
		#[arg(long)]
		warnings: Option<PathBuf>,

		/// Output format for the report.
		#[arg(long, value_enum, default_value_t = OutputFormat::Html)]
		format: OutputFormat,

		/// Table only the newest version without change annotations.
		#[arg(long, default_value_t = false)]
		no_diff: bool,

		/// Keep profile rows in their own table.
		#[arg(long, default_value_t = false)]
		profiles: bool,

		/// Wrap long cells at sentence boundaries.
		#[arg(long, default_value_t = false)]
		looks: bool,
	},
	/// Print the tag and text stream of a document, one item per line.
	Tags {
		/// The document to read.
		file: String,
	},
	/// List the row keys of a single model version without diffing.
	Rows {
		/// The document declaring the model.
		file: String,

		/// Model name including its version.
		#[arg(long, short)]
		model: String,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// A standalone HTML page.
	Html,
	/// Tab separated rows. Fresh rows start with `+` and changed cells with
	/// `*`.
	Text,
	/// The report serialized as JSON.
	Json,
}
