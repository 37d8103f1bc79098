use std::fmt::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use mtab_cli::Commands;
use mtab_cli::MtabCli;
use mtab_cli::OutputFormat;
use mtab_core::AnyEmptyResult;
use mtab_core::AnyResult;
use mtab_core::DirResolver;
use mtab_core::Document;
use mtab_core::FileResolver;
use mtab_core::Item;
use mtab_core::MarkupWarning;
use mtab_core::MtabConfig;
use mtab_core::RenderOptions;
use mtab_core::build_report;
use mtab_core::render_html;
use mtab_core::render_text;
use mtab_core::table_model;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = MtabCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Report {
			file,
			model,
			output,
			warnings,
			format,
			no_diff,
			profiles,
			looks,
		}) => {
			run_report(
				&args,
				&ReportArgs {
					file,
					model,
					output: output.as_deref(),
					warnings: warnings.as_deref(),
					format: *format,
					no_diff: *no_diff,
					profiles: *profiles,
					looks: *looks,
				},
			)
		}
		Some(Commands::Tags { file }) => run_tags(&args, file),
		Some(Commands::Rows { file, model }) => run_rows(&args, file, model),
		None => {
			eprintln!("No subcommand specified. Run `mtab --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<mtab_core::MtabError>() {
			Ok(mtab_err) => {
				let report: miette::Report = (*mtab_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr at `warn`, or `debug` when verbose. `RUST_LOG` overrides
/// both.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.try_init()
		.ok();
}

fn resolve_root(args: &MtabCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_config(root: &Path) -> AnyResult<MtabConfig> {
	Ok(MtabConfig::load(root)?.unwrap_or_default())
}

#[allow(clippy::struct_excessive_bools)]
struct ReportArgs<'a> {
	file: &'a str,
	model: &'a str,
	output: Option<&'a Path>,
	warnings: Option<&'a Path>,
	format: OutputFormat,
	no_diff: bool,
	profiles: bool,
	looks: bool,
}

fn run_report(args: &MtabCli, report_args: &ReportArgs<'_>) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let resolver = DirResolver::new(&root);
	let parser = config.table_parser();

	let mut options = config.report_options();
	if report_args.no_diff {
		options.diff = false;
	}
	if report_args.profiles {
		options.profiles = true;
	}

	let report = build_report(
		&resolver,
		report_args.file,
		report_args.model,
		&options,
		&parser,
	)?;

	let render_options = RenderOptions {
		diff: options.diff,
		looks: report_args.looks,
		major_item: options.major_item.clone(),
		type_column: parser.columns().type_column(),
	};

	let rendered = match report_args.format {
		OutputFormat::Html => render_html(&report.table, &render_options),
		OutputFormat::Text => {
			let mut text = render_text(&report.table, &render_options);
			if !report.table.profiles().is_empty() {
				text.push('\n');
				text.push_str(&render_text(report.table.profiles(), &render_options));
			}
			text
		}
		OutputFormat::Json => {
			let mut json = serde_json::to_string_pretty(&report)?;
			json.push('\n');
			json
		}
	};

	write_warnings(&report.warnings, report_args.warnings)?;

	match report_args.output {
		Some(path) => {
			std::fs::write(path, rendered)?;
			println!(
				"{} {} ({} rows, {} warning(s))",
				colored!("Wrote", green),
				path.display(),
				report.table.len(),
				report.warnings.len()
			);
		}
		None => print!("{rendered}"),
	}

	Ok(())
}

fn write_warnings(warnings: &[MarkupWarning], path: Option<&Path>) -> AnyEmptyResult {
	match path {
		Some(path) => {
			let mut content = String::new();
			for warning in warnings {
				let _ = writeln!(content, "{warning}");
			}
			std::fs::write(path, content)?;
		}
		None => {
			for warning in warnings {
				eprintln!("{} {warning}", colored!("warning:", yellow));
			}
		}
	}

	Ok(())
}

fn run_tags(args: &MtabCli, file: &str) -> AnyEmptyResult {
	let resolver = DirResolver::new(resolve_root(args));
	let doc = Document::parse(&resolver.resolve(file)?)?;

	for item in doc.iter() {
		match item {
			Item::Tag(tag) => println!("{tag}"),
			Item::Text(text) => {
				let text = text.trim();
				if !text.is_empty() {
					println!("  {text}");
				}
			}
		}
	}

	Ok(())
}

fn run_rows(args: &MtabCli, file: &str, model: &str) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let resolver = DirResolver::new(&root);
	let parser = config.table_parser();
	let options = config.report_options();

	let doc = Document::parse(&resolver.resolve(file)?)?
		.with_version(model)
		.with_source_path(file);
	let table = table_model(&parser, &doc, model, &options)?;
	let type_column = parser.columns().type_column();

	println!("{}", colored!(model, bold));

	for (key, row) in table.iter() {
		match type_column.and_then(|column| row.value(column)) {
			Some(kind) => println!("  {key}\t{kind}"),
			None => println!("  {key}"),
		}
	}

	Ok(())
}
