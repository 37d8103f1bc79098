mod common;

use clap::Parser;
use mtab_cli::Commands;
use mtab_cli::MtabCli;
use mtab_cli::OutputFormat;
use mtab_core::AnyEmptyResult;
use rstest::rstest;
use similar_asserts::assert_eq;

#[test]
fn tags_prints_the_item_stream() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_models(tmp.path())?;

	common::mtab_cmd()
		.arg("tags")
		.arg(common::MODEL_V1_FILE)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("<model name=\"Device:1.0\">"))
		.stdout(predicates::str::contains("<boolean/>"))
		.stdout(predicates::str::contains("  A foo entry."))
		.stdout(predicates::str::contains("</model>"));

	Ok(())
}

#[test]
fn rows_lists_keys_of_one_version() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_models(tmp.path())?;

	common::mtab_cmd()
		.arg("rows")
		.arg(common::MODEL_V1_FILE)
		.args(["--model", "Device:1.0"])
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::starts_with("Device:1.0\n"))
		.stdout(predicates::str::contains("  Device.Foo.{i}.\tobject"))
		.stdout(predicates::str::contains("  Device.Foo.{i}.Name\tstring(64)"));

	Ok(())
}

#[test]
fn rows_resolves_files_by_stem() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("model-1-0-2.xml"), common::MODEL_V1)?;

	common::mtab_cmd()
		.arg("rows")
		.arg("model-1-0.xml")
		.args(["--model", "Device:1.0"])
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Device.Foo.{i}.Enable"));

	Ok(())
}

#[test]
fn missing_subcommand_exits_with_usage_hint() {
	common::mtab_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("mtab --help"));
}

#[rstest]
#[case::defaults(&["mtab", "report", "a.xml", "--model", "Device:2.0"], OutputFormat::Html, false)]
#[case::text(&["mtab", "report", "a.xml", "-m", "Device:2.0", "--format", "text"], OutputFormat::Text, false)]
#[case::json_without_diff(
	&["mtab", "report", "a.xml", "--model", "Device:2.0", "--format", "json", "--no-diff"],
	OutputFormat::Json,
	true
)]
fn parse_report_arguments(
	#[case] argv: &[&str],
	#[case] expected_format: OutputFormat,
	#[case] expected_no_diff: bool,
) {
	let cli = MtabCli::parse_from(argv);

	match cli.command {
		Some(Commands::Report {
			file,
			model,
			format,
			no_diff,
			..
		}) => {
			assert_eq!(file, "a.xml");
			assert_eq!(model, "Device:2.0");
			assert_eq!(format, expected_format);
			assert_eq!(no_diff, expected_no_diff);
		}
		_ => panic!("expected the report command"),
	}
}

#[test]
fn global_flags_follow_the_command() {
	let cli = MtabCli::parse_from(["mtab", "tags", "a.xml", "--no-color", "--verbose"]);

	assert!(cli.no_color);
	assert!(cli.verbose);
	assert!(matches!(cli.command, Some(Commands::Tags { .. })));
}
