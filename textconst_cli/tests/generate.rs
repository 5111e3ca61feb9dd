mod common;

use predicates::prelude::PredicateBooleanExt;
use textconst_core::AnyEmptyResult;

#[test]
fn generate_writes_artifacts() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;

	common::textconst_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Wrote 1 artifact(s)"))
		.stdout(predicates::str::contains("Texts.TextConstants.g.cs"));

	let artifact = std::fs::read_to_string(tmp.path().join(common::ARTIFACT))?;
	assert!(artifact.contains("namespace Demo;"));
	assert!(artifact.contains("public partial class Texts"));
	assert!(artifact.contains("\t/// Welcome, &quot;friend&quot;!\n"));
	assert!(artifact.contains("public const string Welcome = @\"Welcome, \"\"friend\"\"!\n\";"));

	// Assets are emitted in path order.
	let goodbye = artifact.find("Goodbye =");
	let welcome = artifact.find("Welcome =");
	assert!(goodbye.is_some() && goodbye < welcome);

	let cache_path = tmp
		.path()
		.join(".textconst")
		.join("cache")
		.join("pipeline-v1.json");
	assert!(
		cache_path.is_file(),
		"expected cache file at {}",
		cache_path.display()
	);

	Ok(())
}

#[test]
fn second_generate_reuses_cache() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;

	common::textconst_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::textconst_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already up to date"))
		.stdout(predicates::str::contains("1 artifact(s) reused from cache"));

	Ok(())
}

#[test]
fn generate_rewrites_after_asset_edit() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;

	common::textconst_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	std::fs::write(tmp.path().join("texts/goodbye.txt"), "See you.")?;

	common::textconst_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Wrote 1 artifact(s)"))
		.stdout(predicates::str::contains("reused from cache").not());

	let artifact = std::fs::read_to_string(tmp.path().join(common::ARTIFACT))?;
	assert!(artifact.contains("public const string Goodbye = @\"See you.\";"));

	Ok(())
}

#[test]
fn dry_run_does_not_write() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;

	common::textconst_cmd()
		.arg("generate")
		.arg("--dry-run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("would write 1 artifact(s)"))
		.stdout(predicates::str::contains(common::ARTIFACT));

	assert!(!tmp.path().join(common::ARTIFACT).exists());
	assert!(!tmp.path().join(".textconst").exists());

	Ok(())
}

#[test]
fn invalid_config_reports_diagnostic() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("textconst.toml"), "[[declarations]]\nfile = 3\n")?;

	common::textconst_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("textconst::config_parse"));

	Ok(())
}

#[test]
fn missing_template_reports_diagnostic() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;
	let config = format!("template = \"missing.j2\"\n{}", common::CONFIG);
	std::fs::write(tmp.path().join("textconst.toml"), config)?;

	common::textconst_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("textconst::template_load"));

	Ok(())
}

#[test]
fn custom_template_is_used() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;
	std::fs::write(
		tmp.path().join("constants.j2"),
		"{% for constant in constants %}{{ constant.name }}\n{% endfor %}",
	)?;
	let config = format!("template = \"constants.j2\"\n{}", common::CONFIG);
	std::fs::write(tmp.path().join("textconst.toml"), config)?;

	common::textconst_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let artifact = std::fs::read_to_string(tmp.path().join(common::ARTIFACT))?;
	assert_eq!(artifact, "Goodbye\nWelcome\n");

	Ok(())
}
