use assert_cmd::Command;
use textconst_core::AnyEmptyResult;
use textconst_core::TextConstConfig;

#[test]
fn can_init() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let mut cmd = Command::cargo_bin("textconst")?;
	let assert = cmd
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();
	assert
		.stdout(predicates::str::contains("Created"))
		.stdout(predicates::str::contains("textconst generate"));

	let config_path = tmp.path().join("textconst.toml");
	assert!(config_path.exists());

	// The sample must be a loadable config.
	let config = TextConstConfig::load(tmp.path())?;
	let declarations = config.map(|config| config.declarations()).unwrap_or_default();
	assert_eq!(declarations.len(), 1);
	assert_eq!(declarations[0].id.type_name, "Texts");
	assert_eq!(declarations[0].path, "/texts");

	Ok(())
}

#[test]
fn init_does_not_overwrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config_path = tmp.path().join(".textconst.toml");
	std::fs::write(&config_path, "existing config")?;

	let mut cmd = Command::cargo_bin("textconst")?;
	let assert = cmd
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();
	assert.stdout(predicates::str::contains("already exists"));

	let config_content = std::fs::read_to_string(&config_path)?;
	assert_eq!(config_content, "existing config");
	assert!(!tmp.path().join("textconst.toml").exists());

	Ok(())
}
