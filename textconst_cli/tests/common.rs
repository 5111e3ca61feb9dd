use std::path::Path;

use assert_cmd::Command;

pub const CONFIG: &str = r#"
[properties]
"build_property.RootNamespace" = "Demo"

[[declarations]]
file = "src/Texts.cs"
type = "Texts"
args = [".txt", "/texts"]
"#;

pub const ARTIFACT: &str = "generated/Texts.TextConstants.g.cs";

pub fn textconst_cmd() -> Command {
	let mut cmd = Command::cargo_bin("textconst").unwrap_or_else(|e| panic!("binary: {e}"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("TEXTCONST_LOG");
	cmd
}

/// A project with one declaration over `texts/*.txt` and two assets.
pub fn write_project(root: &Path) -> std::io::Result<()> {
	std::fs::write(root.join("textconst.toml"), CONFIG)?;
	std::fs::create_dir_all(root.join("texts"))?;
	std::fs::write(root.join("texts/welcome.txt"), "Welcome, \"friend\"!\n")?;
	std::fs::write(root.join("texts/goodbye.txt"), "Goodbye.")?;
	Ok(())
}
