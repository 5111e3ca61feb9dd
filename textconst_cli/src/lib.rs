use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Generate documented string constants from text files.",
	long_about = "textconst turns the text files of a project into generated source constants. \
	              Each declaration in textconst.toml names a directory and an extension; every \
	              matching file becomes a string constant whose documentation previews its first \
	              lines.\n\nQuick start:\n  textconst init      Create a sample config\n  \
	              textconst generate  Write every artifact\n  textconst check     Verify \
	              artifacts are up to date\n  textconst list      Show declarations and their \
	              constants"
)]
pub struct TextConstCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output and debug logging.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize textconst in a project by creating a sample config file.
	///
	/// Creates `textconst.toml` in the project root with one example
	/// declaration. If a config file already exists, this command is a no-op
	/// and exits successfully.
	Init,
	/// Run the generator and write every changed artifact.
	///
	/// Discovers assets, runs the incremental pipeline (reusing the cache in
	/// `.textconst/cache` when present) and writes artifacts to the configured
	/// output directory. Files whose content is already current are left
	/// untouched.
	Generate {
		/// Print the artifacts that would be written without touching the
		/// output directory or the cache.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// Check that every artifact on disk is up to date.
	///
	/// Exits with a non-zero status code if any artifact is missing or stale.
	/// Ideal for CI pipelines.
	Check {
		/// Show a line diff for each stale artifact.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Output format for check results. Use `text` for human-readable
		/// output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// List every declaration with its search path and constants.
	List,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption. Each stale entry includes
	/// the artifact path and whether it exists.
	Json,
}
