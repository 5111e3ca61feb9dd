use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TextConstError {
	#[error(transparent)]
	#[diagnostic(code(textconst::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(textconst::config_parse),
		help("check that textconst.toml is valid TOML with [[declarations]] entries")
	)]
	ConfigParse(String),

	#[error("invalid asset pattern `{pattern}`: {reason}")]
	#[diagnostic(code(textconst::asset_pattern))]
	AssetPattern { pattern: String, reason: String },

	#[error("failed to load artifact template `{path}`: {reason}")]
	#[diagnostic(
		code(textconst::template_load),
		help("the `template` entry in textconst.toml is resolved relative to the project root")
	)]
	TemplateLoad { path: String, reason: String },

	#[error("artifact template rendering failed for `{artifact}`: {reason}")]
	#[diagnostic(code(textconst::template_render))]
	TemplateRender { artifact: String, reason: String },

	#[error("generation was cancelled")]
	#[diagnostic(
		code(textconst::cancelled),
		help("no artifacts were emitted for the cancelled run")
	)]
	Cancelled,

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(textconst::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },
}

impl TextConstError {
	/// Returns true when the error only signals that the run was cancelled.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}

pub type TextConstResult<T> = Result<T, TextConstError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
