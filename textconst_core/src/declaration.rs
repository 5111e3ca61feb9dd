use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Extension used when a declaration does not name one.
pub const DEFAULT_EXTENSION: &str = ".txt";

/// Suffix appended to a declaration's identity to name its artifact.
pub const ARTIFACT_SUFFIX: &str = "TextConstants.g.cs";

/// Where a declaration marker was found: the declaring file and the type
/// that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclarationId {
	pub file_path: String,
	pub namespace: String,
	pub type_name: String,
}

impl DeclarationId {
	pub fn new(
		file_path: impl Into<String>,
		namespace: impl Into<String>,
		type_name: impl Into<String>,
	) -> Self {
		Self {
			file_path: file_path.into(),
			namespace: namespace.into(),
			type_name: type_name.into(),
		}
	}

	/// Namespace-qualified type name.
	pub fn qualified_name(&self) -> String {
		if self.namespace.is_empty() {
			self.type_name.clone()
		} else {
			format!("{}.{}", self.namespace, self.type_name)
		}
	}

	/// Name of the artifact emitted for this declaration.
	pub fn artifact_name(&self) -> String {
		format!("{}.{ARTIFACT_SUFFIX}", self.qualified_name())
	}
}

impl fmt::Display for DeclarationId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({})", self.qualified_name(), self.file_path)
	}
}

/// Value of a named declaration option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum ArgumentValue {
	Bool(bool),
	String(String),
}

/// The raw arguments of a declaration marker as supplied by discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationArgs {
	/// Positional arguments: extension filter, then search path. Missing or
	/// `None` entries fall back to their defaults.
	#[serde(default)]
	pub positional: Vec<Option<String>>,
	/// Named options, applied in order after the positional arguments.
	#[serde(default)]
	pub named: Vec<(String, ArgumentValue)>,
}

/// One captured declaration marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Declaration {
	pub id: DeclarationId,
	/// Extension filter, possibly [`WILDCARD_EXTENSION`](crate::WILDCARD_EXTENSION).
	pub extension: String,
	/// Search path, anchored at the project directory when it starts with a
	/// separator and relative to the declaring file otherwise.
	pub path: String,
	pub diagnostic_trace_log: bool,
	/// Accessibility keyword of the enclosing type.
	pub accessibility: String,
}

impl Declaration {
	/// Capture a declaration from its marker arguments.
	///
	/// The extension defaults to [`DEFAULT_EXTENSION`] and the search path to
	/// the enclosing type name. Named `Extension`, `Path` and
	/// `DiagnosticTraceLog` options override them; values of the wrong kind
	/// are ignored.
	pub fn from_args(id: DeclarationId, args: &DeclarationArgs) -> Self {
		let positional = |index: usize| args.positional.get(index).cloned().flatten();
		let mut extension = positional(0).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
		let mut path = positional(1).unwrap_or_else(|| id.type_name.clone());
		let mut diagnostic_trace_log = false;

		for (name, value) in &args.named {
			match (name.as_str(), value) {
				("DiagnosticTraceLog", ArgumentValue::Bool(enabled)) => {
					diagnostic_trace_log = *enabled;
				}
				("Extension", ArgumentValue::String(value)) => extension.clone_from(value),
				("Path", ArgumentValue::String(value)) => path.clone_from(value),
				_ => {}
			}
		}

		Self {
			id,
			extension,
			path,
			diagnostic_trace_log,
			accessibility: "public".to_string(),
		}
	}

	#[must_use]
	pub fn with_accessibility(mut self, accessibility: impl Into<String>) -> Self {
		self.accessibility = accessibility.into();
		self
	}
}
