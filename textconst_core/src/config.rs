use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::ArgumentValue;
use crate::ArtifactTemplate;
use crate::Declaration;
use crate::DeclarationArgs;
use crate::DeclarationId;
use crate::PROJECT_DIR_KEY;
use crate::TextConstError;
use crate::TextConstResult;

/// Default maximum asset size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default directory, relative to the project root, receiving artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "generated";

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"textconst.toml",
	".textconst.toml",
	".config/textconst.toml",
];

/// Configuration loaded from a `textconst.toml` file.
///
/// ```toml
/// output = "generated"
/// template = "templates/constants.cs.j2"
///
/// [properties]
/// "build_property.RootNamespace" = "MyApp"
///
/// [assets]
/// include = ["content/**"]
/// exclude = ["drafts/"]
///
/// [[declarations]]
/// file = "src/Texts.cs"
/// type = "Texts"
/// namespace = "MyApp.Resources"
/// args = [".md", "/content"]
///
/// [declarations.named]
/// DiagnosticTraceLog = true
/// ```
#[derive(Debug, Deserialize)]
pub struct TextConstConfig {
	/// Directory receiving artifacts, relative to the project root.
	#[serde(default = "default_output")]
	pub output: PathBuf,
	/// Optional `minijinja` template replacing the default artifact layout.
	#[serde(default)]
	pub template: Option<PathBuf>,
	/// Assets larger than this are treated as unreadable. Defaults to 10 MB.
	#[serde(default = "default_max_file_size")]
	pub max_file_size: u64,
	/// When true, `.gitignore` files are not used to filter assets.
	#[serde(default)]
	pub disable_gitignore: bool,
	/// Build properties handed to the generator as its configuration store.
	#[serde(default)]
	pub properties: BTreeMap<String, String>,
	#[serde(default)]
	pub assets: AssetsConfig,
	#[serde(default)]
	pub declarations: Vec<DeclarationConfig>,
}

impl Default for TextConstConfig {
	fn default() -> Self {
		Self {
			output: default_output(),
			template: None,
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			disable_gitignore: false,
			properties: BTreeMap::new(),
			assets: AssetsConfig::default(),
			declarations: Vec::new(),
		}
	}
}

fn default_output() -> PathBuf {
	PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

/// Which files under the project root are considered assets.
#[derive(Debug, Default, Deserialize)]
pub struct AssetsConfig {
	/// Glob patterns an asset path must match. Every file is a candidate
	/// when empty.
	#[serde(default)]
	pub include: Vec<String>,
	/// Gitignore-style patterns for files and directories to skip. Supports
	/// negation (`!pattern`) and directory markers (trailing `/`).
	#[serde(default)]
	pub exclude: Vec<String>,
}

/// One declaration marker.
#[derive(Debug, Clone, Deserialize)]
pub struct DeclarationConfig {
	/// Declaring file, relative to the project root.
	pub file: String,
	/// Name of the enclosing type.
	#[serde(rename = "type")]
	pub type_name: String,
	#[serde(default)]
	pub namespace: String,
	#[serde(default)]
	pub accessibility: Option<String>,
	/// Positional arguments: extension filter, then search path.
	#[serde(default)]
	pub args: Vec<String>,
	#[serde(default)]
	pub named: BTreeMap<String, ArgumentValue>,
}

impl DeclarationConfig {
	pub fn to_declaration(&self) -> Declaration {
		let id = DeclarationId::new(&self.file, &self.namespace, &self.type_name);
		let args = DeclarationArgs {
			positional: self.args.iter().cloned().map(Some).collect(),
			named: self
				.named
				.iter()
				.map(|(name, value)| (name.clone(), value.clone()))
				.collect(),
		};

		let declaration = Declaration::from_args(id, &args);
		match &self.accessibility {
			Some(accessibility) => declaration.with_accessibility(accessibility),
			None => declaration,
		}
	}
}

impl TextConstConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> TextConstResult<Option<TextConstConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;
		tracing::debug!(
			path = %config_path.display(),
			declarations = config.declarations.len(),
			"loaded config"
		);

		Ok(Some(config))
	}

	pub fn parse(content: &str) -> TextConstResult<TextConstConfig> {
		toml::from_str(content).map_err(|e| TextConstError::ConfigParse(e.to_string()))
	}

	pub fn declarations(&self) -> Vec<Declaration> {
		self.declarations
			.iter()
			.map(DeclarationConfig::to_declaration)
			.collect()
	}

	/// The configuration store for a run. Asset and declaration paths are
	/// relative to the project root, so `build_property.ProjectDir` defaults
	/// to `.`.
	pub fn properties(&self) -> BTreeMap<String, String> {
		let mut properties = self.properties.clone();
		properties
			.entry(PROJECT_DIR_KEY.to_string())
			.or_insert_with(|| ".".to_string());
		properties
	}

	pub fn output_dir(&self, root: &Path) -> PathBuf {
		root.join(&self.output)
	}

	/// The configured artifact template, or the default one.
	pub fn template(&self, root: &Path) -> TextConstResult<ArtifactTemplate> {
		match &self.template {
			Some(path) => ArtifactTemplate::load(&root.join(path)),
			None => Ok(ArtifactTemplate::default()),
		}
	}
}
