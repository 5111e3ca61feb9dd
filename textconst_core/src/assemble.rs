use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::DeclarationId;
use crate::GenerationInput;
use crate::TextConstError;
use crate::TextConstResult;
use crate::cache::Fingerprint;
use crate::glob::file_name;
use crate::naming::constant_name;

/// Template used when the project does not supply its own.
pub const DEFAULT_ARTIFACT_TEMPLATE: &str = concat!(
	"// <auto-generated/>\n",
	"// Source: {{ search_path }} ({{ extension }})\n",
	"#nullable enable\n",
	"{% if namespace %}\nnamespace {{ namespace }};\n{% endif %}\n",
	"{{ accessibility }} partial class {{ type_name }}\n",
	"{\n",
	"{% for constant in constants %}{% if not loop.first %}\n{% endif %}",
	"{% if constant.has_doc %}\t/// <summary>\n",
	"{% for line in constant.doc_lines %}\t/// {{ line }}\n{% endfor %}",
	"\t/// </summary>\n{% endif %}",
	"\tpublic const string {{ constant.name }} = @\"{{ constant.body }}\";\n",
	"{% endfor %}}\n",
);

/// One generated source artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
	pub id: DeclarationId,
	pub name: String,
	pub text: String,
}

/// A `minijinja` template that renders a [`GenerationInput`] into artifact
/// text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactTemplate {
	source: String,
}

impl Default for ArtifactTemplate {
	fn default() -> Self {
		Self::new(DEFAULT_ARTIFACT_TEMPLATE)
	}
}

#[derive(Serialize)]
struct ConstantContext<'a> {
	name: String,
	path: &'a str,
	file_name: &'a str,
	has_doc: bool,
	doc_lines: &'a [String],
	body: &'a str,
}

#[derive(Serialize)]
struct TemplateContext<'a> {
	artifact_name: &'a str,
	namespace: &'a str,
	type_name: &'a str,
	accessibility: &'a str,
	search_path: &'a str,
	extension: &'a str,
	design_time_build: bool,
	constants: Vec<ConstantContext<'a>>,
}

impl ArtifactTemplate {
	pub fn new(source: impl Into<String>) -> Self {
		Self {
			source: source.into(),
		}
	}

	/// Read a template from disk.
	pub fn load(path: &Path) -> TextConstResult<Self> {
		let source = std::fs::read_to_string(path).map_err(|e| {
			TextConstError::TemplateLoad {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})?;

		Ok(Self::new(source))
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn fingerprint(&self) -> Fingerprint {
		Fingerprint::of(&self.source)
	}

	/// Assemble the artifact for one declaration. A declaration without
	/// matched assets still renders a complete, empty class.
	pub fn assemble(&self, input: &GenerationInput) -> TextConstResult<Artifact> {
		let declaration = &input.declaration;
		let artifact_name = declaration.id.artifact_name();
		let namespace = if declaration.id.namespace.is_empty() {
			input.options.root_namespace.as_str()
		} else {
			declaration.id.namespace.as_str()
		};

		let constants = input
			.assets
			.iter()
			.map(|asset| {
				ConstantContext {
					name: constant_name(&asset.path, &declaration.id.type_name),
					path: &asset.path,
					file_name: file_name(&asset.path),
					has_doc: asset.doc_lines.is_some(),
					doc_lines: asset.doc_lines.as_deref().unwrap_or_default(),
					body: &asset.constant_body,
				}
			})
			.collect();

		let context = TemplateContext {
			artifact_name: &artifact_name,
			namespace,
			type_name: &declaration.id.type_name,
			accessibility: &declaration.accessibility,
			search_path: &input.search_path,
			extension: &declaration.extension,
			design_time_build: input.options.design_time_build,
			constants,
		};

		let text = self.render(&artifact_name, &context)?;
		Ok(Artifact {
			id: declaration.id.clone(),
			name: artifact_name,
			text,
		})
	}

	fn render(&self, artifact_name: &str, context: &TemplateContext<'_>) -> TextConstResult<String> {
		let render_error = |e: minijinja::Error| {
			TextConstError::TemplateRender {
				artifact: artifact_name.to_string(),
				reason: e.to_string(),
			}
		};

		let mut env = minijinja::Environment::new();
		env.set_keep_trailing_newline(true);
		env.set_auto_escape_callback(|_| minijinja::AutoEscape::None);
		env.add_template("artifact", &self.source)
			.map_err(render_error)?;

		let template = env.get_template("artifact").map_err(render_error)?;
		template
			.render(minijinja::Value::from_serialize(context))
			.map_err(render_error)
	}
}
