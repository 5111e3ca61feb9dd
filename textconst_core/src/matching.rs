use std::collections::BTreeMap;

use derive_more::Deref;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::CancellationToken;
use crate::Declaration;
use crate::DeclarationId;
use crate::GeneratorOptions;
use crate::Glob;
use crate::TextConstResult;
use crate::TransformedAsset;
use crate::glob::resolve_search_path;

/// A declaration paired with the options of the run it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclarationAndOptions {
	pub declaration: Declaration,
	pub options: GeneratorOptions,
}

/// A declaration identity with its resolved search glob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclarationAndGlob {
	pub id: DeclarationId,
	pub glob: Glob,
}

/// Resolve the glob a declaration searches.
pub fn select_declaration_glob(input: &DeclarationAndOptions) -> DeclarationAndGlob {
	let declaration = &input.declaration;
	let directory = resolve_search_path(
		&declaration.path,
		&declaration.id.file_path,
		&input.options.project_dir,
	);

	DeclarationAndGlob {
		id: declaration.id.clone(),
		glob: Glob::new(directory, declaration.extension.clone()),
	}
}

/// Whether an asset glob matches at least one declaration glob.
pub fn matches_any(asset: &Glob, declaration_globs: &[Glob]) -> bool {
	declaration_globs
		.iter()
		.any(|declaration| asset.matches(declaration))
}

/// Identities of every declaration the asset belongs to, in declaration
/// order.
pub fn select_matching_declarations(
	asset: &Glob,
	declarations: &[DeclarationAndGlob],
) -> Vec<DeclarationId> {
	declarations
		.iter()
		.filter(|declaration| asset.matches(&declaration.glob))
		.map(|declaration| declaration.id.clone())
		.collect()
}

/// Matched assets grouped by declaration. Within a group, assets keep the
/// order in which they were discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct MatchGroup(BTreeMap<DeclarationId, Vec<TransformedAsset>>);

// Stored as a sequence of pairs since JSON object keys must be strings.
impl Serialize for MatchGroup {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_seq(self.iter())
	}
}

impl<'de> Deserialize<'de> for MatchGroup {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let pairs = Vec::<(DeclarationId, Vec<TransformedAsset>)>::deserialize(deserializer)?;
		Ok(Self(pairs.into_iter().collect()))
	}
}

impl MatchGroup {
	/// Assets matched to `id`; empty when the declaration matched nothing.
	pub fn assets_for(&self, id: &DeclarationId) -> &[TransformedAsset] {
		self.get(id).map_or(&[], Vec::as_slice)
	}
}

/// Group `(declaration, asset)` pairs by declaration, preserving the order of
/// first appearance within each group.
pub fn group_matches<'a>(
	pairs: impl IntoIterator<Item = (&'a DeclarationId, &'a TransformedAsset)>,
	cancellation: &CancellationToken,
) -> TextConstResult<MatchGroup> {
	let mut grouped: BTreeMap<DeclarationId, Vec<TransformedAsset>> = BTreeMap::new();

	for (id, asset) in pairs {
		cancellation.check()?;
		grouped.entry(id.clone()).or_default().push(asset.clone());
	}

	Ok(MatchGroup(grouped))
}

/// Everything needed to assemble one declaration's artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationInput {
	pub declaration: Declaration,
	pub options: GeneratorOptions,
	/// Resolved search directory.
	pub search_path: String,
	pub assets: Vec<TransformedAsset>,
}

/// Left join a declaration against the match groups: declarations without a
/// group get an empty asset list.
pub fn prepare_generation_input(
	declaration: &DeclarationAndOptions,
	glob: &DeclarationAndGlob,
	groups: &MatchGroup,
) -> GenerationInput {
	GenerationInput {
		declaration: declaration.declaration.clone(),
		options: declaration.options.clone(),
		search_path: glob.glob.directory.clone(),
		assets: groups.assets_for(&declaration.declaration.id).to_vec(),
	}
}
