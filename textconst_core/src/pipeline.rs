use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::Artifact;
use crate::ArtifactTemplate;
use crate::CancellationToken;
use crate::ConfigSnapshot;
use crate::ConfigStore;
use crate::Declaration;
use crate::DeclarationId;
use crate::GenerationInput;
use crate::GeneratorOptions;
use crate::Glob;
use crate::TextAsset;
use crate::TextConstResult;
use crate::TransformedAsset;
use crate::cache::Fingerprint;
use crate::cache::StageCache;
use crate::cache::StageReport;
use crate::cache::StageRun;
use crate::cache::StepReason;
use crate::content::transform_asset;
use crate::matching::DeclarationAndGlob;
use crate::matching::DeclarationAndOptions;
use crate::matching::MatchGroup;
use crate::matching::group_matches;
use crate::matching::matches_any;
use crate::matching::prepare_generation_input;
use crate::matching::select_declaration_glob;
use crate::matching::select_matching_declarations;
use crate::naming::constant_name;
use crate::trace::NoopTraceSink;
use crate::trace::TraceEvent;
use crate::trace::TraceSink;
use crate::trace::TrackingName;

/// Cached values of every stage from the last completed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
	options: StageCache<(), ConfigSnapshot, GeneratorOptions>,
	declarations: StageCache<DeclarationId, DeclarationAndOptions, DeclarationAndOptions>,
	declaration_globs: StageCache<DeclarationId, DeclarationAndOptions, DeclarationAndGlob>,
	glob_set: StageCache<(), Fingerprint, Vec<Glob>>,
	asset_globs: StageCache<String, String, Glob>,
	matching_assets: StageCache<String, (Glob, Fingerprint), bool>,
	transformed: StageCache<String, TextAsset, TransformedAsset>,
	matches: StageCache<String, (Glob, Fingerprint), Vec<DeclarationId>>,
	groups: StageCache<(), Fingerprint, MatchGroup>,
	inputs: StageCache<DeclarationId, Fingerprint, GenerationInput>,
	artifacts: StageCache<DeclarationId, GenerationInput, Artifact>,
}

impl PipelineState {
	/// Whether no run has completed against this state yet.
	pub fn is_empty(&self) -> bool {
		self.options.is_empty()
	}

	/// Number of artifacts held from the last completed run.
	pub fn artifact_count(&self) -> usize {
		self.artifacts.len()
	}
}

/// Step reasons of every stage for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
	pub stages: Vec<StageReport>,
}

impl RunReport {
	pub fn stage(&self, name: TrackingName) -> Option<&StageReport> {
		self.stages.iter().find(|stage| stage.name == name)
	}

	fn push(&mut self, report: StageReport) {
		self.stages.push(report);
	}
}

/// An artifact produced by a run, with the reason it has its current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunArtifact {
	pub artifact: Artifact,
	pub reason: StepReason,
	/// Constant names in emission order.
	pub constant_names: Vec<String>,
}

impl RunArtifact {
	/// Whether the artifact was taken from the cache without being
	/// reassembled.
	pub fn is_reused(&self) -> bool {
		self.reason == StepReason::Cached
	}
}

/// Everything a completed run produced. Every declaration has exactly one
/// artifact, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunOutput {
	pub artifacts: Vec<RunArtifact>,
	pub report: RunReport,
}

impl RunOutput {
	pub fn artifact(&self, id: &DeclarationId) -> Option<&Artifact> {
		self.artifacts
			.iter()
			.find(|run| &run.artifact.id == id)
			.map(|run| &run.artifact)
	}

	pub fn reused_count(&self) -> usize {
		self.artifacts.iter().filter(|run| run.is_reused()).count()
	}
}

/// Incremental generator: turns declarations, assets and configuration into
/// artifacts, recomputing only the stages whose inputs changed since the
/// previous run.
pub struct Pipeline {
	state: PipelineState,
	template: ArtifactTemplate,
	trace_sink: Arc<dyn TraceSink>,
}

impl Default for Pipeline {
	fn default() -> Self {
		Self::new(ArtifactTemplate::default())
	}
}

impl Pipeline {
	pub fn new(template: ArtifactTemplate) -> Self {
		Self {
			state: PipelineState::default(),
			template,
			trace_sink: Arc::new(NoopTraceSink),
		}
	}

	#[must_use]
	pub fn with_trace_sink(mut self, trace_sink: Arc<dyn TraceSink>) -> Self {
		self.trace_sink = trace_sink;
		self
	}

	/// Resume from a state produced by an earlier process.
	#[must_use]
	pub fn with_state(mut self, state: PipelineState) -> Self {
		self.state = state;
		self
	}

	pub fn state(&self) -> &PipelineState {
		&self.state
	}

	pub fn template(&self) -> &ArtifactTemplate {
		&self.template
	}

	/// Run every stage once.
	///
	/// On success the new stage caches replace the previous ones. When
	/// `cancellation` fires the run stops with
	/// [`TextConstError::Cancelled`](crate::TextConstError::Cancelled), the
	/// previous state is kept and nothing is traced.
	pub fn run(
		&mut self,
		declarations: &[Declaration],
		assets: &[TextAsset],
		store: &impl ConfigStore,
		cancellation: &CancellationToken,
	) -> TextConstResult<RunOutput> {
		cancellation.check()?;

		let previous = &self.state;
		let mut next = PipelineState::default();
		let mut report = RunReport::default();
		let mut events = Vec::new();

		// Options.
		let mut stage = StageRun::new(TrackingName::OptionsSelected, &previous.options);
		let options = stage.step((), ConfigSnapshot::capture(store), |snapshot| {
			Ok(GeneratorOptions::from_snapshot(snapshot))
		})?;
		next.options = finish(stage, &mut report, &mut events);

		// Declarations, each paired with the options.
		let declarations = unique_declarations(declarations);
		let mut stage = StageRun::new(
			TrackingName::DeclarationsAndOptionsCombined,
			&previous.declarations,
		);
		let mut combined = Vec::with_capacity(declarations.len());
		for declaration in &declarations {
			let input = DeclarationAndOptions {
				declaration: (*declaration).clone(),
				options: options.clone(),
			};
			combined.push(stage.step(declaration.id.clone(), input, |input| Ok(input.clone()))?);
		}
		next.declarations = finish(stage, &mut report, &mut events);

		let mut stage = StageRun::new(
			TrackingName::DeclarationGlobSelected,
			&previous.declaration_globs,
		);
		let mut declaration_globs = Vec::with_capacity(combined.len());
		for input in &combined {
			let glob = stage.step(input.declaration.id.clone(), input.clone(), |input| {
				Ok(select_declaration_glob(input))
			})?;
			declaration_globs.push(glob);
		}
		next.declaration_globs = finish(stage, &mut report, &mut events);

		// The set of distinct globs, independent of declaration order.
		let glob_set: Vec<Glob> = declaration_globs
			.iter()
			.map(|declaration| declaration.glob.clone())
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect();
		let mut stage = StageRun::new(TrackingName::DeclarationGlobsCollected, &previous.glob_set);
		let glob_set = stage.step((), Fingerprint::of(&glob_set), |_| Ok(glob_set.clone()))?;
		next.glob_set = finish(stage, &mut report, &mut events);
		let glob_set_fingerprint = Fingerprint::of(&glob_set);

		// Asset globs and the assets matching any declaration.
		let assets = unique_assets(assets);
		let mut stage = StageRun::new(TrackingName::AssetGlobSelected, &previous.asset_globs);
		let mut asset_globs = Vec::with_capacity(assets.len());
		for asset in &assets {
			cancellation.check()?;
			let glob = stage.step(asset.path.clone(), asset.path.clone(), |path| {
				Ok(Glob::for_asset_path(path))
			})?;
			asset_globs.push(glob);
		}
		next.asset_globs = finish(stage, &mut report, &mut events);

		let mut stage = StageRun::new(
			TrackingName::MatchingAssetsFiltered,
			&previous.matching_assets,
		);
		let mut matching = Vec::new();
		for (asset, glob) in assets.iter().zip(asset_globs) {
			cancellation.check()?;
			let input = (glob.clone(), glob_set_fingerprint);
			let is_match = stage.step(asset.path.clone(), input, |(glob, _)| {
				Ok(matches_any(glob, &glob_set))
			})?;
			if is_match {
				matching.push((*asset, glob));
			}
		}
		next.matching_assets = finish(stage, &mut report, &mut events);

		// Content is transformed once per matching asset, however many
		// declarations it belongs to.
		let mut stage = StageRun::new(TrackingName::AssetContentTransformed, &previous.transformed);
		let mut transformed = Vec::with_capacity(matching.len());
		for (asset, _) in &matching {
			cancellation.check()?;
			let content = stage.step(asset.path.clone(), (*asset).clone(), |asset| {
				events.push(TraceEvent::new(
					TrackingName::GeneratingDocComment,
					asset.path.len() as u64,
				));
				transform_asset(asset, cancellation)
			})?;
			transformed.push(content);
		}
		next.transformed = finish(stage, &mut report, &mut events);

		let declaration_globs_fingerprint = Fingerprint::of(&declaration_globs);
		let mut stage = StageRun::new(TrackingName::MatchesSelected, &previous.matches);
		let mut matched = Vec::with_capacity(matching.len());
		for ((asset, glob), content) in matching.iter().zip(transformed) {
			cancellation.check()?;
			let input = (glob.clone(), declaration_globs_fingerprint);
			let ids = stage.step(asset.path.clone(), input, |(glob, _)| {
				Ok(select_matching_declarations(glob, &declaration_globs))
			})?;
			matched.push((ids, content));
		}
		next.matches = finish(stage, &mut report, &mut events);

		let mut stage = StageRun::new(TrackingName::MatchesGrouped, &previous.groups);
		let groups = stage.step((), Fingerprint::of(&matched), |_| {
			let pairs = matched
				.iter()
				.flat_map(|(ids, content)| ids.iter().map(move |id| (id, content)));
			group_matches(pairs, cancellation)
		})?;
		next.groups = finish(stage, &mut report, &mut events);
		tracing::debug!(groups = groups.len(), "matches grouped");

		// Left join: every declaration gets an input, matched or not.
		let mut stage = StageRun::new(TrackingName::GenerationInputPrepared, &previous.inputs);
		let mut inputs = Vec::with_capacity(combined.len());
		for (declaration, glob) in combined.iter().zip(&declaration_globs) {
			cancellation.check()?;
			let id = &declaration.declaration.id;
			let key = Fingerprint::of(&(declaration, glob, groups.assets_for(id)));
			inputs.push(stage.step(id.clone(), key, |_| {
				Ok(prepare_generation_input(declaration, glob, &groups))
			})?);
		}
		next.inputs = finish(stage, &mut report, &mut events);

		let mut stage = StageRun::new(TrackingName::ArtifactAssembled, &previous.artifacts);
		let mut artifacts = Vec::with_capacity(inputs.len());
		for input in inputs {
			cancellation.check()?;
			let id = input.declaration.id.clone();
			let constant_names = input
				.assets
				.iter()
				.map(|asset| constant_name(&asset.path, &id.type_name))
				.collect();
			let artifact = stage.step(id, input, |input| self.template.assemble(input))?;
			let reason = stage.last_reason().unwrap_or(StepReason::New);
			artifacts.push(RunArtifact {
				artifact,
				reason,
				constant_names,
			});
		}
		next.artifacts = finish(stage, &mut report, &mut events);

		self.state = next;
		tracing::debug!(
			artifacts = artifacts.len(),
			reused = artifacts.iter().filter(|run| run.is_reused()).count(),
			"pipeline run completed"
		);

		let output = RunOutput { artifacts, report };
		self.flush_trace(&declarations, &output, &events);
		Ok(output)
	}

	/// Send the run's trace to the sink for each traced declaration whose
	/// artifact was assembled in this run.
	fn flush_trace(&self, declarations: &[&Declaration], output: &RunOutput, events: &[TraceEvent]) {
		for (declaration, run) in declarations.iter().zip(&output.artifacts) {
			if !declaration.diagnostic_trace_log || run.is_reused() {
				continue;
			}

			let written = TraceEvent::new(
				TrackingName::DiagnosticTraceLogWritten,
				run.constant_names.len() as u64,
			);
			for event in events.iter().chain(std::iter::once(&written)) {
				if let Err(e) = self.trace_sink.record(*event) {
					tracing::warn!(declaration = %declaration.id, "failed to record trace event: {e}");
					break;
				}
			}
		}
	}
}

fn finish<S, I, O>(
	stage: StageRun<'_, S, I, O>,
	report: &mut RunReport,
	events: &mut Vec<TraceEvent>,
) -> StageCache<S, I, O>
where
	S: Ord + Clone,
	I: PartialEq,
	O: PartialEq + Clone,
{
	let (cache, stage_report) = stage.finish();
	let recomputed = stage_report
		.reasons
		.iter()
		.filter(|reason| !matches!(reason, StepReason::Cached | StepReason::Removed))
		.count();
	events.push(TraceEvent::new(stage_report.name, recomputed as u64));
	report.push(stage_report);
	cache
}

/// Keep the first declaration for each identity.
fn unique_declarations(declarations: &[Declaration]) -> Vec<&Declaration> {
	let mut seen = BTreeSet::new();
	let mut unique = Vec::with_capacity(declarations.len());
	for declaration in declarations {
		if seen.insert(&declaration.id) {
			unique.push(declaration);
		} else {
			tracing::warn!(declaration = %declaration.id, "duplicate declaration ignored");
		}
	}
	unique
}

/// Keep the first asset for each path.
fn unique_assets(assets: &[TextAsset]) -> Vec<&TextAsset> {
	let mut seen = BTreeSet::new();
	let mut unique = Vec::with_capacity(assets.len());
	for asset in assets {
		if seen.insert(asset.path.as_str()) {
			unique.push(asset);
		} else {
			tracing::warn!(path = %asset.path, "duplicate asset ignored");
		}
	}
	unique
}
