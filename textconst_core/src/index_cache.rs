use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

use crate::ArtifactTemplate;
use crate::PipelineState;
use crate::RunOutput;

pub const CACHE_SCHEMA_VERSION: u32 = 1;
const CACHE_FILE_NAME: &str = "pipeline-v1.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LastRunTelemetry {
	pub timestamp_unix_ms: u64,
	pub reused_artifacts: u64,
	pub assembled_artifacts: u64,
	pub total_artifacts: u64,
}

/// Running totals kept alongside the cached state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CacheTelemetry {
	pub run_count: u64,
	pub fully_reused_run_count: u64,
	pub reused_artifact_count_total: u64,
	pub assembled_artifact_count_total: u64,
	pub last_run: Option<LastRunTelemetry>,
}

impl CacheTelemetry {
	pub fn record_run(&mut self, output: &RunOutput) {
		let total = output.artifacts.len();
		let reused = output.reused_count();
		let reused_artifacts = u64::try_from(reused).unwrap_or(u64::MAX);
		let assembled_artifacts = u64::try_from(total - reused).unwrap_or(u64::MAX);
		let total_artifacts = u64::try_from(total).unwrap_or(u64::MAX);

		self.run_count = self.run_count.saturating_add(1);
		if reused == total {
			self.fully_reused_run_count = self.fully_reused_run_count.saturating_add(1);
		}
		self.reused_artifact_count_total = self
			.reused_artifact_count_total
			.saturating_add(reused_artifacts);
		self.assembled_artifact_count_total = self
			.assembled_artifact_count_total
			.saturating_add(assembled_artifacts);
		self.last_run = Some(LastRunTelemetry {
			timestamp_unix_ms: now_unix_ms(),
			reused_artifacts,
			assembled_artifacts,
			total_artifacts,
		});
	}
}

/// Pipeline state persisted between runs of the command line tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCache {
	pub schema_version: u32,
	pub cache_key: String,
	#[serde(default)]
	pub telemetry: CacheTelemetry,
	pub state: PipelineState,
}

impl PipelineCache {
	pub fn new(cache_key: String, state: PipelineState) -> Self {
		Self {
			schema_version: CACHE_SCHEMA_VERSION,
			cache_key,
			telemetry: CacheTelemetry::default(),
			state,
		}
	}
}

/// Key that invalidates the cache whenever the crate or the artifact
/// template changes.
pub fn cache_key(template: &ArtifactTemplate) -> String {
	format!(
		"{}:{:016x}",
		env!("CARGO_PKG_VERSION"),
		template.fingerprint().0
	)
}

fn now_unix_ms() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map_or(0, |duration| {
			duration.as_millis().try_into().unwrap_or(u64::MAX)
		})
}

pub fn cache_path(root: &Path) -> PathBuf {
	root.join(".textconst").join("cache").join(CACHE_FILE_NAME)
}

/// Load the cache for `root`. A missing, unreadable or mismatched file
/// yields `None`.
pub fn load(root: &Path, cache_key: &str) -> Option<PipelineCache> {
	let cache_path = cache_path(root);
	let bytes = std::fs::read(&cache_path).ok()?;
	let Ok(cache) = serde_json::from_slice::<PipelineCache>(&bytes) else {
		tracing::debug!(path = %cache_path.display(), "discarding unreadable pipeline cache");
		return None;
	};

	if cache.schema_version != CACHE_SCHEMA_VERSION {
		return None;
	}

	if cache.cache_key != cache_key {
		tracing::debug!("pipeline cache key changed, starting cold");
		return None;
	}

	Some(cache)
}

/// Write the cache through a temporary file so readers never observe a
/// partial payload. Failures are logged and otherwise ignored.
pub fn save(root: &Path, cache: &PipelineCache) {
	let cache_path = cache_path(root);
	let Some(cache_dir) = cache_path.parent() else {
		return;
	};

	if let Err(e) = std::fs::create_dir_all(cache_dir) {
		tracing::warn!(path = %cache_dir.display(), "failed to create cache directory: {e}");
		return;
	}

	let Ok(payload) = serde_json::to_vec(cache) else {
		return;
	};

	let temp_path = cache_path.with_extension(format!(
		"json.tmp-{}-{}",
		std::process::id(),
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_or(0, |duration| duration.as_nanos())
	));

	if std::fs::write(&temp_path, payload).is_err() {
		return;
	}

	if std::fs::rename(&temp_path, &cache_path).is_err() {
		let _ = std::fs::remove_file(temp_path);
	}
}
