use std::path::Path;
use std::path::PathBuf;

use crate::RunOutput;
use crate::TextConstResult;

/// Receives the artifacts of a completed run.
pub trait EmissionSink {
	fn emit(&mut self, name: &str, text: &str) -> TextConstResult<()>;
}

/// Hand every artifact of `output` to `sink`, in declaration order.
pub fn emit_artifacts(output: &RunOutput, sink: &mut impl EmissionSink) -> TextConstResult<()> {
	for run in &output.artifacts {
		sink.emit(&run.artifact.name, &run.artifact.text)?;
	}

	Ok(())
}

/// Writes artifacts into a directory, leaving files whose content is already
/// current untouched.
#[derive(Debug)]
pub struct DirectorySink {
	dir: PathBuf,
	written: Vec<PathBuf>,
	unchanged: usize,
}

impl DirectorySink {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
			written: Vec::new(),
			unchanged: 0,
		}
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Files written so far.
	pub fn written(&self) -> &[PathBuf] {
		&self.written
	}

	/// Number of artifacts whose file already held the same text.
	pub fn unchanged(&self) -> usize {
		self.unchanged
	}
}

impl EmissionSink for DirectorySink {
	fn emit(&mut self, name: &str, text: &str) -> TextConstResult<()> {
		let path = self.dir.join(name);
		if std::fs::read_to_string(&path).is_ok_and(|current| current == text) {
			self.unchanged += 1;
			return Ok(());
		}

		std::fs::create_dir_all(&self.dir)?;
		std::fs::write(&path, text)?;
		tracing::debug!(path = %path.display(), "wrote artifact");
		self.written.push(path);
		Ok(())
	}
}

/// Collects artifacts in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
	pub artifacts: Vec<(String, String)>,
}

impl EmissionSink for MemorySink {
	fn emit(&mut self, name: &str, text: &str) -> TextConstResult<()> {
		self.artifacts.push((name.to_string(), text.to_string()));
		Ok(())
	}
}

/// An artifact whose file in the output directory is missing or out of date.
#[derive(Debug)]
pub struct StaleArtifact {
	pub path: PathBuf,
	/// Current file content, `None` when the file does not exist.
	pub current: Option<String>,
	pub expected: String,
}

/// Result of comparing a run against an output directory.
#[derive(Debug, Default)]
pub struct CheckResult {
	pub stale: Vec<StaleArtifact>,
	pub checked: usize,
}

impl CheckResult {
	/// Returns true if every artifact on disk is current.
	pub fn is_ok(&self) -> bool {
		self.stale.is_empty()
	}
}

/// Compare every artifact of `output` with the file of the same name in
/// `dir`.
pub fn check_artifacts(output: &RunOutput, dir: &Path) -> CheckResult {
	let mut result = CheckResult::default();

	for run in &output.artifacts {
		let path = dir.join(&run.artifact.name);
		let current = std::fs::read_to_string(&path).ok();
		result.checked += 1;

		if current.as_deref() != Some(run.artifact.text.as_str()) {
			result.stale.push(StaleArtifact {
				path,
				current,
				expected: run.artifact.text.clone(),
			});
		}
	}

	result
}
