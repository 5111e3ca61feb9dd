use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::ArtifactTemplate;
use crate::Declaration;
use crate::TextAsset;
use crate::TextConstError;
use crate::TextConstResult;
use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::config::TextConstConfig;

/// Controls which files become assets.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
	pub include: Vec<String>,
	pub exclude: Vec<String>,
	pub max_file_size: u64,
	pub disable_gitignore: bool,
	/// Directory whose contents are never assets, usually the artifact
	/// output directory. Relative to the root.
	pub skip_dir: Option<PathBuf>,
}

impl Default for DiscoveryOptions {
	fn default() -> Self {
		Self {
			include: Vec::new(),
			exclude: Vec::new(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			disable_gitignore: false,
			skip_dir: None,
		}
	}
}

impl DiscoveryOptions {
	pub fn from_config(config: &TextConstConfig) -> Self {
		Self {
			include: config.assets.include.clone(),
			exclude: config.assets.exclude.clone(),
			max_file_size: config.max_file_size,
			disable_gitignore: config.disable_gitignore,
			skip_dir: Some(config.output.clone()),
		}
	}
}

/// A project loaded from disk, ready to run.
#[derive(Debug)]
pub struct Project {
	pub root: PathBuf,
	pub config: TextConstConfig,
	pub declarations: Vec<Declaration>,
	pub assets: Vec<TextAsset>,
}

impl Project {
	/// Load the config at `root` (defaults when absent) and discover its
	/// assets.
	pub fn load(root: &Path) -> TextConstResult<Self> {
		let config = TextConstConfig::load(root)?.unwrap_or_default();
		let declarations = config.declarations();
		let assets = discover_assets(root, &DiscoveryOptions::from_config(&config))?;

		Ok(Self {
			root: root.to_path_buf(),
			config,
			declarations,
			assets,
		})
	}

	pub fn template(&self) -> TextConstResult<ArtifactTemplate> {
		self.config.template(&self.root)
	}

	pub fn output_dir(&self) -> PathBuf {
		self.config.output_dir(&self.root)
	}
}

/// Collect every asset under `root` in sorted path order.
///
/// Asset paths are relative to `root` with `/` separators. Files that are not
/// valid UTF-8, cannot be read, or exceed the size limit are returned as
/// unreadable assets rather than skipped.
pub fn discover_assets(root: &Path, options: &DiscoveryOptions) -> TextConstResult<Vec<TextAsset>> {
	let files = collect_files(root, options)?;
	let assets: Vec<TextAsset> = files
		.iter()
		.map(|file| read_asset(root, file, options.max_file_size))
		.collect();

	tracing::debug!(
		root = %root.display(),
		assets = assets.len(),
		unreadable = assets.iter().filter(|asset| asset.content.is_none()).count(),
		"discovered assets"
	);

	Ok(assets)
}

/// Key an asset by its path relative to the root.
pub fn relative_asset_path(root: &Path, file: &Path) -> String {
	file.strip_prefix(root)
		.unwrap_or(file)
		.to_string_lossy()
		.replace('\\', "/")
}

fn read_asset(root: &Path, file: &Path, max_file_size: u64) -> TextAsset {
	let path = relative_asset_path(root, file);

	match read_text(file, max_file_size) {
		Some(content) => TextAsset::new(path, content),
		None => {
			tracing::warn!(path = %path, "asset is unreadable, its constant will be empty");
			TextAsset::unreadable(path)
		}
	}
}

fn read_text(file: &Path, max_file_size: u64) -> Option<String> {
	let metadata = std::fs::metadata(file).ok()?;
	if metadata.len() > max_file_size {
		return None;
	}

	let mut bytes = Vec::new();
	std::fs::File::open(file)
		.ok()?
		.take(max_file_size.saturating_add(1))
		.read_to_end(&mut bytes)
		.ok()?;

	let text = String::from_utf8(bytes).ok()?;
	Some(match text.strip_prefix('\u{feff}') {
		Some(rest) => rest.to_string(),
		None => text,
	})
}

/// Build a `GlobSet` from the `[assets] include` patterns.
fn build_include_set(patterns: &[String]) -> TextConstResult<Option<GlobSet>> {
	if patterns.is_empty() {
		return Ok(None);
	}

	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = Glob::new(pattern).map_err(|e| {
			TextConstError::AssetPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
		builder.add(glob);
	}

	let set = builder.build().map_err(|e| {
		TextConstError::AssetPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})?;

	Ok(Some(set))
}

/// Build a `Gitignore` matcher from `[assets] exclude`. These follow
/// `.gitignore` syntax and are applied on top of any `.gitignore` rules.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> TextConstResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			TextConstError::AssetPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
	}
	builder.build().map_err(|e| {
		TextConstError::AssetPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// Build a `Gitignore` matcher from the project's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		if let Some(e) = builder.add(&gitignore_path) {
			tracing::warn!(path = %gitignore_path.display(), "ignoring malformed .gitignore: {e}");
		}
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

struct Walker<'a> {
	root: &'a Path,
	skip_dir: Option<PathBuf>,
	gitignore: Gitignore,
	exclude: Gitignore,
	include: Option<GlobSet>,
	/// Canonical paths of the directories currently being walked.
	ancestors: Vec<PathBuf>,
}

fn collect_files(root: &Path, options: &DiscoveryOptions) -> TextConstResult<Vec<PathBuf>> {
	let mut walker = Walker {
		root,
		skip_dir: options.skip_dir.as_ref().map(|dir| root.join(dir)),
		gitignore: if options.disable_gitignore {
			Gitignore::empty()
		} else {
			build_gitignore(root)
		},
		exclude: build_exclude_matcher(root, &options.exclude)?,
		include: build_include_set(&options.include)?,
		ancestors: Vec::new(),
	};

	let mut files = Vec::new();
	walker.walk_dir(root, &mut files)?;
	files.sort();
	Ok(files)
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

impl Walker<'_> {
	fn walk_dir(&mut self, dir: &Path, files: &mut Vec<PathBuf>) -> TextConstResult<()> {
		if !dir.is_dir() {
			return Ok(());
		}

		// A cycle only exists when a directory is its own ancestor. The same
		// directory reached through two paths is walked twice.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if self.ancestors.contains(&canonical) {
			return Err(TextConstError::SymlinkCycle {
				path: dir.display().to_string(),
			});
		}

		self.ancestors.push(canonical);
		let walked = self.walk_entries(dir, files);
		self.ancestors.pop();
		walked
	}

	fn walk_entries(&mut self, dir: &Path, files: &mut Vec<PathBuf>) -> TextConstResult<()> {
		for entry in std::fs::read_dir(dir)? {
			let path = entry?.path();
			let is_dir = path.is_dir();

			if is_dir {
				let hidden = path
					.file_name()
					.and_then(|name| name.to_str())
					.is_some_and(is_ignored_directory_name);
				if hidden || self.skip_dir.as_deref() == Some(path.as_path()) {
					continue;
				}
			}

			if self.gitignore.matched(&path, is_dir).is_ignore()
				|| self.exclude.matched(&path, is_dir).is_ignore()
			{
				continue;
			}

			if is_dir {
				self.walk_dir(&path, files)?;
			} else if self.is_included(&path) {
				files.push(path);
			}
		}

		Ok(())
	}

	fn is_included(&self, path: &Path) -> bool {
		let Some(include) = &self.include else {
			return true;
		};

		path.strip_prefix(self.root)
			.is_ok_and(|relative| include.is_match(relative))
	}
}
