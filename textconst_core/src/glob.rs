use serde::Deserialize;
use serde::Serialize;

/// Extension token that makes a declaration match every file in its
/// directory.
pub const WILDCARD_EXTENSION: &str = ".*";

/// A `(directory, extension)` pair used to pair declarations with assets.
///
/// Directories are always fully resolved and normalized with
/// [`normalize_path`] before a glob is built, so matching is plain string
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Glob {
	pub directory: String,
	pub extension: String,
}

impl Glob {
	pub fn new(directory: impl Into<String>, extension: impl Into<String>) -> Self {
		Self {
			directory: directory.into(),
			extension: extension.into(),
		}
	}

	/// Build the glob describing where an asset lives.
	pub fn for_asset_path(path: &str) -> Self {
		Self {
			directory: parent_directory(path),
			extension: file_extension(file_name(path)).to_string(),
		}
	}

	/// Whether this glob carries the wildcard extension. Only meaningful for
	/// declaration globs; asset extensions are compared literally.
	pub fn is_wildcard(&self) -> bool {
		self.extension == WILDCARD_EXTENSION
	}

	/// Does this asset glob satisfy `declaration`?
	///
	/// Directories must be identical. The extension must be identical unless
	/// the declaration uses [`WILDCARD_EXTENSION`].
	pub fn matches(&self, declaration: &Glob) -> bool {
		self.directory == declaration.directory
			&& (declaration.is_wildcard() || self.extension == declaration.extension)
	}
}

/// Resolve a declaration's search path to a normalized directory.
///
/// A leading separator anchors the path at `project_dir`; anything else is
/// relative to the directory of `declaring_file`. Malformed input resolves to
/// an empty string, which matches no asset.
pub fn resolve_search_path(path_arg: &str, declaring_file: &str, project_dir: &str) -> String {
	let (base, relative) = match path_arg.strip_prefix(['/', '\\']) {
		Some(rest) => (project_dir.to_string(), rest),
		None => (parent_directory_raw(declaring_file), path_arg),
	};

	if base.contains('\0') || relative.contains('\0') {
		return String::new();
	}

	let combined = if base.is_empty() || relative.starts_with(['/', '\\']) {
		relative.to_string()
	} else {
		format!("{base}/{relative}")
	};

	normalize_path(&combined)
}

/// Lexically normalize a path: unify separators to `/`, drop `.` segments
/// and fold `..` into its parent. The result never has a trailing separator
/// (except for the root itself). An empty relative path becomes `.`.
pub fn normalize_path(path: &str) -> String {
	let unified = path.replace('\\', "/");
	let is_absolute = unified.starts_with('/');
	let mut segments: Vec<&str> = Vec::new();

	for segment in unified.split('/') {
		match segment {
			"" | "." => {}
			".." => {
				if segments.last().is_some_and(|last| *last != "..") {
					segments.pop();
				} else if !is_absolute {
					segments.push("..");
				}
			}
			other => segments.push(other),
		}
	}

	let joined = segments.join("/");
	if is_absolute {
		format!("/{joined}")
	} else if joined.is_empty() {
		".".to_string()
	} else {
		joined
	}
}

/// The normalized directory containing `path`.
pub fn parent_directory(path: &str) -> String {
	let normalized = normalize_path(path);
	match normalized.rsplit_once('/') {
		Some(("", _)) => "/".to_string(),
		Some((directory, _)) => directory.to_string(),
		None => ".".to_string(),
	}
}

fn parent_directory_raw(path: &str) -> String {
	match path.rfind(['/', '\\']) {
		Some(0) => "/".to_string(),
		Some(index) => path[..index].to_string(),
		None => String::new(),
	}
}

/// The final segment of `path`.
pub fn file_name(path: &str) -> &str {
	path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// The extension of a file name including its leading dot.
///
/// `"notes.txt"` → `".txt"`, `"archive.tar.gz"` → `".gz"`, `".env"` →
/// `".env"`, `"README"` and `"trailing."` → `""`.
pub fn file_extension(name: &str) -> &str {
	match name.rfind('.') {
		Some(index) if index + 1 < name.len() => &name[index..],
		_ => "",
	}
}

/// The file name with its final extension removed.
pub fn file_stem(name: &str) -> &str {
	match name.rfind('.') {
		Some(index) => &name[..index],
		None => name,
	}
}
