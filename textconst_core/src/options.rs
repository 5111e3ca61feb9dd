use std::collections::BTreeMap;
use std::collections::HashMap;
use std::hash::BuildHasher;

use serde::Deserialize;
use serde::Serialize;

pub const DESIGN_TIME_BUILD_KEY: &str = "build_property.DesignTimeBuild";
pub const PROJECT_DIR_KEY: &str = "build_property.ProjectDir";
pub const ROOT_NAMESPACE_KEY: &str = "build_property.RootNamespace";

/// Read-only key/value lookup supplied by the host build.
pub trait ConfigStore {
	fn get(&self, key: &str) -> Option<&str>;
}

impl<S: BuildHasher> ConfigStore for HashMap<String, String, S> {
	fn get(&self, key: &str) -> Option<&str> {
		HashMap::get(self, key).map(String::as_str)
	}
}

impl ConfigStore for BTreeMap<String, String> {
	fn get(&self, key: &str) -> Option<&str> {
		BTreeMap::get(self, key).map(String::as_str)
	}
}

/// The raw values of the keys the generator reads, captured once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigSnapshot {
	pub design_time_build: Option<String>,
	pub project_dir: Option<String>,
	pub root_namespace: Option<String>,
}

impl ConfigSnapshot {
	pub fn capture(store: &impl ConfigStore) -> Self {
		Self {
			design_time_build: store.get(DESIGN_TIME_BUILD_KEY).map(str::to_string),
			project_dir: store.get(PROJECT_DIR_KEY).map(str::to_string),
			root_namespace: store.get(ROOT_NAMESPACE_KEY).map(str::to_string),
		}
	}
}

/// Per-run generator configuration. Missing keys default to `false` and the
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratorOptions {
	pub design_time_build: bool,
	pub project_dir: String,
	pub root_namespace: String,
}

impl GeneratorOptions {
	pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Self {
		Self {
			design_time_build: snapshot
				.design_time_build
				.as_deref()
				.is_some_and(|value| value.eq_ignore_ascii_case("true")),
			project_dir: snapshot.project_dir.clone().unwrap_or_default(),
			root_namespace: snapshot.root_namespace.clone().unwrap_or_default(),
		}
	}

	pub fn from_store(store: &impl ConfigStore) -> Self {
		Self::from_snapshot(&ConfigSnapshot::capture(store))
	}
}
