//! `textconst_core` turns text files into generated source constants. A
//! declaration names a directory and an extension; every matching asset
//! becomes a `const string` on the declaring type, documented with a preview
//! of its first lines.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Declarations + options
//!   → Glob Matcher (resolves each declaration's search directory)
//! Assets
//!   → Glob Matcher (directory + extension of every asset)
//!   → Content Transformer (documentation preview, escaped constant body)
//!   → Matching & Grouping (pairs assets with declarations, left join)
//!   → Artifact Assembler (renders one artifact per declaration)
//! ```
//!
//! Every stage is memoized by [`Pipeline`]: a second run with equal inputs
//! reuses the cached artifacts, and a changed asset only reassembles the
//! artifacts of the declarations it belongs to.
//!
//! ## Modules
//!
//! - [`config`]: Loading `textconst.toml`: declarations, build properties,
//!   asset include/exclude patterns and the output directory.
//! - [`project`]: Asset discovery on disk.
//! - [`index_cache`]: Persisting the pipeline state between processes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use textconst_core::CancellationToken;
//! use textconst_core::DirectorySink;
//! use textconst_core::Pipeline;
//! use textconst_core::emit_artifacts;
//! use textconst_core::project::Project;
//!
//! let project = Project::load(Path::new(".")).unwrap();
//! let mut pipeline = Pipeline::new(project.template().unwrap());
//! let output = pipeline
//! 	.run(
//! 		&project.declarations,
//! 		&project.assets,
//! 		&project.config.properties(),
//! 		&CancellationToken::new(),
//! 	)
//! 	.unwrap();
//!
//! let mut sink = DirectorySink::new(project.output_dir());
//! emit_artifacts(&output, &mut sink).unwrap();
//! ```

pub use assemble::*;
pub use cache::*;
pub use cancel::*;
pub use config::*;
pub use content::*;
pub use declaration::*;
pub use emit::*;
pub use error::*;
pub use glob::*;
pub use matching::*;
pub use naming::*;
pub use options::*;
pub use pipeline::*;
pub use trace::*;

mod assemble;
mod cache;
mod cancel;
pub mod config;
mod content;
mod declaration;
mod emit;
#[allow(unused_assignments)]
mod error;
mod glob;
pub mod index_cache;
mod matching;
mod naming;
mod options;
mod pipeline;
pub mod project;
mod trace;
