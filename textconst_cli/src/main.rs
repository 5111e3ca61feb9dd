use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use textconst_cli::Commands;
use textconst_cli::OutputFormat;
use textconst_cli::TextConstCli;
use textconst_core::CancellationToken;
use textconst_core::DirectorySink;
use textconst_core::Pipeline;
use textconst_core::RunOutput;
use textconst_core::TextConstConfig;
use textconst_core::TracingTraceSink;
use textconst_core::check_artifacts;
use textconst_core::emit_artifacts;
use textconst_core::index_cache;
use textconst_core::index_cache::PipelineCache;
use textconst_core::project::Project;
use textconst_core::resolve_search_path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TEXTCONST_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = TextConstCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_logging(args.verbose, use_color);

	let result = match args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Generate { dry_run }) => run_generate(&args, dry_run),
		Some(Commands::Check { diff, format }) => run_check(&args, diff, format),
		Some(Commands::List) => run_list(&args),
		None => {
			eprintln!("No subcommand specified. Run `textconst --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<textconst_core::TextConstError>() {
			Ok(error) => {
				let report: miette::Report = (*error).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Logs go to stderr, filtered by `TEXTCONST_LOG` when set.
fn init_logging(verbose: bool, use_color: bool) {
	let default_filter = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &TextConstCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn run_init(args: &TextConstCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);

	if let Some(existing) = TextConstConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let sample_config = "# textconst configuration\n\n# Directory receiving generated \
	                     artifacts.\noutput = \"generated\"\n\n[properties]\n\
	                     \"build_property.RootNamespace\" = \"MyApp\"\n\n# Every `.txt` file in \
	                     `texts/` becomes a constant on `Texts`.\n[[declarations]]\nfile = \
	                     \"src/Texts.cs\"\ntype = \"Texts\"\nargs = [\".txt\", \"/texts\"]\n";

	let config_path = root.join("textconst.toml");
	std::fs::write(&config_path, sample_config)?;
	println!("Created {}", config_path.display());
	println!();
	println!("Next steps:");
	println!("  1. Put text files in texts/");
	println!("  2. Run `textconst generate` to write artifacts to generated/");
	println!("  3. Run `textconst check` in CI to keep them current");

	Ok(())
}

/// A completed run together with the project it ran against.
struct Session {
	project: Project,
	output: RunOutput,
	cache: PipelineCache,
}

impl Session {
	fn save_cache(&self) {
		index_cache::save(&self.project.root, &self.cache);
	}
}

fn run_pipeline(args: &TextConstCli) -> Result<Session, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let project = Project::load(&root)?;

	if project.declarations.is_empty() {
		eprintln!(
			"{} no declarations found, add [[declarations]] to textconst.toml",
			colored!("warning:", yellow)
		);
	}

	let template = project.template()?;
	let cache_key = index_cache::cache_key(&template);
	let previous = index_cache::load(&root, &cache_key);
	debug!(
		root = %root.display(),
		cached = previous.is_some(),
		"starting pipeline run"
	);
	let telemetry = previous
		.as_ref()
		.map(|cache| cache.telemetry.clone())
		.unwrap_or_default();

	let mut pipeline = Pipeline::new(template).with_trace_sink(Arc::new(TracingTraceSink));
	if let Some(previous) = previous {
		pipeline = pipeline.with_state(previous.state);
	}

	let output = pipeline.run(
		&project.declarations,
		&project.assets,
		&project.config.properties(),
		&CancellationToken::new(),
	)?;

	if args.verbose {
		println!(
			"Ran pipeline: {} declaration(s), {} asset(s), {} artifact(s) reused from cache",
			project.declarations.len(),
			project.assets.len(),
			output.reused_count()
		);
	}

	let mut cache = PipelineCache::new(cache_key, pipeline.state().clone());
	cache.telemetry = telemetry;
	cache.telemetry.record_run(&output);

	Ok(Session {
		project,
		output,
		cache,
	})
}

fn run_generate(args: &TextConstCli, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
	let session = run_pipeline(args)?;
	let root = &session.project.root;
	let output_dir = session.project.output_dir();

	if dry_run {
		let result = check_artifacts(&session.output, &output_dir);
		if result.is_ok() {
			println!("Dry run: all artifacts are up to date.");
			return Ok(());
		}

		println!(
			"Dry run: would write {} artifact(s):",
			result.stale.len()
		);
		for entry in &result.stale {
			println!("  {}", make_relative(&entry.path, root));
		}
		return Ok(());
	}

	let mut sink = DirectorySink::new(&output_dir);
	emit_artifacts(&session.output, &mut sink)?;
	session.save_cache();

	if sink.written().is_empty() {
		println!("All artifacts are already up to date.");
	} else {
		println!(
			"Wrote {} artifact(s) to {}:",
			sink.written().len(),
			make_relative(sink.dir(), root)
		);
		for path in sink.written() {
			println!("  {}", colored!(make_relative(path, root), green));
		}
	}

	let reused = session.output.reused_count();
	if reused > 0 {
		println!("{reused} artifact(s) reused from cache");
	}

	Ok(())
}

fn run_check(
	args: &TextConstCli,
	show_diff: bool,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let session = run_pipeline(args)?;
	let root = &session.project.root;
	let result = check_artifacts(&session.output, &session.project.output_dir());
	session.save_cache();

	if result.is_ok() {
		match format {
			OutputFormat::Json => {
				println!("{{\"ok\":true,\"stale\":[]}}");
			}
			OutputFormat::Text => {
				println!(
					"Check passed: all {} artifact(s) are up to date.",
					result.checked
				);
			}
		}
		return Ok(());
	}

	match format {
		OutputFormat::Json => {
			let stale_entries: Vec<serde_json::Value> = result
				.stale
				.iter()
				.map(|entry| {
					serde_json::json!({
						"file": make_relative(&entry.path, root),
						"missing": entry.current.is_none(),
					})
				})
				.collect();
			let payload = serde_json::json!({ "ok": false, "stale": stale_entries });
			println!("{payload}");
		}
		OutputFormat::Text => {
			for entry in &result.stale {
				let rel = make_relative(&entry.path, root);
				let state = if entry.current.is_some() {
					"is out of date"
				} else {
					"is missing"
				};
				eprintln!("{} {rel} {state}", colored!("stale:", red));

				if show_diff {
					print_diff(entry.current.as_deref().unwrap_or_default(), &entry.expected);
				}
			}

			eprintln!();
			eprintln!(
				"{} of {} artifact(s) need updating. Run `textconst generate` to update them.",
				result.stale.len(),
				result.checked
			);
		}
	}

	process::exit(1);
}

fn run_list(args: &TextConstCli) -> Result<(), Box<dyn std::error::Error>> {
	let session = run_pipeline(args)?;
	let project = &session.project;
	let properties = project.config.properties();
	let project_dir = properties
		.get(textconst_core::PROJECT_DIR_KEY)
		.map_or(".", String::as_str);

	println!(
		"{}",
		colored!(
			format!("Declarations ({}):", session.output.artifacts.len()),
			bold
		)
	);

	for run in &session.output.artifacts {
		let Some(declaration) = project
			.declarations
			.iter()
			.find(|declaration| declaration.id == run.artifact.id)
		else {
			continue;
		};
		let search_path = resolve_search_path(
			&declaration.path,
			&declaration.id.file_path,
			project_dir,
		);
		println!(
			"  {} ({}) searches {search_path} for {}",
			declaration.id.qualified_name(),
			declaration.id.file_path,
			declaration.extension
		);

		if run.constant_names.is_empty() {
			println!("    {}", colored!("no matching assets", yellow));
		}
		for name in &run.constant_names {
			println!("    {name}");
		}
	}

	session.save_cache();
	Ok(())
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
