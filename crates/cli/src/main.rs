//! Sigil command line driver.
//!
//! - `sigil replay` runs a JSON-lines directive stream against a document and
//!   prints the resulting document.
//! - `sigil locks` lists the locked regions of a document.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sigil_guard::{Document, EditSession, GuardConfig, InjectOutcome, InterventionDirective, LockOrigin};
use tracing::{info, warn};

/// Sigil command line arguments.
#[derive(Parser, Debug)]
#[command(name = "sigil")]
#[command(about = "Locked-region enforcement for agent-edited documents")]
struct Args {
	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Apply a directive stream to a document.
	Replay {
		/// Document to start from (`.json` for the structured form, plain text otherwise)
		#[arg(long, value_name = "PATH")]
		doc: PathBuf,

		/// Directives, one JSON object per line
		#[arg(long, value_name = "PATH")]
		directives: PathBuf,

		/// Guard configuration (TOML)
		#[arg(long, value_name = "PATH")]
		config: Option<PathBuf>,

		/// Initial cursor position
		#[arg(long, default_value_t = 0)]
		cursor: usize,

		/// Simulated time between directives, in milliseconds; wall clock when unset
		#[arg(long, value_name = "MS")]
		step_ms: Option<u64>,

		/// Write the result here instead of stdout
		#[arg(short, long, value_name = "PATH")]
		out: Option<PathBuf>,
	},
	/// List locked regions.
	Locks {
		/// Document to inspect
		doc: PathBuf,
	},
}

fn main() -> Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	match args.command {
		Command::Replay {
			doc,
			directives,
			config,
			cursor,
			step_ms,
			out,
		} => replay(&doc, &directives, config.as_deref(), cursor, step_ms, out.as_deref()),
		Command::Locks { doc } => locks(&doc),
	}
}

fn is_json(path: &Path) -> bool {
	path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn load_document(path: &Path) -> Result<Document> {
	let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	if is_json(path) {
		Document::from_json(&content).with_context(|| format!("parsing {}", path.display()))
	} else {
		Ok(Document::from_plain_text(&content))
	}
}

fn replay(
	doc_path: &Path,
	directives_path: &Path,
	config_path: Option<&Path>,
	cursor: usize,
	step_ms: Option<u64>,
	out: Option<&Path>,
) -> Result<()> {
	let config = match config_path {
		Some(path) => GuardConfig::load(path)?,
		None => GuardConfig::default(),
	};
	let mut session = EditSession::new(load_document(doc_path)?, &config);
	session.engine_mut().set_cursor(cursor);
	info!(locks = session.engine().registry().len(), "session ready");

	let stream = std::fs::read_to_string(directives_path)
		.with_context(|| format!("reading {}", directives_path.display()))?;
	let t0 = Instant::now();
	let (mut committed, mut rejected, mut skipped) = (0usize, 0usize, 0usize);

	for (index, line) in stream.lines().enumerate() {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		let directive = match InterventionDirective::parse(line) {
			Ok(directive) => directive,
			Err(error) => {
				warn!(line = index + 1, %error, "directive ignored");
				skipped += 1;
				continue;
			}
		};
		let now = match step_ms {
			Some(ms) => t0 + Duration::from_millis(ms.saturating_mul(index as u64)),
			None => Instant::now(),
		};
		match session.apply_directive_at(&directive, now) {
			InjectOutcome::Committed { .. } => committed += 1,
			InjectOutcome::Rejected(violation) => {
				info!(line = index + 1, %violation, "directive rejected");
				rejected += 1;
			}
			InjectOutcome::Skipped(_) => skipped += 1,
		}
	}
	info!(committed, rejected, skipped, "replay finished");

	let document = session.into_document();
	let rendered = if is_json(doc_path) {
		document.to_json()?
	} else {
		document.text().to_string()
	};
	match out {
		Some(path) => std::fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?,
		None => {
			let mut stdout = std::io::stdout().lock();
			stdout.write_all(rendered.as_bytes())?;
			stdout.flush()?;
		}
	}
	Ok(())
}

fn locks(doc_path: &Path) -> Result<()> {
	let session = EditSession::new(load_document(doc_path)?, &GuardConfig::default());
	let mut stdout = std::io::stdout().lock();
	for region in session.engine().locked_regions() {
		let line = serde_json::json!({
			"lockId": region.lock_id,
			"from": region.span.from,
			"to": region.span.to,
			"source": region.source.map(|s| s.as_str()),
			"legacy": region.origin == LockOrigin::LegacyMarker,
		});
		writeln!(stdout, "{line}")?;
	}
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("sigil_guard=trace,sigil=debug,info")
			} else {
				EnvFilter::new("warn")
			}
		})
	};

	if let Some(log_dir) = std::env::var("SIGIL_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("sigil.{}.log", std::process::id()));
		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);
			tracing_subscriber::registry().with(filter()).with(file_layer).init();
			tracing::info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.init();
}
