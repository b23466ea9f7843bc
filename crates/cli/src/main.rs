//! Themecolors binary.
//!
//! - `serve`: runs the completion language server over stdio.
//! - `harvest`: builds the color data document from the editor sources.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use themecolors_catalog::HttpFetcher;
use themecolors_lsp::{MainLoop, Server, ServerOptions};
use tracing::info;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "themecolors", version)]
#[command(about = "Theme color CSS variable completions")]
struct Args {
	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the language server on stdin/stdout
	Serve {
		/// Directory for the cached color data
		#[arg(long, value_name = "DIR")]
		storage_dir: Option<PathBuf>,
	},
	/// Extract theme colors from the editor sources
	Harvest {
		/// Source archive to download
		#[arg(long, value_name = "URL", default_value = themecolors_harvest::DEFAULT_ARCHIVE_URL)]
		archive_url: String,

		/// Use a local checkout instead of downloading
		#[arg(long, value_name = "DIR", conflicts_with = "archive_url")]
		source: Option<PathBuf>,

		/// Output file, stdout when omitted
		#[arg(short, long, value_name = "PATH")]
		output: Option<PathBuf>,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	match args.command {
		Command::Serve { storage_dir } => serve(storage_dir).await,
		Command::Harvest {
			archive_url,
			source,
			output,
		} => harvest(archive_url, source, output).await,
	}
}

async fn serve(storage_dir: Option<PathBuf>) -> anyhow::Result<()> {
	let storage_dir = match storage_dir {
		Some(dir) => dir,
		None => default_storage_dir()?,
	};
	info!(storage = %storage_dir.display(), "starting themecolors language server");

	let options = ServerOptions {
		storage_dir,
		fetcher: Arc::new(HttpFetcher::new()),
	};
	let (main_loop, _) = MainLoop::new_server(|client| Server::new(client, options));
	main_loop
		.run_buffered(tokio::io::stdin(), tokio::io::stdout())
		.await
		.context("language server stopped")?;
	info!("language server exited");
	Ok(())
}

fn default_storage_dir() -> anyhow::Result<PathBuf> {
	let data = dirs::data_dir().context("no data directory for this platform, pass --storage-dir")?;
	Ok(data.join("themecolors"))
}

async fn harvest(archive_url: String, source: Option<PathBuf>, output: Option<PathBuf>) -> anyhow::Result<()> {
	// Keeps the unpacked archive alive until harvesting is done.
	let mut unpacked = None;
	let root = match source {
		Some(dir) => dir,
		None => {
			let bytes = themecolors_harvest::archive::download(&archive_url)
				.await
				.with_context(|| format!("downloading {archive_url}"))?;
			let dir = tempfile::tempdir().context("creating a temporary directory")?;
			let root = themecolors_harvest::archive::unpack(&bytes, dir.path())?;
			unpacked = Some(dir);
			root
		}
	};

	let catalog = tokio::task::spawn_blocking(move || themecolors_harvest::harvest_checkout(&root))
		.await
		.context("harvest task failed")??;
	info!(colors = catalog.len(), "harvest complete");
	drop(unpacked);

	themecolors_harvest::write_catalog(&catalog, output.as_deref())?;
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("themecolors_lsp=trace,themecolors_catalog=debug,themecolors_harvest=debug,info")
			} else {
				EnvFilter::new("info")
			}
		})
	};

	// THEMECOLORS_LOG_DIR sends logs to a per-process file instead of stderr
	if let Some(log_dir) = std::env::var("THEMECOLORS_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("themecolors.{}.log", std::process::id()));

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

	// stdout carries the protocol, so logs go to stderr
	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.init();
}
