//! Command-line interface for the extraction dispatcher.
//!
//! `unarchive extract` submits files and directories to a dispatcher and
//! waits until every accepted request has completed or failed. Ctrl-C stops
//! the worker after the archive currently being extracted.

use clap::{Parser, Subcommand};
use extract_dispatch::{DispatchConfig, Dispatcher, ExtractListener, FileEntry, Submission};
use extractor::{ExtractOptions, OverwriteMode};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};

#[derive(Parser)]
#[command(name = "unarchive")]
#[command(version, about = "Extract archives from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract archives, or every archive under a directory
    Extract {
        /// Files or directories, under the local directory
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Dispatcher settings file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root that paths are resolved against [default: from config, or "."]
        #[arg(long)]
        local_dir: Option<PathBuf>,

        /// Overwrite mode: replace, skip, rename
        #[arg(long, default_value = "replace")]
        overwrite: OverwriteMode,

        /// Size limit in bytes per archive
        #[arg(long)]
        size_limit: Option<u64>,

        /// Extract symbolic links instead of skipping them
        #[arg(long)]
        allow_symlinks: bool,
    },

    /// Probe archive metadata
    Probe {
        /// Archive file to probe
        archive: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            paths,
            out,
            config,
            local_dir,
            overwrite,
            size_limit,
            allow_symlinks,
        } => {
            let options = ExtractOptions {
                overwrite,
                size_limit_bytes: size_limit.or(ExtractOptions::default().size_limit_bytes),
                allow_symlinks,
            };
            handle_extract(paths, out, config, local_dir, options).await
        }
        Commands::Probe { archive, json } => handle_probe(&archive, json),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Events forwarded from the worker thread and the Ctrl-C handler.
#[derive(Debug)]
enum Event {
    Completed(String),
    Failed(String),
    Interrupted,
}

struct ChannelListener {
    events: UnboundedSender<Event>,
}

impl ExtractListener for ChannelListener {
    fn extract_completed(&self, name: &str, _is_dir: bool) {
        let _ = self.events.send(Event::Completed(name.to_string()));
    }

    fn extract_failed(&self, name: &str, _is_dir: bool) {
        let _ = self.events.send(Event::Failed(name.to_string()));
    }
}

/// Returns `Ok(false)` when any request was rejected or failed.
async fn handle_extract(
    paths: Vec<PathBuf>,
    out: PathBuf,
    config_path: Option<PathBuf>,
    local_dir: Option<PathBuf>,
    options: ExtractOptions,
) -> CliResult<bool> {
    let mut config = match &config_path {
        Some(path) => DispatchConfig::load(path)?,
        None => DispatchConfig::default(),
    };
    if let Some(local_dir) = local_dir {
        config.local_dir = local_dir;
    }
    config.local_dir = config.local_dir.canonicalize()?;
    config.output_dir = out;
    tracing::debug!(?config, "dispatcher configuration");

    let local_root = config.local_dir.clone();
    let dispatcher = Arc::new(Dispatcher::with_extractor(config, options)?);

    let (tx, mut rx) = mpsc::unbounded_channel();
    dispatcher.add_listener(Arc::new(ChannelListener { events: tx.clone() }));
    let interrupt = tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt.send(Event::Interrupted);
    })?;
    drop(tx);

    dispatcher.start()?;

    let mut ok = true;
    let mut queued = 0u64;
    for path in &paths {
        match submit_path(&dispatcher, &local_root, path) {
            Ok(Submission::Queued) => queued += 1,
            Ok(Submission::Ignored) => println!("Already queued: {}", path.display()),
            Err(e) => {
                eprintln!("Skipping {}: {}", path.display(), e);
                ok = false;
            }
        }
    }

    let progress = ProgressBar::new(queued);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    progress.enable_steady_tick(Duration::from_millis(120));
    update_progress_message(&progress, &dispatcher);

    let mut finished = 0u64;
    let mut interrupted = false;
    while finished < queued {
        let Some(event) = rx.recv().await else {
            break;
        };
        match event {
            Event::Completed(name) => {
                finished += 1;
                progress.println(format!("Extracted {}", name));
            }
            Event::Failed(name) => {
                finished += 1;
                ok = false;
                progress.println(format!("Failed to extract {}", name));
            }
            Event::Interrupted => {
                interrupted = true;
                break;
            }
        }
        progress.set_position(finished);
        update_progress_message(&progress, &dispatcher);
    }

    if interrupted {
        progress.set_message("stopping after the current archive...");
    }
    let stopping = Arc::clone(&dispatcher);
    tokio::task::spawn_blocking(move || stopping.stop()).await?;
    progress.finish_and_clear();

    if interrupted {
        let remaining = dispatcher.status();
        eprintln!("Interrupted, {} request(s) not extracted", remaining.len());
        if !remaining.is_empty() {
            eprintln!("{}", serde_json::to_string_pretty(&remaining)?);
        }
        return Ok(false);
    }

    println!(
        "{} of {} request(s) processed into {}",
        finished,
        queued,
        dispatcher.config().output_dir.display()
    );
    Ok(ok)
}

/// Scan `path` from disk and submit it, relative to the local root.
fn submit_path(
    dispatcher: &Dispatcher,
    local_root: &Path,
    path: &Path,
) -> CliResult<Submission> {
    let absolute = local_root.join(path).canonicalize()?;
    let relative = absolute
        .strip_prefix(local_root)
        .map_err(|_| format!("{} is outside {}", path.display(), local_root.display()))?;
    if relative.as_os_str().is_empty() {
        return Err(format!("{} is the local directory itself", path.display()).into());
    }

    let tree = FileEntry::scan(local_root, relative)?;
    Ok(dispatcher.submit(&tree)?)
}

fn update_progress_message(progress: &ProgressBar, dispatcher: &Dispatcher) {
    match dispatcher.status().first() {
        Some(current) => progress.set_message(current.name.clone()),
        None => progress.set_message(""),
    }
}

fn handle_probe(archive: &Path, json: bool) -> CliResult<bool> {
    let info = extractor::probe(archive)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Path:    {}", info.path.display());
        println!("Format:  {}", info.format);
        println!("Size:    {} bytes", info.size_bytes);
        if info.continuation_volume {
            println!("Note:    continuation volume, extract the first volume instead");
        }
    }
    Ok(true)
}
