//! modhistory - snapshot the creation and modification history of a directory tree.
//!
//! Usage:
//!   modhistory [PATH]                 Collect and write a snapshot file
//!   modhistory [PATH] --stdout        Print the snapshot instead of writing it
//!   modhistory [PATH] --accumulate    Carry history forward from the last snapshot
//!   modhistory show-config [PATH]     Print the effective configuration
//!   modhistory --help                 Show help

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::thread::JoinHandle;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{Level, debug};

use modhistory_core::{CollectConfig, CollectError, ConfigFile, WeekdayNames};
use modhistory_scan::{CollectProgress, TreeCollector};
use modhistory_store::{SnapshotWriter, find_latest_snapshot, read_snapshot, to_pretty_json};

#[derive(Parser)]
#[command(
    name = "modhistory",
    version,
    about = "Snapshot file creation and modification times of a directory tree",
    long_about = "modhistory walks a directory tree and records, for every file, its creation \
                  time and modification history.\n\n\
                  The result is written as JSON to `File-Modified-History_(YYYYMMDD_HHMMSS).json`. \
                  Settings are read from the config file, then overridden by flags."
)]
struct Cli {
    #[command(flatten)]
    args: SnapshotArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the effective configuration as TOML
    ShowConfig {
        #[command(flatten)]
        args: SnapshotArgs,
    },
}

#[derive(Args, Clone, Default)]
struct SnapshotArgs {
    /// Directory to inventory (defaults to the config file's root, then ".")
    path: Option<PathBuf>,

    /// Config file (defaults to <config dir>/modhistory/config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File name to skip (repeatable)
    #[arg(short = 'x', long = "exclude-file", value_name = "NAME")]
    exclude_files: Vec<String>,

    /// Directory name to skip together with its contents (repeatable)
    #[arg(short = 'd', long = "exclude-dir", value_name = "NAME")]
    exclude_dirs: Vec<String>,

    /// Extension to skip, `log` or `.log` (repeatable)
    #[arg(short = 'e', long = "exclude-ext", value_name = "EXT")]
    exclude_extensions: Vec<String>,

    /// Weekday labels: english or korean
    #[arg(long, value_name = "LANG")]
    weekdays: Option<WeekdayNames>,

    /// Directory to write the snapshot file into
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Print the snapshot to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Abort on the first unreadable file
    #[arg(long)]
    strict: bool,

    /// Threads for directory reads (0 = auto, 1 = serial)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Descend into symlinked directories
    #[arg(long)]
    follow_symlinks: bool,

    /// Carry history forward from the latest snapshot in the output directory
    #[arg(long)]
    accumulate: bool,

    /// Carry history forward from this snapshot file
    #[arg(long, value_name = "FILE", conflicts_with = "accumulate")]
    previous: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Effective settings after layering the config file and flags.
struct Settings {
    collect: CollectConfig,
    output_dir: PathBuf,
    accumulate: bool,
    previous: Option<PathBuf>,
    stdout: bool,
}

impl Settings {
    fn resolve(args: &SnapshotArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::load_default()?.unwrap_or_default(),
        };

        let root = args
            .path
            .clone()
            .or_else(|| file.root.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        let collect = CollectConfig::builder()
            .root(root)
            .exclude_files(union(&file.exclude_files, &args.exclude_files))
            .exclude_dirs(union(&file.exclude_dirs, &args.exclude_dirs))
            .exclude_extensions(union(&file.exclude_extensions, &args.exclude_extensions))
            .weekday_names(args.weekdays.or(file.weekday_names).unwrap_or_default())
            .follow_symlinks(args.follow_symlinks || file.follow_symlinks.unwrap_or(false))
            .threads(args.threads.or(file.threads).unwrap_or(0))
            .strict(args.strict || file.strict.unwrap_or(false))
            .build()
            .map_err(CollectError::from)?;

        Ok(Self {
            collect,
            output_dir: args
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            accumulate: args.accumulate || file.accumulate.unwrap_or(false),
            previous: args.previous.clone(),
            stdout: args.stdout,
        })
    }

    /// Snapshot to carry history from, if history accumulation is on.
    fn prior_snapshot(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.previous {
            return Ok(Some(path.clone()));
        }
        if self.accumulate {
            return Ok(find_latest_snapshot(&self.output_dir)?);
        }
        Ok(None)
    }

    fn to_toml(&self) -> Result<String> {
        let file = ConfigFile {
            root: Some(self.collect.root.clone()),
            exclude_files: self.collect.exclude_files.iter().cloned().collect(),
            exclude_dirs: self.collect.exclude_dirs.iter().cloned().collect(),
            exclude_extensions: self.collect.exclude_extensions.iter().cloned().collect(),
            weekday_names: Some(self.collect.weekday_names),
            follow_symlinks: Some(self.collect.follow_symlinks),
            threads: Some(self.collect.threads),
            strict: Some(self.collect.strict),
            output_dir: Some(self.output_dir.clone()),
            accumulate: Some(self.accumulate),
        };
        toml::to_string_pretty(&file).context("Failed to render configuration")
    }
}

fn union(from_file: &[String], from_flags: &[String]) -> BTreeSet<String> {
    from_file.iter().chain(from_flags).cloned().collect()
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Some(Command::ShowConfig { args }) => {
            init_logging(&args);
            let settings = Settings::resolve(&args)?;
            print!("{}", settings.to_toml()?);
        }
        None => {
            init_logging(&cli.args);
            run_snapshot(&cli.args)?;
        }
    }

    Ok(())
}

fn init_logging(args: &SnapshotArgs) {
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Collect a snapshot and write it out.
fn run_snapshot(args: &SnapshotArgs) -> Result<()> {
    let settings = Settings::resolve(args)?;
    let root = settings
        .collect
        .root
        .canonicalize()
        .with_context(|| format!("Invalid path: {}", settings.collect.root.display()))?;

    if !args.quiet {
        eprintln!("Scanning {}...", root.display());
    }

    let collector = TreeCollector::new();
    let progress = spawn_progress_logger(collector.subscribe());
    let result = collector.collect(&settings.collect);
    drop(collector);
    let _ = progress.join();
    let mut snapshot = match result {
        Ok(snapshot) => snapshot,
        Err(err) if err.is_traversal() => {
            return Err(err).context("Cannot scan the requested directory");
        }
        Err(err) => return Err(err).context("Collection failed"),
    };

    if let Some(prior_path) = settings.prior_snapshot()? {
        let prior = read_snapshot(&prior_path)?;
        snapshot.root.carry_history_from(&prior);
        debug!(prior = %prior_path.display(), "carried history forward");
    }

    if settings.stdout {
        println!("{}", to_pretty_json(&snapshot.root)?);
    } else {
        let writer = SnapshotWriter::new(&settings.output_dir);
        match writer.write(&snapshot.root) {
            Ok(path) => {
                if !args.quiet {
                    eprintln!("Saved file history to '{}'", path.display());
                }
            }
            Err(err) => {
                // Keep the result: hand it to stdout before reporting the failure.
                eprintln!(
                    "Failed to save snapshot in '{}'; printing it to stdout instead",
                    writer.output_dir().display()
                );
                println!("{}", to_pretty_json(&snapshot.root)?);
                return Err(err).context("Failed to write snapshot file");
            }
        }
    }

    if !args.quiet {
        eprintln!(
            " {} files, {} directories ({} entries seen) in {:.2}s",
            snapshot.stats.files_recorded,
            snapshot.stats.dirs_recorded,
            snapshot.stats.entries_seen(),
            snapshot.duration.as_secs_f64()
        );
        if snapshot.has_warnings() {
            eprintln!(" {} entries skipped (rerun with -v for details)", snapshot.warnings.len());
        }
    }

    Ok(())
}

/// Log progress updates until the collector goes away.
fn spawn_progress_logger(mut rx: broadcast::Receiver<CollectProgress>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        loop {
            match rx.blocking_recv() {
                Ok(progress) => debug!(
                    files = progress.files_recorded,
                    dirs = progress.dirs_recorded,
                    items = progress.total_items(),
                    files_per_second = progress.files_per_second(),
                    path = %progress.current_path.display(),
                    "progress"
                ),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}
