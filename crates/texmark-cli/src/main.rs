//! Texmark CLI
//!
//! Command-line host for the texmark indexer: lists project files, anchors
//! and outlines, and keeps the index warm while watching for saves.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use texmark_indexer::query::{duplicate_anchors, find_anchor};
use texmark_indexer::{
    FsSource, IndexerConfig, LatexScanner, ProjectIndexer, SaveWatcher, WatcherOptions,
};
use tracing_subscriber::EnvFilter;

type Indexer = ProjectIndexer<FsSource, LatexScanner>;

#[derive(Parser)]
#[command(name = "texmark")]
#[command(about = "Texmark - labels and outlines for multi-file LaTeX projects")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/texmark/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the files of a project
    Files {
        /// Root file of the project
        root: PathBuf,
    },

    /// List anchors (labels) of a project
    Anchors {
        /// Root file of the project
        root: PathBuf,

        /// Only show the anchor with this name
        #[arg(long)]
        name: Option<String>,

        /// Report names defined more than once
        #[arg(long)]
        duplicates: bool,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the outline of a project
    Outline {
        /// Root file of the project
        root: PathBuf,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Keep the index up to date while files are saved
    Watch {
        /// Root file of the project
        root: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => IndexerConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => IndexerConfig::load(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let scanner = LatexScanner::new().context("Failed to build scanner")?;
    let mut indexer = ProjectIndexer::with_config(FsSource::new(), scanner, &config)
        .context("Failed to build include resolver")?;

    match cli.command {
        Commands::Files { root } => {
            let root = canonical_root(&root)?;
            for file in indexer.resolve(&root) {
                println!("{}", file.display());
            }
        }

        Commands::Anchors {
            root,
            name,
            duplicates,
            json,
        } => {
            let root = canonical_root(&root)?;
            let index = indexer.refresh(&root);

            if duplicates {
                for (name, sites) in duplicate_anchors(&index) {
                    println!("{name}");
                    for site in sites {
                        println!("  {}:{}", site.file.display(), site.offset);
                    }
                }
                return Ok(());
            }

            let anchors: Vec<_> = match &name {
                Some(name) => find_anchor(&index, name).into_iter().collect(),
                None => index.anchors.iter().collect(),
            };
            if anchors.is_empty() {
                eprintln!("No anchors found");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&anchors)?);
            } else {
                for anchor in anchors {
                    println!(
                        "{}\t{}:{}",
                        anchor.name,
                        display_relative(&anchor.file, &root),
                        anchor.offset
                    );
                }
            }
        }

        Commands::Outline { root, json } => {
            let root = canonical_root(&root)?;
            let index = indexer.refresh(&root);

            if json {
                println!("{}", serde_json::to_string_pretty(&index.outline)?);
            } else {
                for entry in &index.outline {
                    println!(
                        "{}{}  ({})",
                        "  ".repeat(entry.level as usize),
                        entry.title,
                        display_relative(&entry.file, &root)
                    );
                }
            }
        }

        Commands::Watch { root } => {
            let root = canonical_root(&root)?;
            watch(&mut indexer, &root, &config).await?;
        }
    }

    Ok(())
}

/// Refresh on every save of a project file until interrupted.
async fn watch(indexer: &mut Indexer, root: &Path, config: &IndexerConfig) -> Result<()> {
    let index = indexer.refresh(root);
    tracing::info!(
        anchors = index.anchors.len(),
        outline = index.outline.len(),
        "Initial index built"
    );

    let dir = root.parent().context("Root file has no parent directory")?;
    let mut watcher = SaveWatcher::new(WatcherOptions::with_debounce_ms(config.debounce_ms));
    watcher
        .watch(dir)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;

    loop {
        tokio::select! {
            event = watcher.next() => {
                let Some(event) = event else { break };
                let touched = indexer.invalidate(&event.path);
                if touched == 0 && event.path.as_path() != root {
                    continue;
                }
                let index = indexer.refresh(root);
                tracing::info!(
                    file = ?event.path,
                    scanned = index.stats.scanned,
                    anchors = index.anchors.len(),
                    outline = index.outline.len(),
                    "Index updated"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    let metrics = indexer.metrics();
    tracing::info!(
        refreshes = metrics.refreshes,
        scans = metrics.scans,
        hit_rate = metrics.hit_rate(),
        "Stopped watching"
    );
    Ok(())
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    root.canonicalize()
        .with_context(|| format!("Root file not found: {}", root.display()))
}

fn display_relative(file: &Path, root: &Path) -> String {
    let base = root.parent().unwrap_or(root);
    file.strip_prefix(base)
        .unwrap_or(file)
        .display()
        .to_string()
}
