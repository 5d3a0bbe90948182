mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use context_file_export::app::clipboard::{self, ArboardClipboard};
use context_file_export::app::{commands, render, ExportTreeEngine, JsonFileStore, LoggingProxy};
use context_file_export::config::{self, ExporterConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // The clipboard holder is a re-launch of this binary and exits early.
    if clipboard::check_and_run_daemon_if_requested()? {
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli::Cli::parse()).await
}

fn resolve(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).with_context(|| format!("Cannot resolve {}", path.display()))
}

async fn run(args: cli::Cli) -> Result<()> {
    let mut config = ExporterConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        ExporterConfig::default()
    });
    if let Some(dir) = &args.state_dir {
        config.state_directory = Some(dir.clone());
    }

    let roots = args
        .roots
        .iter()
        .map(|root| resolve(root))
        .collect::<Result<Vec<_>>>()?;
    let primary = roots.first().context("No workspace root given")?;
    let state_path = config::settings::workspace_state_path(&config, primary)?;
    let store = JsonFileStore::open(&state_path)
        .await
        .with_context(|| format!("Failed to open workspace state {}", state_path.display()))?;

    let proxy = LoggingProxy;
    let mut engine =
        ExportTreeEngine::new(roots, Arc::new(store), proxy.clone()).with_config(&config);
    engine.initialize().await;
    let engine = Arc::new(tokio::sync::Mutex::new(engine));

    if let Some(enabled) = args.gitignore_override() {
        if engine.lock().await.use_gitignore() != enabled {
            commands::set_gitignore(&proxy, &engine, enabled).await;
        }
    }

    match args.command {
        cli::Commands::Tree => {
            let rendered = render::render_tree(&mut *engine.lock().await).await;
            println!("{}", rendered);
        }
        cli::Commands::Toggle { paths } => {
            let paths = paths
                .iter()
                .map(|path| resolve(path))
                .collect::<Result<Vec<_>>>()?;
            let mut guard = engine.lock().await;
            if let [single] = paths.as_slice() {
                guard.toggle_checkbox(single).await;
            } else {
                let (folders, files): (Vec<PathBuf>, Vec<PathBuf>) =
                    paths.into_iter().partition(|path| path.is_dir());
                guard.begin_batch();
                guard.toggle_batch(&files).await;
                for folder in &folders {
                    guard.toggle_checkbox(folder).await;
                }
                guard.end_batch();
            }
            for path in guard.get_checked_paths().await {
                println!("{}", path.display());
            }
        }
        cli::Commands::Clear => commands::clear_selections(&proxy, &engine).await,
        cli::Commands::List => {
            for path in engine.lock().await.get_checked_paths().await {
                println!("{}", path.display());
            }
        }
        cli::Commands::Export { output } => {
            let destination = match output {
                Some(path) => path,
                None => std::env::current_dir()?.join(&config.default_export_filename),
            };
            commands::export_to_file(&proxy, &engine, &destination).await?;
        }
        cli::Commands::Copy => {
            commands::copy_to_clipboard(&ArboardClipboard, &proxy, &engine).await?;
        }
    }

    engine.lock().await.dispose().await;
    Ok(())
}
