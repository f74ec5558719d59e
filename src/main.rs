//! tm-catalog CLI: catalog bilingual translation-memory repositories.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::prelude::*;

use tm_catalog::catalog::{
    CatalogRunner, CatalogStats, ItemAnalyzer, ProgressState, RunMode, RunOptions, RunReport,
    load_exclusions,
};
use tm_catalog::config::CatalogConfig;
use tm_catalog::discovery::DiscoveryEngine;
use tm_catalog::error::ConfigError;
use tm_catalog::paths::CatalogPaths;
use tm_catalog::remote::{GitHubConfig, GitHubHost};
use tm_catalog::titles::{
    AiResponseCache, AiTitleExtractor, GeminiBackend, GeminiConfig, TitleMapping, TitlePipeline,
};

#[derive(Parser)]
#[command(
    name = "tm-catalog",
    version,
    about = "Catalog bilingual Tibetan/English translation-memory repositories"
)]
struct Cli {
    /// Keep caches, state, and output under this directory instead of the
    /// XDG locations.
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also append logs to the state directory's log file.
    #[arg(long, global = true)]
    log_file: bool,

    /// GitHub token for search and content access.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    github_token: Option<String>,

    /// Gemini API key; without it AI-assisted extraction is skipped.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    gemini_api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover items and catalog every pending one.
    Run {
        /// Only consider the first N discovered items.
        #[arg(long)]
        limit: Option<usize>,

        /// Re-attempt only the items recorded as failed.
        #[arg(long)]
        retry_failed: bool,

        /// Ignore the discovery cache and search again.
        #[arg(long)]
        refresh_discovery: bool,

        /// Rebuild the title mapping from the reference repository.
        #[arg(long)]
        rebuild_mapping: bool,

        /// Skip AI-assisted title extraction.
        #[arg(long)]
        no_ai: bool,

        /// Items per catalog flush (overrides the config).
        #[arg(long)]
        batch_size: Option<usize>,

        /// CSV with a `file_name` column of items to skip.
        #[arg(long)]
        exclude_csv: Option<PathBuf>,
    },

    /// Discover items and cache the candidate list.
    Discover {
        /// Ignore the existing cache.
        #[arg(long)]
        refresh: bool,
    },

    /// Build or show the structured title mapping.
    Mapping {
        /// Rebuild even when a cached mapping exists.
        #[arg(long)]
        rebuild: bool,
    },

    /// Summarize saved progress and the catalog without running.
    Report,

    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();

    let paths = match &cli.work_dir {
        Some(dir) => CatalogPaths::under(dir),
        None => CatalogPaths::resolve()?,
    };
    init_tracing(cli.log_file.then(|| paths.log_file()).as_deref())?;

    let config = CatalogConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            limit,
            retry_failed,
            refresh_discovery,
            rebuild_mapping,
            no_ai,
            batch_size,
            exclude_csv,
        } => {
            paths.ensure_dirs()?;
            let host = github_host(&config, cli.github_token)?;
            let discovery = discovery_engine(&host, &config, &paths);
            if refresh_discovery {
                discovery.invalidate()?;
            }

            let mapping = TitleMapping::load_or_build(
                &host,
                &config.reference_repo,
                &paths.mapping_cache(),
                rebuild_mapping,
            );
            let ai = if no_ai {
                None
            } else {
                ai_extractor(&config, cli.gemini_api_key, &paths)
            };
            let pipeline = TitlePipeline::new(mapping, ai);
            let analyzer = ItemAnalyzer::new(&host, config.encodings.clone(), config.line_count);

            let exclusions = match exclude_csv {
                Some(path) => load_exclusions(&path)?,
                None => BTreeSet::new(),
            };
            let options = RunOptions {
                mode: if retry_failed {
                    RunMode::RetryFailed
                } else {
                    RunMode::Normal
                },
                limit,
                batch_size: batch_size.unwrap_or(config.batch_size).max(1),
                item_pause: Duration::from_millis(config.item_pause_ms),
                exclusions,
            };

            let interrupt = install_interrupt_handler()?;
            let mut runner = CatalogRunner::new(analyzer, pipeline, &paths, options)?
                .with_interrupt(interrupt);
            let report = runner.run(&discovery)?;
            println!("{report}");
        }

        Commands::Discover { refresh } => {
            paths.ensure_dirs()?;
            let host = github_host(&config, cli.github_token)?;
            let discovery = discovery_engine(&host, &config, &paths);
            if refresh {
                discovery.invalidate()?;
            }
            let items = discovery.discover()?;

            let progress = ProgressState::load_or_new(
                &paths.progress_file(),
                config.batch_size,
                &paths.catalog_file(),
            )?;
            let done = items
                .iter()
                .filter(|i| progress.is_processed(&i.name))
                .count();
            println!(
                "{} candidates ({} already processed, {} new), cached at {}",
                items.len(),
                done,
                items.len() - done,
                discovery.cache_path().display()
            );
        }

        Commands::Mapping { rebuild } => {
            paths.ensure_dirs()?;
            let host = github_host(&config, cli.github_token)?;
            let mapping = TitleMapping::load_or_build(
                &host,
                &config.reference_repo,
                &paths.mapping_cache(),
                rebuild,
            );
            for (identifier, title) in mapping.iter() {
                println!("{identifier}\t{title}");
            }
            println!("{} entries", mapping.len());
        }

        Commands::Report => {
            let progress = ProgressState::load_or_new(
                &paths.progress_file(),
                config.batch_size,
                &paths.catalog_file(),
            )?;
            let stats = CatalogStats::from_catalog(&paths.catalog_file())?;
            println!(
                "{}",
                RunReport::from_saved(&progress, stats, &paths.catalog_file())
            );
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Stderr logging filtered by `RUST_LOG` (default `info`), optionally
/// mirrored into an append-mode file.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).into_diagnostic()?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .into_diagnostic()?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// First SIGINT sets the returned flag so the run stops after the current
/// item and flushes; a second one exits immediately.
fn install_interrupt_handler() -> Result<Arc<AtomicBool>> {
    use signal_hook::consts::SIGINT;

    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register_conditional_shutdown(SIGINT, 130, Arc::clone(&flag))
        .into_diagnostic()?;
    signal_hook::flag::register(SIGINT, Arc::clone(&flag)).into_diagnostic()?;
    Ok(flag)
}

fn github_host(config: &CatalogConfig, token: Option<String>) -> Result<GitHubHost> {
    let token = token.ok_or_else(|| ConfigError::MissingCredential {
        name: "GITHUB_TOKEN".into(),
    })?;
    Ok(GitHubHost::new(GitHubConfig {
        api_base: config.api_base.clone(),
        organization: config.organization.clone(),
        token: Some(token),
        timeout_secs: config.http_timeout_secs,
    }))
}

fn discovery_engine<'a>(
    host: &'a GitHubHost,
    config: &CatalogConfig,
    paths: &CatalogPaths,
) -> DiscoveryEngine<'a> {
    DiscoveryEngine::new(
        host,
        &config.organization,
        &config.name_prefix,
        paths.discovery_cache(),
    )
    .with_query_pause(Duration::from_millis(config.query_pause_ms))
}

fn ai_extractor(
    config: &CatalogConfig,
    api_key: Option<String>,
    paths: &CatalogPaths,
) -> Option<AiTitleExtractor> {
    if !config.ai.enabled {
        tracing::info!("AI-assisted extraction disabled in config");
        return None;
    }
    let Some(api_key) = api_key else {
        tracing::warn!("GEMINI_API_KEY not set, AI-assisted extraction disabled");
        return None;
    };
    let backend = GeminiBackend::new(GeminiConfig {
        base_url: config.ai.base_url.clone(),
        model: config.ai.model.clone(),
        api_key,
        timeout_secs: config.ai.timeout_secs,
    });
    tracing::info!(model = %config.ai.model, "AI-assisted extraction enabled");
    Some(AiTitleExtractor::new(
        Box::new(backend),
        AiResponseCache::open(&paths.ai_cache()),
    ))
}
