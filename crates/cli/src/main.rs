mod metrics;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackresolver_core::{
    create_pacer, load_config, load_config_from_env, load_history, validate_config,
    CatalogResolver, Config, ExternalCatalog, Resolution, SanitizedConfig, SpotifyClient,
    SqliteTrackCache, TrackCache,
};

/// Resolve (artist, track) pairs to Spotify track ids, cache first.
#[derive(Parser, Debug)]
#[command(name = "trackresolver")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "TRACKRESOLVER_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    /// Dump Prometheus metrics to stderr before exiting
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a single pair and print its track id, or `absent`
    Resolve { artist: String, track: String },

    /// Resolve every unique pair found in streaming-history exports
    History {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print cache statistics
    Stats,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run_with_metrics(cli, &mut std::io::stderr()).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

/// Run the command, then dump metrics if asked, whether or not it failed.
async fn run_with_metrics(cli: Cli, metrics_out: &mut impl Write) -> Result<()> {
    let print_metrics = cli.print_metrics;
    let result = run(cli).await;

    if print_metrics {
        let written = metrics::encode_metrics()
            .and_then(|text| metrics_out.write_all(text.as_bytes()).map_err(Into::into));
        if let Err(e) = written {
            error!("Failed to print metrics: {:#}", e);
        }
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Resolve { artist, track } => {
            let resolver = build_resolver(&config)?;
            let resolution = resolver.resolve(&artist, &track).await?;
            println!("{}", format_resolution(&resolution));
        }
        Command::History { files } => {
            let queries = load_history(&files).context("Failed to read streaming history")?;
            info!("{} unique pairs to resolve", queries.len());

            let resolver = build_resolver(&config)?;
            let results = resolver.resolve_many(&queries).await;

            let mut summary = Summary::default();
            for (query, result) in &results {
                let column = match result {
                    Ok(resolution) => {
                        summary.record(resolution);
                        format_resolution(resolution)
                    }
                    Err(e) => {
                        summary.errors += 1;
                        format!("error: {}", e)
                    }
                };
                println!("{}\t{}\t{}", query.artist_name, query.track_name, column);
            }
            println!(
                "{} pairs: {} found ({} cached), {} absent ({} known), {} errors",
                results.len(),
                summary.found,
                summary.cached,
                summary.absent,
                summary.known_missing,
                summary.errors
            );
        }
        Command::Stats => {
            let cache = open_cache(&config)?;
            let stats = cache.stats().context("Failed to read cache statistics")?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

/// `--config` / `TRACKRESOLVER_CONFIG`, else `config.toml` if present, else env only.
fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    let default_path = Path::new("config.toml");
    let config = match explicit {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None if default_path.exists() => {
            info!("Loading configuration from {:?}", default_path);
            load_config(default_path)
                .with_context(|| format!("Failed to load config from {:?}", default_path))?
        }
        None => {
            info!("No config file, using environment only");
            load_config_from_env().context("Failed to load config from environment")?
        }
    };

    if let Ok(json) = serde_json::to_string(&SanitizedConfig::from(&config)) {
        tracing::debug!("Effective configuration: {}", json);
    }
    Ok(config)
}

fn open_cache(config: &Config) -> Result<Arc<SqliteTrackCache>> {
    let cache = SqliteTrackCache::new(&config.database.path)
        .with_context(|| format!("Failed to open track cache at {:?}", config.database.path))?;
    info!("Track cache at {:?}", config.database.path);
    Ok(Arc::new(cache))
}

fn build_resolver(config: &Config) -> Result<CatalogResolver> {
    validate_config(config).context("Configuration validation failed")?;

    let cache: Arc<dyn TrackCache> = open_cache(config)?;
    let catalog: Arc<dyn ExternalCatalog> = Arc::new(
        SpotifyClient::new(config.spotify.clone()).context("Failed to create Spotify client")?,
    );
    let pacer = create_pacer(&config.resolver.pacing);

    Ok(CatalogResolver::new(
        config.resolver.clone(),
        catalog,
        cache,
        pacer,
    ))
}

fn format_resolution(resolution: &Resolution) -> String {
    match resolution.track_id() {
        Some(id) => id.to_string(),
        None => "absent".to_string(),
    }
}

#[derive(Debug, Default)]
struct Summary {
    found: usize,
    cached: usize,
    absent: usize,
    known_missing: usize,
    errors: usize,
}

impl Summary {
    fn record(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Cached(_) => {
                self.found += 1;
                self.cached += 1;
            }
            Resolution::Resolved(_) => self.found += 1,
            Resolution::KnownMissing => {
                self.absent += 1;
                self.known_missing += 1;
            }
            Resolution::Missing => self.absent += 1,
        }
    }
}
