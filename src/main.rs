use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use logo_api::{
    config::{CacheBackend, Config, ObjectStoreBackend},
    database::{Database, repositories::ResourceSeaOrmRepository},
    rasterizer::{self, RasterizationPipeline},
    services::{CleanupHousekeeper, ExpiredArtifactSweeper, ResolverSettings, ResolverStores, ResourceResolver},
    storage::{
        CacheIndex, HttpObjectStore, LocalObjectStore, MemoryCacheStore, MemoryObjectStore, ObjectStore,
        PendingDeletionQueue, RedisCacheStore, redis_cache::RedisKeys,
    },
    web::{AppState, WebServer, wait_for_signal},
};

#[derive(Parser)]
#[command(name = "logo-api")]
#[command(version)]
#[command(about = "Institution logo service with on-demand rasterization and cache expiry")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the HTTP service and the cleanup housekeeper (default)
    Serve,
    /// Run one cleanup sweep and print the result as JSON
    Clean,
    /// Apply database migrations and exit
    Migrate,
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(host) = cli.host.clone() {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url.clone() {
        config.database.url = database_url;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Command::Migrate => {
            let database = Database::new(&config.database).await?;
            database.migrate().await
        }
        Command::Clean => {
            let components = Components::build(&config).await?;
            let result = components.sweeper.clean_expired(Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_clean() {
                warn!("{} of {} artifacts could not be cleaned", result.failed, result.total);
            }
            Ok(())
        }
        Command::Serve => serve(config).await,
    }
}

fn init_tracing(cli: &Cli) {
    let log_filter = if cli.log_level == "trace" {
        format!("logo_api={},tower_http=trace", cli.log_level)
    } else {
        format!("logo_api={},tower_http={}", cli.log_level, cli.log_level)
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into());
    let fmt_layer = match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };
    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting logo-api v{}", env!("CARGO_PKG_VERSION"));
    let components = Components::build(&config).await?;
    let shutdown = CancellationToken::new();

    let housekeeper = if config.cache.cleanup_enabled {
        let housekeeper = CleanupHousekeeper::new(components.sweeper.clone(), config.cache.cleanup_interval);
        Some(tokio::spawn(housekeeper.start(shutdown.clone())))
    } else {
        info!("Cleanup housekeeper disabled");
        None
    };

    let state = AppState {
        database: components.database,
        resolver: components.resolver,
        sweeper: components.sweeper,
    };
    let server = WebServer::new(&config.web, state)?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_token.cancel();
    });

    let result = server.serve_with_cancellation(Some(shutdown.clone())).await;
    shutdown.cancel();
    if let Some(handle) = housekeeper {
        if let Err(e) = handle.await {
            warn!("Cleanup housekeeper did not stop cleanly: {}", e);
        }
    }
    info!("logo-api stopped");
    result
}

/// Everything the service and the one-shot commands share
struct Components {
    database: Database,
    resolver: Arc<ResourceResolver>,
    sweeper: Arc<ExpiredArtifactSweeper>,
}

impl Components {
    async fn build(config: &Config) -> Result<Self> {
        let database = Database::new(&config.database).await?;
        database.migrate().await?;

        let objects = build_object_store(config).await?;
        let (index, queue) = build_cache(config).await?;

        let rasterizer = rasterizer::from_config(&config.rasterizer);
        info!("Rasterizer backend: {}", rasterizer.name());
        let pipeline = Arc::new(RasterizationPipeline::new(rasterizer, config.rasterizer.jpeg_quality));

        let stores = ResolverStores {
            metadata: Arc::new(ResourceSeaOrmRepository::new(database.connection())),
            objects: objects.clone(),
            index: index.clone(),
            queue: queue.clone(),
        };
        let resolver = Arc::new(ResourceResolver::new(
            stores,
            pipeline,
            ResolverSettings::from_config(config),
        ));
        let sweeper = Arc::new(ExpiredArtifactSweeper::new(objects, index, queue));

        Ok(Self {
            database,
            resolver,
            sweeper,
        })
    }
}

async fn build_object_store(config: &Config) -> Result<Arc<dyn ObjectStore>> {
    let settings = &config.object_store;
    Ok(match settings.backend {
        ObjectStoreBackend::Http => {
            let base_url = settings
                .base_url
                .as_deref()
                .context("object_store.base_url is required for the http backend")?;
            info!("Object store: http bucket at {}", base_url);
            Arc::new(HttpObjectStore::new(base_url, settings.auth_token.clone())?)
        }
        ObjectStoreBackend::Local => {
            let store = LocalObjectStore::new(settings.root.clone());
            store
                .ensure_root()
                .await
                .with_context(|| format!("Failed to create object store root {}", settings.root.display()))?;
            info!("Object store: local directory {}", settings.root.display());
            Arc::new(store)
        }
        ObjectStoreBackend::Memory => {
            warn!("Object store: in-memory, artifacts are lost on restart");
            Arc::new(MemoryObjectStore::new())
        }
    })
}

async fn build_cache(config: &Config) -> Result<(Arc<dyn CacheIndex>, Arc<dyn PendingDeletionQueue>)> {
    match config.cache.backend {
        CacheBackend::Redis => {
            let store = Arc::new(
                RedisCacheStore::connect(&config.cache.redis_url, RedisKeys::from_config(&config.cache)).await?,
            );
            Ok((store.clone(), store))
        }
        CacheBackend::Memory => {
            warn!("Cache index: in-memory, mappings are lost on restart");
            let store = Arc::new(MemoryCacheStore::new());
            Ok((store.clone(), store))
        }
    }
}
