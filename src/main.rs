use booksim_api::RestApi;
use booksim_core::{load_catalog, Engine, EngineConfig, RebuildPolicy};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    Static,
    OnMiss,
    PerRequest,
}

impl From<Policy> for RebuildPolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::Static => RebuildPolicy::Static,
            Policy::OnMiss => RebuildPolicy::OnMiss,
            Policy::PerRequest => RebuildPolicy::PerRequest,
        }
    }
}

/// Content-based book recommendation server
#[derive(Parser, Debug)]
#[command(name = "booksim")]
#[command(about = "Recommend similar books over a small REST API", long_about = None)]
struct Args {
    /// Book catalog (Books.csv, a JSON array, or JSON lines with .jsonl/.ndjson)
    #[arg(short, long, default_value = "./data/Books.csv")]
    catalog: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 5000)]
    http_port: u16,

    /// Books sampled into the working corpus
    #[arg(long, default_value_t = 10_000)]
    sample_size: usize,

    /// Vocabulary size of the feature index
    #[arg(long, default_value_t = 3000)]
    max_features: usize,

    /// Rows scored per similarity batch
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// Sampling seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Max titles served by /book-titles
    #[arg(long, default_value_t = 30_000)]
    title_limit: usize,

    /// When to rebuild the corpus with the query forced in
    #[arg(long, value_enum, default_value_t = Policy::OnMiss)]
    rebuild_policy: Policy,

    /// Query-forced sessions kept in memory
    #[arg(long, default_value_t = 32)]
    rebuild_cache_size: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            sample_size: self.sample_size,
            max_features: self.max_features,
            batch_size: self.batch_size,
            seed: self.seed,
            title_limit: self.title_limit,
            rebuild_policy: self.rebuild_policy.into(),
            rebuild_cache_size: self.rebuild_cache_size,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting booksim v{}", env!("CARGO_PKG_VERSION"));
    info!("Catalog: {:?}", args.catalog);
    info!("HTTP API port: {}", args.http_port);

    let config = args.engine_config();
    let catalog = load_catalog(&args.catalog)?;
    let engine = Arc::new(Engine::new(catalog, config)?);
    let stats = engine.stats();
    info!(
        "Recommendation engine initialized: {} of {} books, {} features",
        stats.corpus_size, stats.catalog_size, stats.vocabulary_size
    );

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(engine, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
