//! AgentAds: sponsored-unit decision service for conversational agents.
//!
//! Main entry point that wires the decision engine to its collaborators and
//! starts the HTTP and metrics servers.

use agentads_analytics::TracingSink;
use agentads_api::ApiServer;
use agentads_core::collaborators::{DecisionSink, NoSimilarity, SimilaritySearch};
use agentads_core::config::AppConfig;
use agentads_engine::embedding::create_embedder;
use agentads_engine::semantic::{SemanticSearch, VectorIndex};
use agentads_engine::{DecisionEngine, DecisionService, InMemoryCandidateStore};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "agentads")]
#[command(about = "Sponsored-unit decision service for conversational agents")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "AGENTADS_CONFIG")]
    config: Option<String>,

    /// Node identifier (overrides config)
    #[arg(long, env = "AGENTADS__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "AGENTADS__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "AGENTADS__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// JSON file of campaigns and ad units to serve (overrides config)
    #[arg(long, env = "AGENTADS__STORE__SEED_PATH")]
    seed: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentads=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("AgentAds starting up");

    let mut config = match (AppConfig::load(cli.config.as_deref()), &cli.config) {
        (Ok(config), _) => config,
        (Err(e), Some(path)) => {
            error!(error = %e, path = %path, "Failed to load config file");
            return Err(e.into());
        }
        (Err(e), None) => {
            warn!(error = %e, "Failed to load config from environment, using defaults");
            AppConfig::default()
        }
    };

    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(seed) = cli.seed {
        config.store.seed_path = Some(seed);
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        taxonomy_version = %config.taxonomy.version,
        "Configuration loaded"
    );

    let store = match &config.store.seed_path {
        Some(path) => InMemoryCandidateStore::load(path)?,
        None => {
            warn!("No seed file configured, serving from an empty store");
            InMemoryCandidateStore::new()
        }
    };
    let store = Arc::new(store);

    let index = Arc::new(VectorIndex::new());
    let indexed = store.index_embeddings(&index);
    let similarity: Arc<dyn SimilaritySearch> = if config.embedding.provider == "disabled" {
        info!("Semantic matching disabled, taxonomy matching only");
        Arc::new(NoSimilarity)
    } else {
        let embedder = create_embedder(&config.embedding)?;
        info!(indexed = indexed, "Semantic index built");
        Arc::new(SemanticSearch::new(embedder, index, &config.embedding))
    };

    let sink: Arc<dyn DecisionSink> =
        match agentads_analytics::create_sink(&config.clickhouse).await {
            Ok(sink) => sink,
            Err(e) => {
                error!(
                    error = %e,
                    "Failed to connect to ClickHouse, decision records go to the log"
                );
                Arc::new(TracingSink)
            }
        };

    let engine = Arc::new(DecisionEngine::from_config(&config)?);
    let service = Arc::new(DecisionService::new(engine, store, similarity, sink));

    let api_server = ApiServer::new(config.clone(), service);

    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("AgentAds is ready to serve traffic");

    api_server.start_http().await?;

    Ok(())
}
