use anyhow::Context;
use fundgraph::{
    api, config::Config, db::init_db, ContractContexts, ContractReader, EventSource, Indexer,
    JsonlEventSource, Repository, RpcContractReader,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let pool = init_db(&config.database_path)
        .await
        .with_context(|| format!("failed to initialize database at {}", config.database_path))?;
    let repo = Arc::new(Repository::new(pool));

    let contexts = match &config.contract_context_file {
        Some(path) => ContractContexts::load(path)
            .await
            .with_context(|| format!("failed to load contract contexts from {}", path.display()))?,
        None => ContractContexts::new(),
    };
    tracing::info!(contexts = contexts.len(), "Contract contexts loaded");

    let source: Arc<dyn EventSource> = Arc::new(JsonlEventSource::new(config.events_path.clone()));
    let reader: Arc<dyn ContractReader> = Arc::new(RpcContractReader::new(config.rpc_url.clone()));
    let indexer = Indexer::new(source, reader, Arc::new(contexts), repo.clone())
        .with_policy(config.integrity_policy)
        .with_batch_size(config.batch_size)
        .with_poll_interval(Duration::from_millis(config.poll_interval_ms));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut indexer_task = tokio::spawn(async move { indexer.run(shutdown_rx).await });

    let app = api::create_router(api::AppState::new(repo));
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    // The server keeps serving reads until the indexer halts or ctrl-c.
    tokio::select! {
        served = axum::serve(listener, app).into_future() => {
            served.context("server error")?;
            return Ok(());
        }
        indexed = &mut indexer_task => {
            return indexed.context("indexer task panicked")?.context("indexer halted");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            let _ = shutdown_tx.send(true);
        }
    }

    indexer_task
        .await
        .context("indexer task panicked")?
        .context("indexer halted")?;
    Ok(())
}
