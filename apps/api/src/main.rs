mod config;
mod db;
mod errors;
mod matching;
mod models;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::matching::cache::ExtractionCache;
use crate::matching::engine::{EngineSettings, MatchEngine};
use crate::matching::taxonomy::{SharedTaxonomy, Taxonomy};
use crate::matching::vocabulary::builtin_taxonomy;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{DocumentStore, InMemoryDocumentStore, PgDocumentStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting skill matcher v{}", env!("CARGO_PKG_VERSION"));

    // Taxonomy: file if configured, built-in vocabulary otherwise
    let taxonomy = load_taxonomy(config.taxonomy_path.as_deref())?;
    info!(
        "Taxonomy loaded: {} skills, {} aliases",
        taxonomy.len(),
        taxonomy.alias_count()
    );

    if taxonomy.is_empty() {
        warn!("Taxonomy has no skills; every job will score 100");
    }

    let engine = Arc::new(MatchEngine::new(
        SharedTaxonomy::new(taxonomy),
        ExtractionCache::new(config.extraction_cache_capacity),
        EngineSettings {
            max_text_bytes: config.max_text_bytes,
        },
    ));

    // Document store: Postgres when configured, in-memory demo data otherwise
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, config.database_max_connections).await?;
            Arc::new(PgDocumentStore::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, serving in-memory demo documents");
            Arc::new(InMemoryDocumentStore::with_demo_data())
        }
    };

    #[cfg(unix)]
    if let Some(path) = config.taxonomy_path.clone() {
        spawn_taxonomy_reloader(engine.clone(), path);
    }

    let state = AppState { engine, store };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn load_taxonomy(path: Option<&Path>) -> Result<Taxonomy> {
    match path {
        Some(path) => {
            info!("Loading taxonomy from {}", path.display());
            Taxonomy::from_json_file(path)
        }
        None => builtin_taxonomy().context("Built-in vocabulary has conflicting aliases"),
    }
}

/// Re-reads the taxonomy file on SIGHUP. A file that fails to load or
/// conflicts is logged and the live taxonomy is kept.
#[cfg(unix)]
fn spawn_taxonomy_reloader(engine: Arc<MatchEngine>, path: std::path::PathBuf) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("SIGHUP handler unavailable, taxonomy reload disabled: {e}");
                return;
            }
        };

        while hangups.recv().await.is_some() {
            let reloaded = Taxonomy::from_json_file(&path)
                .and_then(|t| engine.replace_taxonomy(t).map_err(anyhow::Error::from));
            match reloaded {
                Ok(version) => info!("Taxonomy reloaded from {} as v{version}", path.display()),
                Err(e) => tracing::error!("Taxonomy reload failed, keeping current: {e:#}"),
            }
        }
    });
}
