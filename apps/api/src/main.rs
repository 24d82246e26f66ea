use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::build_notifier;
use performance_cell::{build_listing_cache, spawn_sweeper};
use shared_config::{AppConfig, StorageBackend};
use shared_database::{InMemoryStore, SchedulingStore, SupabaseStore};

fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn SchedulingStore>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageBackend::Supabase => {
            if config.supabase_url.is_empty() || config.supabase_service_key.is_empty() {
                anyhow::bail!("STORAGE_BACKEND=supabase requires SUPABASE_URL and SUPABASE_SERVICE_KEY");
            }
            info!("Using Supabase storage at {}", config.supabase_url);
            Ok(Arc::new(SupabaseStore::new(config)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic scheduling API server");

    let config = Arc::new(AppConfig::from_env());

    let store = build_store(&config)?;
    let cache = build_listing_cache(&config);
    let sweeper = spawn_sweeper(Arc::clone(&cache), config.listing_cache_sweep_interval);
    if !config.is_mail_relay_configured() {
        warn!("MAIL_RELAY_URL not set, booking confirmations will only be logged");
    }
    let notifier = build_notifier(&config).context("failed to build mail relay client")?;

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(Arc::clone(&config), store, cache, notifier)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await
        .context("server error")?;

    sweeper.abort();
    Ok(())
}
