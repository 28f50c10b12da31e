use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use axum::http::HeaderValue;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use shared_config::{AppConfig, DatabaseBackend};
use shared_database::{MemoryStore, Store, SupabaseStore};
use shared_models::{Role, User};
use shared_utils::password::hash_password;
use shared_utils::AppState;

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

    info!("Starting MediConnect API server");

    let config = AppConfig::from_env();
    if config.jwt_secret.is_empty() {
        bail!("JWT_SECRET must be set");
    }

    let store = open_store(&config).await?;
    seed_admin(&config, store.as_ref()).await?;

    let cors = cors_layer(&config);
    let port = config.port;
    let state = Arc::new(AppState::new(config, store));

    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    match config.database_backend {
        DatabaseBackend::Memory => {
            warn!("Using in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseBackend::Supabase => {
            if !config.is_supabase_configured() {
                bail!("SUPABASE_URL and SUPABASE_SERVICE_KEY must be set for the supabase backend");
            }
            let store = SupabaseStore::new(config).context("failed to build supabase client")?;
            store.ping().await.context("supabase is unreachable")?;
            info!("Connected to supabase at {}", config.supabase_url);
            Ok(Arc::new(store))
        }
    }
}

/// Creates the configured admin account unless its email is already taken.
async fn seed_admin(config: &AppConfig, store: &dyn Store) -> anyhow::Result<()> {
    let Some((name, email, password)) = config.admin_seed() else {
        return Ok(());
    };

    if let Some(existing) = store.find_user_by_email(&shared_models::user::normalize_email(email)).await? {
        if existing.role != Role::Admin {
            warn!("Admin seed email {} belongs to a {}", existing.email, existing.role);
        }
        return Ok(());
    }

    let hash = hash_password(password).map_err(|e| anyhow::anyhow!("failed to hash admin password: {}", e))?;
    let admin = store.insert_user(User::new(name, email, hash, Role::Admin)).await?;
    info!("Seeded admin user {}", admin.email);
    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
