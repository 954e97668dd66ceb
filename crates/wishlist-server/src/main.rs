mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use wishlist_api::auth::{AppState, AppStateInner};
use wishlist_api::mail::Mailer;
use wishlist_core::FulfillmentPolicy;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wishlist=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = wishlist_db::Database::open(&config.db_path)?;

    let mailer = match config.mail {
        Some(mail) => {
            info!("Mailing verification codes through {}", mail.endpoint);
            Mailer::http(mail)
        }
        None => {
            warn!("No mail provider configured; verification codes will be logged");
            Mailer::Log
        }
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret,
        mailer,
        policy: FulfillmentPolicy {
            strict_interest: config.strict_interest,
        },
    });

    let app = wishlist_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Wishlist server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
