mod compose;
mod config;
mod content;
mod errors;
mod layout;
mod render;
mod routes;
mod state;
mod text;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::render::FontCapability;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pdfgen v{}", env!("CARGO_PKG_VERSION"));

    // The probe is repeated per request; this only reports the startup state.
    let capability = FontCapability::probe(config.emoji_font_path.as_deref());
    info!(
        emoji_font = ?capability.emoji_font,
        preserve_emoji = capability.preserve_emoji,
        "Emoji font probe"
    );

    let state = AppState::new(config.clone());
    info!(
        title = %state.settings.document_title,
        max_body_bytes = config.max_body_bytes,
        "Document settings loaded"
    );

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
