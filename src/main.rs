//! Outbound caller - LLM-driven outbound phone calls
//!
//! Places calls through the telephony provider, runs each conversation
//! turn by turn against a chat completion model, and summarizes the call
//! once it completes.

mod api;
mod config;
mod llm;
mod runtime;
mod session;
mod state_machine;
mod system_prompt;
mod telephony;

use api::{create_router, AppState};
use config::ServerConfig;
use runtime::CallRuntime;
use session::SessionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use telephony::WebhookUrls;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outbound_caller=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ServerConfig::from_env();
    tracing::info!(
        port = config.port,
        public_url = %config.public_url,
        telephony = config.twilio.is_some(),
        model = %config.llm.model,
        "Configuration loaded"
    );

    // Collaborators
    let llm = llm::build_service(&config.llm)?;
    let placer = telephony::build_placer(config.twilio.as_ref())?;

    let store = Arc::new(SessionStore::default());
    let runtime = CallRuntime::new(store, llm, placer, WebhookUrls::new(&config.public_url));
    let state = AppState::new(runtime);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Outbound caller listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
