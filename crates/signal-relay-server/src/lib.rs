//! signal-relay server library
//!
//! A WebSocket relay that brokers WebRTC negotiation between publishers and
//! subscribers. The relay never sees media: it hands out publisher
//! identities, forwards offers, answers and ICE candidates between the right
//! pair of connections, and forgets a connection's identities when it closes.

pub mod api;
pub mod error;
pub mod signaling;
pub mod state;
pub mod ws;

use std::future::Future;

pub use error::{RelayError, Result};
pub use state::{AppState, Config};

/// Create and configure the server application
pub fn create_app(config: Config) -> axum::Router {
    let app_state = AppState::new(config);
    api::create_router(app_state)
}

/// Bind `config.bind_address` and serve until `shutdown` resolves.
pub async fn serve(
    config: Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, create_app(config))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
