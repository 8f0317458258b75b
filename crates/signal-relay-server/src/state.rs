use crate::error::Result;
use crate::signaling::{LifecycleManager, NegotiationRouter, PublisherDirectory};
use crate::ws::ConnectionRegistry;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3011";
const CONFIG_FILE: &str = "signal-relay";
const ENV_PREFIX: &str = "SIGNAL_RELAY";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub bind_address: String,
    /// Directory served at `/` for a browser client; nothing is served when unset.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Defaults, then `signal-relay.toml` (or the file named by
    /// `SIGNAL_RELAY_CONFIG`) if present, then `SIGNAL_RELAY_*` variables.
    pub fn load() -> Result<Self> {
        let file = std::env::var(format!("{}_CONFIG", ENV_PREFIX))
            .unwrap_or_else(|_| CONFIG_FILE.to_string());

        let config = config::Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .add_source(config::File::with_name(&file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            static_dir: None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub connections: Arc<ConnectionRegistry>,
    pub directory: Arc<PublisherDirectory>,
    pub router: NegotiationRouter,
    pub lifecycle: LifecycleManager,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let connections = Arc::new(ConnectionRegistry::new());
        let directory = Arc::new(PublisherDirectory::new());
        let router = NegotiationRouter::new(connections.clone(), directory.clone());
        let lifecycle = LifecycleManager::new(connections.clone(), directory.clone());

        Self {
            config,
            connections,
            directory,
            router,
            lifecycle,
        }
    }
}
