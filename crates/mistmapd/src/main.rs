//! Mistmap daemon binary.
//!
//! Wires together the document store, world state, auth guard, and the
//! gateway server, then serves until terminated.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `mistmap-config.yaml`
//! 3. Load the moderator's shared secret from the key file
//! 4. Open the YAML document store over the worlds root
//! 5. Assemble the application state
//! 6. Serve

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use mistmap_gateway::{AppConfig, AppState, AuthGuard, ServerConfig, start_server};
use mistmap_store::{DocumentStore, YamlStore};
use mistmap_world::WorldState;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Config file looked up relative to the working directory.
const CONFIG_FILE: &str = "mistmap-config.yaml";

/// Application entry point for the Mistmap daemon.
///
/// # Errors
///
/// Returns an error if configuration, the secret file, or the network
/// bind fails. A missing config file is not an error; defaults apply.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration first so its log level can seed the filter,
    //    but fall back to defaults when the file is absent.
    let config = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(true)
        .init();

    info!("mistmapd starting");
    info!(
        host = config.server.host,
        port = config.server.port,
        worlds_root = config.storage.worlds_root,
        "configuration loaded"
    );

    // 3. Load the moderator's shared secret.
    let auth = AuthGuard::from_key_file(Path::new(&config.auth.secret_file))
        .with_context(|| format!("failed to read secret file {:?}", config.auth.secret_file))?;
    info!(secret_file = config.auth.secret_file, "shared secret loaded");

    // 4. Open the document store. No world is active until a controller
    //    selects one.
    let store: Arc<dyn DocumentStore> = Arc::new(YamlStore::new(&config.storage.worlds_root));
    let world = WorldState::new(Arc::clone(&store));

    // 5. Assemble shared state.
    let state = AppState::new(world, auth, config.storage.worlds_root.clone().into());

    // 6. Serve until terminated.
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    start_server(&server_config, state)
        .await
        .context("gateway server failed")?;

    info!("mistmapd shutdown complete");
    Ok(())
}

/// Load the gateway configuration from `mistmap-config.yaml`.
///
/// Environment overrides still apply when the file is missing.
fn load_config() -> anyhow::Result<AppConfig> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        AppConfig::from_file(path).with_context(|| format!("failed to load {CONFIG_FILE}"))
    } else {
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}
