pub mod api;
pub mod config;
pub mod core_state;
pub mod models;
pub mod pipeline;
pub mod session_store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::CoreState;

pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // The blocking generation client must be built outside the async runtime.
    let core = match CoreState::from_config(config) {
        Ok(core) => Arc::new(core),
        Err(e) => {
            tracing::error!("Startup failed: {e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Cannot start async runtime: {e}");
            std::process::exit(1);
        }
    };

    // `core` outlives the runtime, so the last drop happens on this thread.
    let served = Arc::clone(&core);
    let result = runtime.block_on(async move {
        if !served.config.mock_mode {
            let warm = Arc::clone(&served);
            tokio::task::spawn_blocking(move || warm.warm_up());
        }
        api::serve(served).await
    });
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
