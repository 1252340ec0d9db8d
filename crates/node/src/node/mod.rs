use std::time::Duration;

use futures::future::join_all;
use jax_deals::CancellationToken;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

use crate::config::Config;

mod datastore;
mod eth;
mod http;
mod iroh;
mod state;
mod utils;

use self::http::http_server;
use self::iroh::router as iroh_router;
pub use state::{DealClient, State, StateSetupError};

pub struct Node;

impl Node {
    pub async fn spawn(config: &Config) {
        // TODO: conditional text decoration depending on the environment
        let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
        let env_filter = EnvFilter::builder()
            .with_default_directive((*config.log_level()).into())
            .from_env_lossy();

        let stdout_layer = tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(non_blocking_writer)
            .with_filter(env_filter);

        tracing_subscriber::registry().with(stdout_layer).init();

        utils::register_panic_logger();
        utils::report_version();

        let cancel = CancellationToken::new();
        let (graceful_waiter, shutdown_rx) = match utils::graceful_shutdown_blocker(cancel.clone())
        {
            Ok(blocker) => blocker,
            Err(e) => {
                eprintln!("error installing signal handlers: {}", e);
                std::process::exit(2);
            }
        };

        let state = match State::from_config(config, cancel).await {
            Ok(state) => state,
            Err(e) => {
                eprintln!("error creating node state: {}", e);
                std::process::exit(3);
            }
        };

        tracing::info!("managing iroh node id: {}", state.iroh_node_id());
        match state.wallet_address() {
            Some(address) => tracing::info!("funding deals from wallet: {}", address),
            None => tracing::warn!("no wallet configured, proposals will fail"),
        }

        let mut handles = Vec::new();

        let http_state = state.clone();
        let http_rx = shutdown_rx.clone();
        let remote_addr = *config.remote_listen_addr();
        let log_level = *config.log_level();
        let http_handle = tokio::spawn(async move {
            if let Err(e) = http_server(remote_addr, log_level, http_state, http_rx).await {
                tracing::error!("HTTP server error: {}", e);
            }
        });
        handles.push(http_handle);

        let iroh_endpoint = state.endpoint().clone();
        let blobs_service = state.blobs_service().clone();
        let iroh_rx = shutdown_rx.clone();
        let iroh_handle = tokio::spawn(async move {
            if let Err(e) = iroh_router(iroh_endpoint, blobs_service, iroh_rx).await {
                tracing::error!("Iroh router error: {}", e);
            }
        });
        handles.push(iroh_handle);

        let _ = graceful_waiter.await;

        if timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(handles))
            .await
            .is_err()
        {
            tracing::error!(
                "Failed to shut down within {} seconds",
                FINAL_SHUTDOWN_TIMEOUT.as_secs()
            );
            std::process::exit(4);
        }
    }
}
