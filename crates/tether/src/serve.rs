// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tether serve` command implementation.
//!
//! Wires the Telegram channel, OpenID provider, SQLite user store, session
//! engine and callback gateway together, then runs until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tether_config::model::TetherConfig;
use tether_core::{MessageSender, TetherError};
use tether_gateway::{GatewayState, ServerConfig};
use tether_oidc::OidcVerifier;
use tether_session::shutdown;
use tether_session::{
    AuthCorrelator, AuthLinks, CommandTable, Dispatcher, Nonce, SessionRegistry, SessionServices,
};
use tether_storage::SqliteUserStore;
use tether_telegram::TelegramChannel;
use tracing::{error, info, warn};

pub async fn run_serve(config: TetherConfig) -> Result<(), TetherError> {
    init_tracing(&config.agent.log_level);
    info!(name = %config.agent.name, "starting tether");

    let store = Arc::new(SqliteUserStore::open(&config.storage.database_path).await?);
    let verifier = Arc::new(OidcVerifier::discover(&config.oidc).await?);

    let mut channel = TelegramChannel::new(&config.telegram)?;
    let commands = Arc::new(CommandTable::new());
    if let Err(e) = channel.set_commands(&commands.menu()).await {
        warn!(error = %e, "failed to publish command menu");
    }
    channel.connect();
    let channel = Arc::new(channel);

    let registry = SessionRegistry::new();
    let nonce = Arc::new(Nonce::generate());

    let links = AuthLinks::new(
        verifier.authorization_endpoint()?,
        verifier.client_id(),
        config.oidc.redirect_url.clone(),
        config.oidc.scopes.clone(),
        Arc::clone(&nonce),
    );
    let services = SessionServices {
        sender: channel.clone(),
        store,
        commands,
    };
    let correlator = Arc::new(AuthCorrelator::new(
        nonce,
        verifier,
        services,
        registry.clone(),
        config.session.inbox_capacity,
    ));

    let gateway_cancel = tokio_util::sync::CancellationToken::new();
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
        callback_path: config.gateway.callback_path.clone(),
    };
    let gateway_state = GatewayState {
        correlator,
        registry: registry.clone(),
        start_time: std::time::Instant::now(),
    };
    let gateway = {
        let cancel = gateway_cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tether_gateway::start_server(&server_config, gateway_state, cancel).await
            {
                error!(error = %e, "gateway server failed");
            }
        })
    };

    let cancel = shutdown::install_signal_handler();
    let dispatcher = Dispatcher::new(registry.clone(), channel.clone(), links);
    let result = dispatcher.run(channel.as_ref(), cancel).await;

    gateway_cancel.cancel();
    let _ = gateway.await;

    shutdown::drain_sessions(
        &registry,
        Duration::from_secs(config.session.drain_timeout_secs),
    )
    .await;

    info!("tether stopped");
    result
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tether={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
