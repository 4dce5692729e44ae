// SPDX-License-Identifier: MIT

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use shellgate::collab::defaults::{BearerAuthorizer, InMemoryPersistence, LoggingAlerter, UnconfiguredContainerPlatform};
use shellgate::collab::Collaborators;
use shellgate::config::{init_tracing, Config};
use shellgate::transport::{build_router, Store};

#[tokio::main]
async fn main() {
    let config = Config::parse();
    init_tracing(&config);

    let platform = Arc::new(UnconfiguredContainerPlatform);
    let collab = Collaborators {
        authorizer: Arc::new(BearerAuthorizer::new(config.auth_token.clone())),
        discovery: platform.clone(),
        runtime: platform,
        alerter: Arc::new(LoggingAlerter),
        persistence: Arc::new(InMemoryPersistence::new()),
    };

    let shutdown = CancellationToken::new();
    let store = Store::new(collab, Arc::new(config.clone()), shutdown.clone());
    let router = build_router(store);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(address = %addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(address = %addr, "shellgate listening");

    {
        let sd = shutdown.clone();
        tokio::spawn(async move {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
                _ = async {
                    if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
                } => info!("received SIGTERM"),
            }
            sd.cancel();
        });
    }

    let result = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.cancelled_owned())
    .await;

    if let Err(e) = result {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
