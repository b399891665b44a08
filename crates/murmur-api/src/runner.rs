//! `murmur run`: start every task and shut them down together.

use std::sync::Arc;
use std::time::Duration;

use murmur_core::queue::run_reply_worker;
use murmur_infra::atproto::AuthSession;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::http::router::build_router;
use crate::state::Services;

/// Run the service until a shutdown signal or a fatal feed error.
///
/// The consumer flushes its cursor on the way out; a reply turn still in
/// flight is abandoned.
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let Services {
        config,
        app_state,
        auth,
        sessions,
        consumer,
        replies,
    } = Services::init(&args).await?;

    let cancel = CancellationToken::new();

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            cancel.cancel();
        }
    });

    let worker = tokio::spawn(run_reply_worker(replies, sessions, cancel.clone()));
    let refresher = tokio::spawn(refresh_session(auth, config.session_refresh(), cancel.clone()));

    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    info!(addr = %args.addr, "tool endpoints listening");
    let server = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            axum::serve(listener, build_router(app_state))
                .with_graceful_shutdown(async move { cancel.cancelled().await })
                .await
        }
    });

    let result = consumer.run(cancel.clone()).await;
    if let Err(e) = &result {
        error!(error = %e, "event consumer stopped");
    }
    cancel.cancel();

    let (worker, refresher, server) = tokio::join!(worker, refresher, server);
    worker?;
    refresher?;
    server??;

    info!("murmur stopped");
    result.map_err(anyhow::Error::from)
}

/// Refresh the PDS session on a fixed interval until cancelled.
///
/// A failed refresh is logged; the next tick tries again.
async fn refresh_session(auth: Arc<AuthSession>, every: Duration, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + every, every);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = auth.refresh().await {
                    error!(error = %e, "failed to refresh pds session");
                }
            }
        }
    }
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
