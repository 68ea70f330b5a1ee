//! TCP Server
//!
//! Accepts connections and runs each exchange on its own task.
//!
//! Connection tasks live in a [`JoinSet`] so shutdown can stop accepting,
//! wait for in-flight exchanges, and abort whatever is still running once
//! the drain timeout passes.

use crate::config::ServerConfig;
use crate::connection::{handle_connection, ConnectionStats, RequestHandler};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// How shutdown went for the connections that were still open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Tasks that finished within the drain timeout
    pub completed: usize,
    /// Tasks aborted when the drain timeout passed
    pub aborted: usize,
}

/// A bound listener plus everything needed to serve it.
pub struct Server<H> {
    listener: TcpListener,
    config: ServerConfig,
    handler: H,
    stats: Arc<ConnectionStats>,
}

impl<H> Server<H>
where
    H: RequestHandler + Clone,
{
    /// Binds the listener described by `config`.
    pub async fn bind(config: ServerConfig, handler: H) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        info!(addr = %listener.local_addr()?, "Listening");

        Ok(Self {
            listener,
            config,
            handler,
            stats: Arc::new(ConnectionStats::new()),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Statistics shared by every connection this server spawns.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts connections until `shutdown` resolves, then drains.
    ///
    /// Accept errors are logged and accepting continues. After the signal,
    /// in-flight exchanges get `drain_timeout` to finish before being aborted.
    pub async fn run_until<F>(self, shutdown: F) -> DrainSummary
    where
        F: Future<Output = ()>,
    {
        let limits = self.config.exchange_limits();
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        tasks.spawn(handle_connection(
                            stream,
                            addr,
                            self.handler.clone(),
                            limits,
                            Arc::clone(&self.stats),
                        ));
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                    }
                }
            }

            // Reap finished exchanges so the set only holds live ones.
            while let Some(result) = tasks.try_join_next() {
                report_task(result);
            }
        }

        drain(tasks, self.config.drain_timeout).await
    }
}

async fn drain(mut tasks: JoinSet<()>, timeout: std::time::Duration) -> DrainSummary {
    let in_flight = tasks.len();
    if in_flight == 0 {
        return DrainSummary::default();
    }
    info!(in_flight, "Waiting for in-flight connections");

    let mut completed = 0;
    let finished = tokio::time::timeout(timeout, async {
        while let Some(result) = tasks.join_next().await {
            report_task(result);
            completed += 1;
        }
    })
    .await;

    if finished.is_ok() {
        return DrainSummary {
            completed,
            aborted: 0,
        };
    }

    let aborted = tasks.len();
    warn!(aborted, "Drain timed out, aborting remaining connections");
    tasks.abort_all();
    while tasks.join_next().await.is_some() {}

    DrainSummary { completed, aborted }
}

fn report_task(result: Result<(), JoinError>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_panic() => error!(error = %e, "Connection task panicked"),
        Err(e) => debug!(error = %e, "Connection task cancelled"),
    }
}
