//! JSON HTTP API for the Streamline front-end

pub mod handlers;
pub mod router;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use streamline_backend::{HistoryAggregator, VcsBackend};
use streamline_core::{DiffReconciler, StreamlineConfig};

/// Shared, read-only state handed to every handler.
pub struct ServerState {
    pub backend: Arc<dyn VcsBackend>,
    pub config: StreamlineConfig,
}

impl ServerState {
    pub fn new(backend: Arc<dyn VcsBackend>, config: StreamlineConfig) -> Self {
        Self { backend, config }
    }

    pub fn reconciler(&self) -> DiffReconciler {
        DiffReconciler::new(&self.config.diff)
    }

    pub fn aggregator(&self) -> HistoryAggregator {
        HistoryAggregator::new(Arc::clone(&self.backend), self.config.history)
    }
}

pub struct StreamlineServer {
    state: Arc<ServerState>,
}

impl StreamlineServer {
    pub fn new(backend: Arc<dyn VcsBackend>, config: StreamlineConfig) -> Self {
        Self {
            state: Arc::new(ServerState::new(backend, config)),
        }
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Bind and serve until the process is stopped.
    pub async fn start(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.state.config.server.host, self.state.config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(
            "Serving {} backend on http://{}",
            self.state.backend.name(),
            listener.local_addr()?
        );

        axum::serve(listener, router::create_router(self.state)).await?;
        Ok(())
    }
}
