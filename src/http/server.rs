//! Request sink server.
//!
//! # Responsibilities
//! - Collect handler registrations before startup
//! - Freeze the handler list and share it with every connection task
//! - Run the accept loop, one task per connection, no limit
//! - Stop accepting on shutdown and give open connections a bounded drain

use std::future::Future;
use std::sync::Arc;

use crate::config::SinkConfig;
use crate::dispatch::{Dispatcher, Handler};
use crate::net::connection::{ConnectionHandler, ConnectionTracker};
use crate::net::{Listener, ListenerError};

/// Accepts TCP connections and turns each into at most one dispatched request.
///
/// Handlers must be registered with [`HttpServer::handle_request`] before
/// [`HttpServer::run`] is called; `run` takes ownership, so the handler list
/// cannot change once connections are being served.
pub struct HttpServer {
    config: SinkConfig,
    dispatcher: Dispatcher,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a new server with the given configuration and no handlers.
    pub fn new(config: SinkConfig) -> Self {
        Self {
            config,
            dispatcher: Dispatcher::new(),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Register a handler to be invoked for every completed request.
    pub fn handle_request<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.dispatcher.register(handler);
        self
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.dispatcher.len()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Bind `listener.bind_address` from the config and serve until
    /// `shutdown` resolves. A bind failure is returned before any connection
    /// is accepted.
    pub async fn start<F>(self, shutdown: F) -> Result<(), ListenerError>
    where
        F: Future<Output = ()>,
    {
        let listener = Listener::bind(&self.config.listener).await?;
        self.run(listener, shutdown).await;
        Ok(())
    }

    /// Run the accept loop on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: Listener, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let dispatcher = Arc::new(self.dispatcher);
        let connection_config = Arc::new(self.config.connection);
        let tracker = self.tracker;

        match listener.local_addr() {
            Ok(addr) => tracing::info!(
                address = %addr,
                handlers = dispatcher.len(),
                "Request sink started"
            ),
            Err(e) => tracing::warn!(error = %e, "Request sink started on unknown address"),
        }

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((mut stream, peer_addr)) => {
                        let guard = tracker.track();
                        let mut handler = ConnectionHandler::new(
                            guard.id(),
                            Arc::clone(&connection_config),
                            Arc::clone(&dispatcher),
                        )
                        .with_peer_addr(peer_addr);

                        tokio::spawn(async move {
                            let _guard = guard;
                            handler.run(&mut stream).await;
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Accept failed");
                    }
                },
            }
        }

        drop(listener);

        let drain = connection_config.read_timeout();
        if tokio::time::timeout(drain, tracker.wait_idle()).await.is_err() {
            tracing::warn!(
                active = tracker.active_count(),
                "Connections still open after drain timeout"
            );
        }

        tracing::info!("Request sink stopped");
    }
}
