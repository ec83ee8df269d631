//! Ordered handler list and fan-out.

use std::sync::Arc;

use crate::dispatch::handler::Handler;
use crate::http::Request;

/// Holds the registered handlers and fans each request out to all of them.
///
/// Must be fully populated before the server starts accepting. Once shared
/// with connection tasks it is only ever read.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: Vec<Arc<dyn Handler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler. Handlers are spawned in registration order, but
    /// nothing orders their execution.
    pub fn register<H: Handler>(&mut self, handler: H) {
        self.handlers.push(Arc::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Spawn one detached task per handler and return immediately.
    ///
    /// Must be called from within a Tokio runtime. Returns the number of
    /// tasks spawned.
    pub fn dispatch(&self, request: Request) -> usize {
        let request = Arc::new(request);

        for handler in &self.handlers {
            let handler = Arc::clone(handler);
            let request = Arc::clone(&request);
            tokio::spawn(async move {
                handler.handle(request);
            });
        }

        self.handlers.len()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
