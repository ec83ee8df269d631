//! Callback contract for completed requests.

use std::sync::Arc;

use crate::http::Request;

/// Receives every request the server finishes parsing.
///
/// Handlers run on the Tokio runtime and should not block. Nothing they
/// return or raise is observed by the connection that produced the request.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: Arc<Request>);
}

impl<F> Handler for F
where
    F: Fn(Arc<Request>) + Send + Sync + 'static,
{
    fn handle(&self, request: Arc<Request>) {
        (self)(request)
    }
}
