//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! HttpServer::handle_request (before run)
//!     → dispatcher.rs (ordered handler list)
//!     → frozen into Arc<Dispatcher> when the server starts
//!
//! Per completed request:
//!     connection task → Dispatcher::dispatch
//!     → one spawned task per handler (fire-and-forget)
//! ```
//!
//! # Design Decisions
//! - Registration takes `&mut`, running takes ownership: no lock is needed
//!   and late registration does not type-check
//! - Handlers share one `Arc<Request>`
//! - Join handles are dropped; a panicking handler only loses its own task

pub mod dispatcher;
pub mod handler;

pub use dispatcher::Dispatcher;
pub use handler::Handler;
