//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept loop)
//!     → connection.rs (read/accumulate/parse loop, state machine)
//!     → Hand off to dispatch layer
//!
//! Connection States:
//!     Reading → Dispatching | Aborted → Closed
//! ```
//!
//! # Design Decisions
//! - One task per connection, no connection limit
//! - One request per connection; the socket is dropped afterwards
//! - Nothing is ever written back to the peer

pub mod connection;
pub mod listener;

pub use connection::{ConnectionError, ConnectionHandler, ConnectionOutcome};
pub use listener::{Listener, ListenerError};
