//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, one task per connection)
//!     → [net::connection reads and accumulates bytes]
//!     → parser.rs (request line → headers → body)
//!     → request.rs (immutable Request)
//!     → [dispatch layer fans out to handlers]
//! ```

pub mod parser;
pub mod request;
pub mod server;

pub use parser::{
    parse_request, parse_request_with, IncompleteHead, ParseError, ParseOptions, ParseOutcome,
};
pub use request::Request;
pub use server::HttpServer;
