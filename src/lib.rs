//! TCP request sink.
//!
//! Accepts raw TCP connections, incrementally parses one HTTP/1.1 request
//! from each, and hands the request to every registered handler. Nothing is
//! written back; the connection is closed once the request is dispatched or
//! the input is rejected.
//!
//! ```text
//! Listener ─accept─▶ ConnectionHandler ─bytes─▶ parser ─Request─▶ Dispatcher
//!                     (one task each)                          (one task per handler)
//! ```

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::SinkConfig;
pub use dispatch::{Dispatcher, Handler};
pub use http::{HttpServer, ParseOutcome, Request};
pub use lifecycle::Shutdown;
