//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (connection_id, peer_addr)
//!     → logging.rs installs the subscriber that formats them
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than interpolated messages
//! - `RUST_LOG` overrides the configured filter

pub mod logging;

pub use logging::init_logging;
