//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → axum::serve (HTTP/1.1, upgrade handshake)
//!     → session.rs (identity, live-session accounting)
//!     → Hand off to http::websocket
//!
//! Session States:
//!     Open → Processing → Open ... → Closed
//! ```

pub mod session;

pub use session::{SessionGuard, SessionId, SessionTracker};
