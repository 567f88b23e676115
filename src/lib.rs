//! WebSocket to HTTP bridge library.
//!
//! Every text message a client sends over a WebSocket becomes one HTTP
//! request to a fixed backend; the backend's response body comes back as one
//! text message on the same connection.

pub mod backend;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use backend::{BackendCaller, CallError, TargetConfig};
pub use config::BridgeConfig;
pub use http::BridgeServer;
pub use lifecycle::Shutdown;
