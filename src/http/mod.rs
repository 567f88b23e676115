//! HTTP/WebSocket protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, upgrade handshake)
//!     → websocket.rs (per-connection read → call → write loop)
//!     → backend::BackendCaller (one HTTP call per text message)
//!     → reply text frame to client
//! ```

pub mod server;
pub mod websocket;

pub use server::{AppState, BridgeServer};
pub use websocket::{Session, SessionEnd};
