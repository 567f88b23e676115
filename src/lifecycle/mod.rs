//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Target + BackendCaller → metrics → bind → serve
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT or Shutdown::trigger → stop accepting → exit
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
