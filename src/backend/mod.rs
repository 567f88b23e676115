//! Backend subsystem: the fixed HTTP target and the calls made to it.
//!
//! # Data Flow
//! ```text
//! text message payload
//!     → caller.rs (build request from target.rs, send, read body)
//!     → Ok(body) | Err(CallError tagged with the failed phase)
//! ```

pub mod caller;
pub mod target;

pub use caller::{BackendCaller, CallError, CallPhase};
pub use target::TargetConfig;
