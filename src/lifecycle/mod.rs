//! Application lifecycle.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → init logging/metrics → build connector → Started
//!
//! Running:
//!     Active while calls are outstanding
//!
//! Shutdown (signals.rs → shutdown.rs):
//!     SIGTERM/SIGINT → Terminating → cancel_all() → Terminated
//! ```

pub mod events;
pub mod shutdown;
pub mod signals;

pub use events::LifecycleEvent;
pub use shutdown::Shutdown;
