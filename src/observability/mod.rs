//! Observability module providing structured logging.
//!
//! Logs are emitted through `tracing` in pretty, compact or JSON form; the
//! filter honours `RUST_LOG` before falling back to configuration.

mod tracing_init;

pub use tracing_init::*;
