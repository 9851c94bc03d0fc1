//! Mail threading library
//!
//! Rebuilds conversation trees from flat lists of mail messages. The core is
//! `threading::ThreadBuilder`; the other modules load messages from disk and
//! carry configuration.

pub mod config;
pub mod envelope;
pub mod error;
pub mod mailbox;
pub mod threading;

use env_logger::Env;
use std::sync::Once;

pub use config::ThreadingConfig;
pub use error::ThreadingError;
pub use threading::{Message, ThreadBuilder, ThreadNode, build_threads};

static LOGGER: Once = Once::new();

/// Initialize `env_logger` once; `RUST_LOG` overrides the default `info` filter.
pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(Env::default().default_filter_or("info"))
            .format_timestamp(None)
            .init();
    });
}
