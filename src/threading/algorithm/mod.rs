//! Email threading algorithm implementation
//!
//! ## Main Entry Point
//!
//! Use `ThreadBuilder::build()` (or `build_threads()`) to thread a list of
//! messages.

mod cycle_detection;
mod jwz_threading;
mod pruning;
mod tree_traversal;

pub use cycle_detection::would_create_cycle;
pub use jwz_threading::{ThreadBuilder, build_threads};
pub use pruning::{PruneStats, prune_placeholders};
pub use tree_traversal::{collect_thread_members, find_first_real_message};
