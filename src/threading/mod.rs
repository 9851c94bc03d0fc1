//! Email threading module
//!
//! Reconstructs conversation trees from a flat list of messages, each carrying
//! its Message-ID, subject and References chain. Based on the JWZ (Jamie
//! Zawinski) algorithm from https://www.jwz.org/doc/threading.html.
//!
//! ## Threading Strategy
//!
//! 1. **References**: The primary method. Adjacent ids in each chain become
//!    parent-child links; ids never supplied become placeholders.
//! 2. **Subject**: Fallback for roots whose replies arrived without headers.
//!    Roots sharing a subject (ignoring `Re:`/`Fwd:`) are merged.
//!
//! Malformed input (cycles, self references, duplicate ids, dangling
//! references) is never an error.
//!
//! ## Module Structure
//!
//! - `container`: Arena of containers and the output `ThreadNode`
//! - `algorithm`: Linking, cycle detection, pruning and traversal
//! - `subject_matching`: Subject normalization and subject grouping

pub mod algorithm;
pub mod container;
pub mod subject_matching;

// Re-export main types and functions
pub use algorithm::{ThreadBuilder, build_threads, collect_thread_members, find_first_real_message};
pub use container::{Message, ThreadNode};
pub use subject_matching::{has_reply_marker, normalize_subject};
