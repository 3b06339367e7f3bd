//! Command tree dispatch
//!
//! This module holds the command tree, the per-level dispatch loop and
//! the context handed to user actions.

pub mod command;
pub mod context;

// Re-export main types
pub use command::*;
pub use context::*;
