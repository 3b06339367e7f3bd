//! Application entry point, help output and build information
//!
//! This module holds the root [`App`], the help and version renderers and
//! the parser for build details embedded at compile time.

pub mod app;
pub mod build_info;
pub mod help;

// Re-export main types
pub use app::*;
pub use build_info::*;
pub use help::{render_help, render_version, HelpContext};
