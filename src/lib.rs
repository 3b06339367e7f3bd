//! Clitree - declarative command trees for command-line programs
//!
//! An application declares a tree of commands, each with its own flags,
//! bound to typed storage cells. A run matches argv level by level,
//! fills the bound values and invokes the action of the deepest matched
//! command behind a failure boundary.

// Public modules
pub mod cli;
pub mod commandline;
pub mod error;
pub mod flag;
pub mod runner;
pub mod value;

// Re-export commonly used types
pub use cli::{App, BuildInfo};
pub use commandline::{CommandLine, Matched};
pub use error::{CliError, ParseError, Result, ValueError};
pub use flag::Flag;
pub use runner::{Command, Context, Exit};
pub use value::{Destination, FlagValue, IpMask, IpNet, Slot, Value};

/// Current version of Clitree
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
