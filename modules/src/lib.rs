//! Foxhelp Modules
//!
//! Plugins built on foxhelp-core. Currently this is the help module.

pub mod help;

pub use help::formatter::{apply_formatter, global_help, show_help};
pub use help::paginator::PageWindow;
pub use help::resolver::{find_command, infer_command, Candidate, Resolution};
pub use help::{observe_fields, HelpModule, HelpOptions, RenderContext, HELP_COMMAND};
