//! Foxhelp Core
//!
//! Host-side model for the foxhelp help plugin: the command tree and its
//! registry, requester sessions, permission checks, the localization
//! catalog, extension-point hooks, statistics and the plugin seam.

pub mod argv;
pub mod command;
pub mod config;
pub mod error;
pub mod hooks;
pub mod locale;
pub mod manifest;
pub mod module;
pub mod permission;
pub mod registry;
pub mod session;
pub mod similarity;
pub mod statistics;

pub use argv::{Argv, OptionValue};
pub use command::{Command, CommandOption, Computed, DynamicUsage, OptionVariant, Scope, Usage};
pub use config::{BotConfig, Config, FormatterConfig, HelpConfig, LocaleConfig, PaginationConfig};
pub use error::{Error, Result};
pub use hooks::{CommandHook, HelpEvents, OptionHook};
pub use locale::{Catalog, Localizer, Params, ShortcutMatch};
pub use manifest::Manifest;
pub use module::{Host, Module, ModuleManager, ModuleResult, NoSuggest, SuggestPrompt, Suggester};
pub use permission::{AuthorityPermissions, PermissionCache, PermissionChecker};
pub use registry::{Registry, Shortcut};
pub use session::{ChannelRecord, FieldObserver, MemoryStore, Session, UserRecord};
pub use statistics::{HelpStatistics, HelpStats, StatsSummary};

/// Re-exports for convenience
pub use async_trait::async_trait;
pub use tracing::{debug, error, info, warn};
