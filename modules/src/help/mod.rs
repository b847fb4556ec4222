//! Help Module
//!
//! Provides the `foxhelp [command]` command: a paged, localized listing of
//! commands and a detail view per command, with shortcut resolution and
//! optional usage statistics.

pub mod formatter;
pub mod paginator;
pub mod resolver;
pub mod visibility;

use foxhelp_core::{
    async_trait, Argv, Command, CommandOption, HelpConfig, HelpEvents, HelpStatistics, Host, Module, ModuleResult,
    Params, Registry, Result, Session, Shortcut,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name the help command is registered under
pub const HELP_COMMAND: &str = "foxhelp";

const MESSAGES: &str = "commands.foxhelp.messages";

/// Per-invocation rendering options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpOptions {
    pub show_hidden: bool,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    pub feedback: bool,
}

impl HelpOptions {
    /// Build from the invocation's flags with configured defaults
    pub fn from_argv(argv: &Argv, config: &HelpConfig) -> Self {
        let default_size = if config.pagination.page_size > 0 {
            config.pagination.page_size
        } else {
            10
        };

        let (page, page_size) = if config.pagination.enabled {
            let page = argv.number("page").filter(|p| *p > 0).map(|p| p as usize).unwrap_or(1);
            let size = argv
                .number("pageSize")
                .filter(|s| *s > 0)
                .map(|s| s as usize)
                .unwrap_or(default_size);
            (page, size)
        } else {
            (1, usize::MAX)
        };

        Self {
            show_hidden: argv.has("showHidden"),
            page,
            page_size,
            feedback: argv.has("feedback"),
        }
    }
}

impl Default for HelpOptions {
    fn default() -> Self {
        Self {
            show_hidden: false,
            page: 1,
            page_size: 10,
            feedback: false,
        }
    }
}

/// Everything a render needs besides the session
pub struct RenderContext<'a> {
    pub host: &'a Host,
    pub config: &'a HelpConfig,
    pub events: &'a HelpEvents,
    pub statistics: &'a HelpStatistics,
}

impl<'a> RenderContext<'a> {
    /// First present key, or an empty string
    pub fn text_or_empty(&self, session: &Session, keys: &[&str], params: &Params) -> String {
        self.host
            .localizer
            .text(&session.locales, keys, params)
            .unwrap_or_default()
    }

    /// A message of the help command; renders the key itself when missing
    pub fn message(&self, session: &Session, name: &str, params: &Params) -> String {
        let key = format!("{}.{}", MESSAGES, name);
        self.host
            .localizer
            .text(&session.locales, &[&key], params)
            .unwrap_or(key)
    }

    /// Localized statistics line, empty when statistics are disabled
    pub fn statistics_text(&self, session: &Session) -> String {
        match self.statistics.summary() {
            Some(summary) => self.message(
                session,
                "statistics",
                &Params::positional([summary.total_usage as usize, summary.distinct_keys]),
            ),
            None => String::new(),
        }
    }
}

/// Observe the user and channel fields the given commands need
pub async fn observe_fields(host: &Host, session: &mut Session, commands: &[&Command]) {
    let Some(observer) = &host.observer else {
        return;
    };

    let mut user_fields: BTreeSet<String> = ["authority".to_string()].into_iter().collect();
    let mut channel_fields = BTreeSet::new();
    for command in commands {
        user_fields.extend(command.user_fields.iter().cloned());
        channel_fields.extend(command.channel_fields.iter().cloned());
    }

    if let Err(e) = observer.observe_user(session, &user_fields).await {
        warn!("Failed to observe user fields: {}", e);
    }
    if !session.is_direct() {
        if let Err(e) = observer.observe_channel(session, &channel_fields).await {
            warn!("Failed to observe channel fields: {}", e);
        }
    }
}

fn enable_help(command: &mut Command) {
    command.add_option(
        CommandOption::parse("help", "-h, --help")
            .hidden(true)
            .desc_path("commands.foxhelp.options.help"),
    );
}

/// The help command module
pub struct HelpModule {
    config: HelpConfig,
    statistics: Arc<HelpStatistics>,
    events: HelpEvents,
}

impl HelpModule {
    pub fn new(config: HelpConfig) -> Self {
        let statistics = Arc::new(HelpStatistics::new(config.statistics));
        Self {
            config,
            statistics,
            events: HelpEvents::new(),
        }
    }

    /// Handle for registering rendering hooks
    pub fn events(&self) -> HelpEvents {
        self.events.clone()
    }

    pub fn statistics(&self) -> Arc<HelpStatistics> {
        self.statistics.clone()
    }

    pub fn config(&self) -> &HelpConfig {
        &self.config
    }

    fn context<'a>(&'a self, host: &'a Host) -> RenderContext<'a> {
        RenderContext {
            host,
            config: &self.config,
            events: &self.events,
            statistics: &self.statistics,
        }
    }

    /// Feedback prompt, with the invite link when configured
    pub fn feedback_text(&self, host: &Host, session: &Session) -> String {
        let ctx = self.context(host);
        let prompt = ctx.message(session, "feedback-prompt", &Params::new());
        match &self.config.invite_group {
            Some(group) => format!(
                "{}\n{}",
                prompt,
                ctx.message(session, "feedback-group", &Params::positional([group]))
            ),
            None => prompt,
        }
    }

    /// Run `foxhelp`; `None` means nothing should be sent
    pub async fn execute(&self, argv: &Argv, session: &mut Session, host: &Host) -> Result<Option<String>> {
        let options = HelpOptions::from_argv(argv, &self.config);
        if options.feedback {
            return Ok(Some(self.feedback_text(host, session)));
        }

        let ctx = self.context(host);
        let target = argv.args.join(" ");
        let target = target.trim();

        let targets = if target.is_empty() {
            Vec::new()
        } else {
            resolver::find_command(&ctx, target, session).commands()
        };
        observe_fields(host, session, &targets).await;

        if target.is_empty() {
            self.statistics.record("global");
            return Ok(Some(formatter::global_help(&ctx, session, &options).await));
        }

        self.statistics.record(target);
        let Some(command) = resolver::infer_command(&ctx, target, session).await else {
            debug!("No command found for help target {:?}", target);
            return Ok(None);
        };

        let subject = format!("command:{}", command.name);
        if !host.permissions.test(&subject, session).await {
            return Ok(Some(ctx.text_or_empty(session, &["internal.low-authority"], &Params::new())));
        }

        Ok(Some(formatter::show_help(&ctx, command, session, &options).await))
    }

    /// Show help instead of running a command invoked with `--help` or without an action
    async fn intercept(&self, argv: &Argv, session: &mut Session, host: &Host) -> Result<ModuleResult> {
        if !host.registry.contains(HELP_COMMAND) {
            return Ok(ModuleResult::NotHandled);
        }
        let Some(command) = host.registry.get(&argv.command) else {
            return Ok(ModuleResult::NotHandled);
        };

        let wants_help = argv.has("help") && command.get_option("help").is_some();
        if !wants_help && command.has_action {
            return Ok(ModuleResult::NotHandled);
        }

        debug!("Showing help for {} instead of executing it", command.name);
        let help = Argv::new(HELP_COMMAND).arg(&command.name);
        let output = self.execute(&help, session, host).await?;
        Ok(ModuleResult::Handled(output))
    }
}

impl Default for HelpModule {
    fn default() -> Self {
        Self::new(HelpConfig::default())
    }
}

#[async_trait]
impl Module for HelpModule {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Shows command listings, usage, options and examples"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    async fn init(&mut self, registry: &mut Registry) -> Result<()> {
        if self.config.options {
            registry.on_command_added(Box::new(enable_help));
        }

        registry.add(
            Command::new(HELP_COMMAND)
                .declaration("[command:string]")
                .authority(0)
                .user_field("authority")
                .option(CommandOption::parse("showHidden", "-H"))
                .option(CommandOption::parse("page", "-p <page:number>"))
                .option(CommandOption::parse("pageSize", "-s <size:number>"))
                .option(CommandOption::parse("feedback", "-f")),
        );

        if self.config.shortcut {
            registry.shortcut(HELP_COMMAND, Shortcut { i18n: true, fuzzy: true });
        }

        info!(
            "Help module initialized for {} commands (statistics {})",
            registry.len(),
            if self.statistics.is_enabled() { "on" } else { "off" }
        );
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<()> {
        self.statistics.reset();
        info!("Help module cleaned up");
        Ok(())
    }

    async fn handle_command(&self, argv: &Argv, session: &mut Session, host: &Host) -> Result<ModuleResult> {
        // `foxhelp -h` describes foxhelp itself
        match self.intercept(argv, session, host).await? {
            ModuleResult::NotHandled if argv.command == HELP_COMMAND => {
                let output = self.execute(argv, session, host).await?;
                Ok(ModuleResult::Handled(output))
            }
            result => Ok(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_argv() {
        let config = HelpConfig::default();
        let argv = Argv::new(HELP_COMMAND).value("page", "3").value("pageSize", "5").flag("showHidden");
        let options = HelpOptions::from_argv(&argv, &config);
        assert_eq!(options.page, 3);
        assert_eq!(options.page_size, 5);
        assert!(options.show_hidden);
        assert!(!options.feedback);
    }

    #[test]
    fn test_options_clamp_invalid_values() {
        let config = HelpConfig::default();
        let argv = Argv::new(HELP_COMMAND).value("page", "0").value("pageSize", "-4");
        let options = HelpOptions::from_argv(&argv, &config);
        assert_eq!(options.page, 1);
        assert_eq!(options.page_size, 10);

        let argv = Argv::new(HELP_COMMAND).value("page", "two");
        assert_eq!(HelpOptions::from_argv(&argv, &config).page, 1);
    }

    #[test]
    fn test_options_without_pagination() {
        let mut config = HelpConfig::default();
        config.pagination.enabled = false;
        let argv = Argv::new(HELP_COMMAND).value("page", "4");
        let options = HelpOptions::from_argv(&argv, &config);
        assert_eq!(options.page, 1);
        assert_eq!(options.page_size, usize::MAX);
    }

    #[test]
    fn test_enable_help_adds_hidden_option() {
        let mut command = Command::new("echo");
        enable_help(&mut command);
        let help = command.get_option("help").unwrap();
        assert!(help.accepts("-h"));
        assert!(help.accepts("--help"));
        assert_eq!(help.config.desc_path.as_deref(), Some("commands.foxhelp.options.help"));
        assert!(help.config.hidden.resolve(&Session::direct("p", "u")));
    }
}
