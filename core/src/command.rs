//! Command tree model
//!
//! Commands are owned by the [`Registry`](crate::Registry). Subcommands use
//! dotted names (`admin.ban`); the registry links them to their parent.

use crate::locale::Params;
use crate::session::Session;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A flag that is either fixed or evaluated per session
#[derive(Clone)]
pub enum Computed {
    Value(bool),
    Dynamic(Arc<dyn Fn(&Session) -> bool + Send + Sync>),
}

impl Computed {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Session) -> bool + Send + Sync + 'static,
    {
        Computed::Dynamic(Arc::new(f))
    }

    pub fn resolve(&self, session: &Session) -> bool {
        match self {
            Computed::Value(value) => *value,
            Computed::Dynamic(f) => f(session),
        }
    }
}

impl Default for Computed {
    fn default() -> Self {
        Computed::Value(false)
    }
}

impl From<bool> for Computed {
    fn from(value: bool) -> Self {
        Computed::Value(value)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Computed::Value(value) => write!(f, "Computed::Value({})", value),
            Computed::Dynamic(_) => write!(f, "Computed::Dynamic(..)"),
        }
    }
}

/// Usage text computed for each session
#[async_trait]
pub trait DynamicUsage: Send + Sync {
    async fn usage(&self, session: &Session) -> String;
}

/// Usage attached to a command
#[derive(Clone)]
pub enum Usage {
    Text(String),
    Dynamic(Arc<dyn DynamicUsage>),
}

impl fmt::Debug for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Usage::Text(text) => write!(f, "Usage::Text({:?})", text),
            Usage::Dynamic(_) => write!(f, "Usage::Dynamic(..)"),
        }
    }
}

/// Where a command may be used
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Scope {
    #[default]
    Any,
    DirectOnly,
    GuildOnly,
    Platforms(Vec<String>),
}

impl Scope {
    pub fn matches(&self, session: &Session) -> bool {
        match self {
            Scope::Any => true,
            Scope::DirectOnly => session.is_direct(),
            Scope::GuildOnly => !session.is_direct(),
            Scope::Platforms(platforms) => platforms.iter().any(|p| p == &session.platform),
        }
    }
}

/// One renderable form of an option
#[derive(Debug, Clone, Default)]
pub struct OptionVariant {
    /// Syntax as shown to users, e.g. `-p, --page <page>`
    pub syntax: String,
    /// Minimum authority required to see it
    pub authority: u32,
    pub hidden: Computed,
    /// Explicit localization key for the description
    pub desc_path: Option<String>,
    pub params: Params,
}

/// An option declared on a command
#[derive(Debug, Clone)]
pub struct CommandOption {
    pub name: String,
    /// Accepted flags, e.g. `-p` and `--page`
    pub flags: Vec<String>,
    /// Name of the value placeholder, when the option takes one
    pub value_name: Option<String>,
    pub config: OptionVariant,
    /// Set when the option only exists through its variants
    pub fixed_value: bool,
    /// Named variants in declaration order
    pub variants: Vec<(String, OptionVariant)>,
}

impl CommandOption {
    /// Parse an option from its syntax, e.g. `-p <page:number>`
    pub fn parse(name: &str, syntax: &str) -> Self {
        let mut flags = Vec::new();
        let mut value_name = None;

        for token in syntax.split(|c: char| c == ',' || c.is_whitespace()) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if token.starts_with('-') {
                flags.push(token.to_string());
            } else if let Some(inner) = token
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .or_else(|| token.strip_prefix('[').and_then(|t| t.strip_suffix(']')))
            {
                let placeholder = inner.split(':').next().unwrap_or(inner);
                value_name = Some(placeholder.to_string());
            }
        }

        let long = format!("--{}", name);
        if !flags.contains(&long) {
            flags.push(long);
        }

        Self {
            name: name.to_string(),
            flags,
            value_name,
            config: OptionVariant {
                syntax: syntax.trim().to_string(),
                ..Default::default()
            },
            fixed_value: false,
            variants: Vec::new(),
        }
    }

    pub fn hidden(mut self, hidden: impl Into<Computed>) -> Self {
        self.config.hidden = hidden.into();
        self
    }

    pub fn authority(mut self, authority: u32) -> Self {
        self.config.authority = authority;
        self
    }

    pub fn desc_path(mut self, path: &str) -> Self {
        self.config.desc_path = Some(path.to_string());
        self
    }

    /// Add a named variant; the option itself then only exists through it
    pub fn variant(mut self, name: &str, variant: OptionVariant) -> Self {
        self.fixed_value = true;
        self.variants.push((name.to_string(), variant));
        self
    }

    pub fn takes_value(&self) -> bool {
        self.value_name.is_some()
    }

    pub fn accepts(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// A node of the command tree
#[derive(Debug, Clone)]
pub struct Command {
    /// Full dotted name
    pub name: String,
    /// Invocable names, primary first; empty for grouping nodes
    pub aliases: Vec<String>,
    /// Argument declaration, e.g. `<user> [reason:text]`
    pub declaration: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub options: Vec<CommandOption>,
    pub usage: Option<Usage>,
    pub examples: Vec<String>,
    pub hidden: Computed,
    pub hide_options: bool,
    pub authority: u32,
    pub params: Params,
    pub scope: Scope,
    pub has_action: bool,
    pub user_fields: BTreeSet<String>,
    pub channel_fields: BTreeSet<String>,
}

impl Command {
    /// An invocable command
    pub fn new(name: &str) -> Self {
        let mut command = Self::group(name);
        command.aliases.push(command.name.clone());
        command.has_action = true;
        command
    }

    /// A grouping node used only to organise children
    pub fn group(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            aliases: Vec::new(),
            declaration: String::new(),
            parent: None,
            children: Vec::new(),
            options: Vec::new(),
            usage: None,
            examples: Vec::new(),
            hidden: Computed::default(),
            hide_options: false,
            authority: 1,
            params: Params::default(),
            scope: Scope::Any,
            has_action: false,
            user_fields: BTreeSet::new(),
            channel_fields: BTreeSet::new(),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        let alias = alias.to_lowercase();
        if !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
        self
    }

    pub fn declaration(mut self, declaration: &str) -> Self {
        self.declaration = declaration.trim().to_string();
        self
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.add_option(option);
        self
    }

    /// Add or replace an option by name
    pub fn add_option(&mut self, option: CommandOption) {
        match self.options.iter_mut().find(|o| o.name == option.name) {
            Some(existing) => *existing = option,
            None => self.options.push(option),
        }
    }

    pub fn get_option(&self, name: &str) -> Option<&CommandOption> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn usage(mut self, usage: &str) -> Self {
        self.usage = Some(Usage::Text(usage.to_string()));
        self
    }

    pub fn dynamic_usage(mut self, usage: Arc<dyn DynamicUsage>) -> Self {
        self.usage = Some(Usage::Dynamic(usage));
        self
    }

    pub fn example(mut self, example: &str) -> Self {
        self.examples.push(example.to_string());
        self
    }

    pub fn hidden(mut self, hidden: impl Into<Computed>) -> Self {
        self.hidden = hidden.into();
        self
    }

    pub fn hide_options(mut self, hide: bool) -> Self {
        self.hide_options = hide;
        self
    }

    pub fn authority(mut self, authority: u32) -> Self {
        self.authority = authority;
        self
    }

    pub fn param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.params = self.params.with(key, value);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Mark whether the command has an action; without one, invoking it shows help
    pub fn action(mut self, has_action: bool) -> Self {
        self.has_action = has_action;
        self
    }

    pub fn user_field(mut self, field: &str) -> Self {
        self.user_fields.insert(field.to_string());
        self
    }

    pub fn channel_field(mut self, field: &str) -> Self {
        self.channel_fields.insert(field.to_string());
        self
    }

    /// Name shown in listings: the primary alias, else the full name
    pub fn display_name(&self) -> String {
        self.aliases.first().cloned().unwrap_or_else(|| self.name.clone())
    }

    /// Display name with dots turned into spaces, as typed by users
    pub fn display_path(&self) -> String {
        self.display_name().replace('.', " ")
    }

    pub fn is_group(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn applies_to(&self, session: &Session) -> bool {
        self.scope.matches(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_syntax_parsing() {
        let option = CommandOption::parse("page", "-p <page:number>");
        assert_eq!(option.flags, vec!["-p", "--page"]);
        assert_eq!(option.value_name.as_deref(), Some("page"));
        assert!(option.accepts("--page"));

        let flag = CommandOption::parse("help", "-h, --help");
        assert_eq!(flag.flags, vec!["-h", "--help"]);
        assert!(!flag.takes_value());
    }

    #[test]
    fn test_command_aliases_and_group() {
        let command = Command::new("Echo").alias("say").alias("say");
        assert_eq!(command.aliases, vec!["echo", "say"]);
        assert!(!command.is_group());

        let group = Command::group("admin");
        assert!(group.is_group());
        assert!(!group.has_action);
        assert_eq!(group.display_name(), "admin");
    }

    #[test]
    fn test_scope_matching() {
        let direct = Session::direct("discord", "1");
        let guild = Session::in_channel("discord", "1", "c");
        assert!(Scope::DirectOnly.matches(&direct));
        assert!(!Scope::DirectOnly.matches(&guild));
        assert!(Scope::GuildOnly.matches(&guild));
        assert!(!Scope::Platforms(vec!["telegram".to_string()]).matches(&guild));
    }

    #[test]
    fn test_computed_flags() {
        let hidden = Computed::dynamic(|s: &Session| s.authority() < 2);
        assert!(hidden.resolve(&Session::direct("p", "u")));
        assert!(!hidden.resolve(&Session::direct("p", "u").with_authority(2)));
    }
}
