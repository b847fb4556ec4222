//! TOML command manifest
//!
//! Describes a bot's command tree for hosts that do not build it in code:
//!
//! ```toml
//! locale = "en-US"
//!
//! [[command]]
//! name = "echo"
//! aliases = ["say"]
//! declaration = "<message:text>"
//! description = "Repeat a message"
//!
//! [[command.option]]
//! name = "loud"
//! syntax = "-l, --loud"
//! description = "Shout it"
//! ```

use crate::command::{Command, CommandOption, Computed, OptionVariant, Scope};
use crate::locale::{Catalog, Params};
use crate::registry::Registry;
use crate::session::Session;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Locale for the inline descriptions
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default, rename = "command")]
    pub commands: Vec<CommandEntry>,
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_authority() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeEntry {
    #[default]
    Any,
    Direct,
    Guild,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandEntry {
    pub name: String,
    /// Grouping node without aliases
    #[serde(default)]
    pub group: bool,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub declaration: String,
    pub description: Option<String>,
    pub usage: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub hidden: bool,
    /// Hide from requesters below this authority
    pub hidden_below: Option<u32>,
    #[serde(default)]
    pub hide_options: bool,
    #[serde(default = "default_authority")]
    pub authority: u32,
    #[serde(default)]
    pub scope: ScopeEntry,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default = "default_true")]
    pub action: bool,
    #[serde(default)]
    pub user_fields: Vec<String>,
    #[serde(default)]
    pub channel_fields: Vec<String>,
    #[serde(default)]
    pub params: BTreeMap<String, toml::Value>,
    /// Localized shortcut strings by variant
    #[serde(default)]
    pub shortcuts: BTreeMap<String, String>,
    #[serde(default, rename = "option")]
    pub options: Vec<OptionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionEntry {
    pub name: String,
    pub syntax: String,
    pub description: Option<String>,
    pub desc_path: Option<String>,
    #[serde(default)]
    pub authority: u32,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, rename = "variant")]
    pub variants: Vec<VariantEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantEntry {
    pub name: String,
    pub syntax: String,
    pub description: Option<String>,
    #[serde(default)]
    pub authority: u32,
    #[serde(default)]
    pub hidden: bool,
}

fn to_params(values: &BTreeMap<String, toml::Value>) -> Result<Params> {
    let mut params = Params::new();
    for (key, value) in values {
        params.named.insert(key.clone(), serde_json::to_value(value)?);
    }
    Ok(params)
}

impl Manifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Manifest(format!("Failed to read manifest {:?}: {}", path, e)))?;
        Self::parse(&content)
    }

    pub fn parse(source: &str) -> Result<Self> {
        let manifest: Manifest =
            toml::from_str(source).map_err(|e| Error::Manifest(format!("Failed to parse manifest: {}", e)))?;

        for entry in &manifest.commands {
            if entry.name.trim().is_empty() {
                return Err(Error::Manifest("Command name cannot be empty".to_string()));
            }
            if entry.group && !entry.aliases.is_empty() {
                return Err(Error::Manifest(format!("Group {} cannot declare aliases", entry.name)));
            }
        }
        Ok(manifest)
    }

    /// Add the commands to the registry and their strings to the catalog
    pub fn apply(&self, registry: &mut Registry, catalog: &mut Catalog) -> Result<usize> {
        for entry in &self.commands {
            let command = self.build(entry)?;
            let key = format!("commands.{}", command.name);

            if let Some(description) = &entry.description {
                catalog.define(&self.locale, &format!("{}.description", key), description);
            }
            for (variant, text) in &entry.shortcuts {
                catalog.define(&self.locale, &format!("{}.shortcuts.{}", key, variant), text);
            }
            for option in &entry.options {
                if let Some(description) = &option.description {
                    catalog.define(&self.locale, &format!("{}.options.{}", key, option.name), description);
                }
                for variant in &option.variants {
                    if let Some(description) = &variant.description {
                        let path = format!("{}.options.{}.{}", key, option.name, variant.name);
                        catalog.define(&self.locale, &path, description);
                    }
                }
            }

            registry.add(command);
        }

        tracing::info!("Applied manifest with {} commands", self.commands.len());
        Ok(self.commands.len())
    }

    fn build(&self, entry: &CommandEntry) -> Result<Command> {
        let mut command = if entry.group {
            Command::group(&entry.name)
        } else {
            Command::new(&entry.name)
        };
        for alias in &entry.aliases {
            command = command.alias(alias);
        }

        command = command
            .declaration(&entry.declaration)
            .hide_options(entry.hide_options)
            .authority(entry.authority);
        command.params = to_params(&entry.params)?;
        command.examples = entry.examples.clone();
        if let Some(usage) = &entry.usage {
            command = command.usage(usage);
        }
        if !entry.group {
            command = command.action(entry.action);
        }

        command.hidden = match entry.hidden_below {
            Some(level) if !entry.hidden => Computed::dynamic(move |s: &Session| s.authority() < level),
            _ => Computed::Value(entry.hidden),
        };

        command.scope = if !entry.platforms.is_empty() {
            Scope::Platforms(entry.platforms.clone())
        } else {
            match entry.scope {
                ScopeEntry::Any => Scope::Any,
                ScopeEntry::Direct => Scope::DirectOnly,
                ScopeEntry::Guild => Scope::GuildOnly,
            }
        };

        for field in &entry.user_fields {
            command = command.user_field(field);
        }
        for field in &entry.channel_fields {
            command = command.channel_field(field);
        }

        for option in &entry.options {
            let mut parsed = CommandOption::parse(&option.name, &option.syntax)
                .authority(option.authority)
                .hidden(option.hidden);
            if let Some(path) = &option.desc_path {
                parsed = parsed.desc_path(path);
            }
            for variant in &option.variants {
                parsed = parsed.variant(
                    &variant.name,
                    OptionVariant {
                        syntax: variant.syntax.clone(),
                        authority: variant.authority,
                        hidden: Computed::Value(variant.hidden),
                        ..Default::default()
                    },
                );
            }
            command = command.option(parsed);
        }

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Localizer;

    const SAMPLE: &str = r#"
locale = "en-US"

[[command]]
name = "echo"
aliases = ["say"]
declaration = "<message:text>"
description = "Repeat a message"
examples = ["echo hello"]
params = { limit = 3 }
shortcuts = { repeat = "repeat after me" }

[[command.option]]
name = "loud"
syntax = "-l, --loud"
description = "Shout it"

[[command.option]]
name = "style"
syntax = "--style <style>"

[[command.option.variant]]
name = "bold"
syntax = "-b"
description = "Bold text"

[[command]]
name = "admin"
group = true

[[command]]
name = "admin.ban"
authority = 3
hidden_below = 2
scope = "guild"
"#;

    #[test]
    fn test_apply_manifest() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        let mut registry = Registry::new();
        let mut catalog = Catalog::empty("en-US");
        assert_eq!(manifest.apply(&mut registry, &mut catalog).unwrap(), 3);

        let echo = registry.resolve("say").unwrap();
        assert_eq!(echo.declaration, "<message:text>");
        assert_eq!(echo.examples, vec!["echo hello"]);
        assert_eq!(echo.params.named.get("limit"), Some(&serde_json::json!(3)));
        let style = echo.get_option("style").unwrap();
        assert!(style.fixed_value);
        assert_eq!(style.variants[0].0, "bold");

        assert_eq!(
            catalog.text(&[], &["commands.echo.options.style.bold"], &Params::new()).as_deref(),
            Some("Bold text")
        );
        assert_eq!(catalog.find(&[], "commands.(name).shortcuts.(variant)", "repeat after me").len(), 1);

        let admin = registry.get("admin").unwrap();
        assert!(admin.is_group());
        let ban = registry.resolve("admin ban").unwrap();
        assert_eq!(ban.scope, Scope::GuildOnly);
        assert!(ban.hidden.resolve(&Session::direct("p", "u").with_authority(1)));
        assert!(!ban.hidden.resolve(&Session::direct("p", "u").with_authority(2)));
    }

    #[test]
    fn test_group_with_aliases_is_rejected() {
        let source = "[[command]]\nname = \"admin\"\ngroup = true\naliases = [\"adm\"]\n";
        assert!(Manifest::parse(source).is_err());
    }
}
