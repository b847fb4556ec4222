//! Command registry

use crate::command::Command;
use crate::session::Session;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Listener fired for every command added to the registry
pub type AddListener = Box<dyn Fn(&mut Command) + Send + Sync>;

/// A shortcut declared for a command
#[derive(Debug, Clone, PartialEq)]
pub struct Shortcut {
    /// Match the localized `commands.<name>.shortcuts.*` strings
    pub i18n: bool,
    /// Accept inexact matches
    pub fuzzy: bool,
}

/// The command tree
#[derive(Default)]
pub struct Registry {
    commands: HashMap<String, Command>,
    /// Registration order of all command names
    order: Vec<String>,
    aliases: HashMap<String, String>,
    shortcuts: HashMap<String, Shortcut>,
    listeners: Vec<AddListener>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("commands", &self.order)
            .field("shortcuts", &self.shortcuts)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command, creating grouping parents for dotted names as needed
    pub fn add(&mut self, mut command: Command) {
        let name = command.name.clone();

        if let Some((parent, _)) = name.rsplit_once('.') {
            if !self.commands.contains_key(parent) {
                self.add(Command::group(parent));
            }
            command.parent = Some(parent.to_string());
            if let Some(parent_command) = self.commands.get_mut(parent) {
                if !parent_command.children.contains(&name) {
                    parent_command.children.push(name.clone());
                }
            }
        }

        for listener in &self.listeners {
            listener(&mut command);
        }

        for alias in &command.aliases {
            self.aliases.insert(alias.clone(), name.clone());
        }

        // Keep children registered before a later explicit definition of the parent
        if let Some(previous) = self.commands.remove(&name) {
            for child in previous.children {
                if !command.children.contains(&child) {
                    command.children.push(child);
                }
            }
        } else {
            self.order.push(name.clone());
        }

        debug!("Registered command {}", name);
        self.commands.insert(name, command);
    }

    /// Register a listener and apply it to every existing command
    pub fn on_command_added(&mut self, listener: AddListener) {
        for command in self.commands.values_mut() {
            listener(command);
        }
        self.listeners.push(listener);
    }

    pub fn shortcut(&mut self, name: &str, shortcut: Shortcut) {
        self.shortcuts.insert(name.to_string(), shortcut);
    }

    pub fn get_shortcut(&self, name: &str) -> Option<&Shortcut> {
        self.shortcuts.get(name)
    }

    /// Look up by exact name or alias
    pub fn get(&self, key: &str) -> Option<&Command> {
        let key = key.to_lowercase();
        self.commands
            .get(&key)
            .or_else(|| self.aliases.get(&key).and_then(|name| self.commands.get(name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve a user-typed path such as `admin ban` or `admin.ban`
    pub fn resolve(&self, target: &str) -> Option<&Command> {
        let target = target.trim().to_lowercase();
        if target.is_empty() {
            return None;
        }

        let normalized = target.split_whitespace().collect::<Vec<_>>().join(".");
        let mut segments = normalized.split('.');
        let mut command = self.get(segments.next()?)?;
        for segment in segments {
            command = self.get(&format!("{}.{}", command.name, segment))?;
        }
        Some(command)
    }

    pub fn children(&self, name: &str) -> Vec<&Command> {
        self.commands
            .get(name)
            .map(|c| c.children.iter().filter_map(|child| self.commands.get(child)).collect())
            .unwrap_or_default()
    }

    /// Commands without a parent, in registration order
    pub fn top_level(&self) -> Vec<&Command> {
        self.all().filter(|c| c.parent.is_none()).collect()
    }

    /// All commands in registration order
    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.order.iter().filter_map(|name| self.commands.get(name))
    }

    /// Every alias usable in the session
    pub fn available(&self, session: &Session) -> Vec<String> {
        self.all()
            .filter(|c| c.applies_to(session))
            .flat_map(|c| c.aliases.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
