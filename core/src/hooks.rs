//! Extension points fired while help is rendered
//!
//! Handlers run in registration order. Command hooks append to the shared
//! output; option hooks are chained, each receiving the previous result.

use crate::command::{Command, OptionVariant};
use crate::session::Session;
use parking_lot::RwLock;
use std::sync::Arc;

/// Appends lines to a command's detail view before its usage
pub trait CommandHook: Send + Sync {
    fn extend(&self, output: &mut Vec<String>, command: &Command, session: &Session);
}

/// Rewrites one rendered option line
pub trait OptionHook: Send + Sync {
    fn rewrite(&self, line: String, option: &OptionVariant, command: &Command, session: &Session) -> String;
}

impl<F> CommandHook for F
where
    F: Fn(&mut Vec<String>, &Command, &Session) + Send + Sync,
{
    fn extend(&self, output: &mut Vec<String>, command: &Command, session: &Session) {
        self(output, command, session)
    }
}

impl<F> OptionHook for F
where
    F: Fn(String, &OptionVariant, &Command, &Session) -> String + Send + Sync,
{
    fn rewrite(&self, line: String, option: &OptionVariant, command: &Command, session: &Session) -> String {
        self(line, option, command, session)
    }
}

/// Shared handle to the registered handlers; clones see the same chains
#[derive(Clone, Default)]
pub struct HelpEvents {
    command_hooks: Arc<RwLock<Vec<Arc<dyn CommandHook>>>>,
    option_hooks: Arc<RwLock<Vec<Arc<dyn OptionHook>>>>,
}

impl std::fmt::Debug for HelpEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelpEvents")
            .field("command_hooks", &self.command_hooks.read().len())
            .field("option_hooks", &self.option_hooks.read().len())
            .finish()
    }
}

impl HelpEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_command(&self, hook: Arc<dyn CommandHook>) {
        self.command_hooks.write().push(hook);
    }

    pub fn on_option(&self, hook: Arc<dyn OptionHook>) {
        self.option_hooks.write().push(hook);
    }

    pub fn emit_command(&self, output: &mut Vec<String>, command: &Command, session: &Session) {
        let hooks = self.command_hooks.read().clone();
        for hook in hooks {
            hook.extend(output, command, session);
        }
    }

    pub fn chain_option(&self, line: String, option: &OptionVariant, command: &Command, session: &Session) -> String {
        let hooks = self.option_hooks.read().clone();
        hooks
            .iter()
            .fold(line, |line, hook| hook.rewrite(line, option, command, session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_hooks_chain_in_order() {
        let events = HelpEvents::new();
        events.on_option(Arc::new(|line: String, _: &OptionVariant, _: &Command, _: &Session| format!("{}!", line)));
        events.on_option(Arc::new(|line: String, _: &OptionVariant, _: &Command, _: &Session| format!("[{}]", line)));

        let command = Command::new("echo");
        let session = Session::direct("p", "u");
        let line = events.chain_option("-x".to_string(), &OptionVariant::default(), &command, &session);
        assert_eq!(line, "[-x!]");
    }

    #[test]
    fn test_command_hooks_share_output() {
        let events = HelpEvents::new();
        let clone = events.clone();
        clone.on_command(Arc::new(|output: &mut Vec<String>, command: &Command, _: &Session| {
            output.push(format!("extra for {}", command.name));
        }));

        let mut output = vec!["title".to_string()];
        events.emit_command(&mut output, &Command::new("echo"), &Session::direct("p", "u"));
        assert_eq!(output, vec!["title", "extra for echo"]);
    }
}
