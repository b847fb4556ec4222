//! Plugin system for the command host

use crate::argv::Argv;
use crate::locale::Localizer;
use crate::permission::PermissionChecker;
use crate::registry::Registry;
use crate::session::{FieldObserver, Session};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// An interactive "did you mean" prompt
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestPrompt {
    /// Candidate command names, already filtered for the requester
    pub expect: Vec<String>,
    /// Shown before the candidates
    pub prefix: String,
    /// Shown after the candidates
    pub suffix: String,
}

/// Asks the user to pick one of several names
#[async_trait]
pub trait Suggester: Send + Sync {
    /// Returns the confirmed name, or `None` when the user declines or the prompt expires
    async fn suggest(&self, session: &Session, prompt: SuggestPrompt) -> Option<String>;
}

/// A suggester that never confirms anything
#[derive(Debug, Default)]
pub struct NoSuggest;

#[async_trait]
impl Suggester for NoSuggest {
    async fn suggest(&self, _session: &Session, _prompt: SuggestPrompt) -> Option<String> {
        None
    }
}

/// Collaborators provided by the host framework
#[derive(Clone)]
pub struct Host {
    pub registry: Arc<Registry>,
    pub permissions: Arc<dyn PermissionChecker>,
    pub localizer: Arc<dyn Localizer>,
    /// `None` when the host has no database
    pub observer: Option<Arc<dyn FieldObserver>>,
    pub suggester: Arc<dyn Suggester>,
    /// Registration prefixes; the first is shown in listings
    pub prefixes: Vec<String>,
}

impl Host {
    pub fn display_prefix(&self) -> &str {
        self.prefixes.first().map(String::as_str).unwrap_or("")
    }

    /// Parse a message by command name, falling back to declared shortcuts
    pub fn parse(&self, text: &str, session: &Session) -> Option<Argv> {
        Argv::parse(&self.registry, text, &self.prefixes).or_else(|| {
            Argv::parse_shortcut(
                &self.registry,
                self.localizer.as_ref(),
                &session.locales,
                text,
                &self.prefixes,
            )
        })
    }
}

/// Module trait that all plugins implement
#[async_trait]
pub trait Module: Send + Sync {
    /// Module name
    fn name(&self) -> &str;

    /// Module version
    fn version(&self) -> &str;

    /// Module description
    fn description(&self) -> &str;

    /// Register commands and listeners
    async fn init(&mut self, registry: &mut Registry) -> Result<()>;

    /// Cleanup the module
    async fn cleanup(&mut self) -> Result<()>;

    /// Handle a parsed invocation
    async fn handle_command(&self, argv: &Argv, session: &mut Session, host: &Host) -> Result<ModuleResult>;
}

/// Result of module command handling
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleResult {
    /// Handled, with the reply to send (if any)
    Handled(Option<String>),
    /// Not handled, continue to the next module
    NotHandled,
}

/// Module manager for loading modules and dispatching invocations
#[derive(Default)]
pub struct ModuleManager {
    modules: Vec<Box<dyn Module>>,
}

impl ModuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a module
    pub async fn load_module(&mut self, mut module: Box<dyn Module>, registry: &mut Registry) -> Result<()> {
        module.init(registry).await?;
        tracing::info!("Loaded module {} v{}", module.name(), module.version());
        self.modules.push(module);
        Ok(())
    }

    /// Unload a module
    pub async fn unload_module(&mut self, name: &str) -> Result<()> {
        if let Some(index) = self.modules.iter().position(|m| m.name() == name) {
            let mut module = self.modules.remove(index);
            module.cleanup().await?;
        }
        Ok(())
    }

    /// Unload every module
    pub async fn shutdown(&mut self) -> Result<()> {
        for mut module in self.modules.drain(..) {
            if let Err(e) = module.cleanup().await {
                tracing::error!("Error cleaning up module {}: {}", module.name(), e);
            }
        }
        Ok(())
    }

    /// Dispatch an invocation to modules in load order
    pub async fn handle_command(&self, argv: &Argv, session: &mut Session, host: &Host) -> Result<ModuleResult> {
        for module in &self.modules {
            match module.handle_command(argv, session, host).await {
                Ok(ModuleResult::NotHandled) => continue,
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::error!("Error in module {}: {}", module.name(), e);
                    continue;
                }
            }
        }
        Ok(ModuleResult::NotHandled)
    }

    pub fn get_loaded_modules(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::locale::Catalog;
    use crate::permission::AuthorityPermissions;

    struct Echo;

    #[async_trait]
    impl Module for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        fn description(&self) -> &str {
            "Repeats its arguments"
        }

        async fn init(&mut self, registry: &mut Registry) -> Result<()> {
            registry.add(Command::new("echo"));
            Ok(())
        }

        async fn cleanup(&mut self) -> Result<()> {
            Ok(())
        }

        async fn handle_command(&self, argv: &Argv, _session: &mut Session, _host: &Host) -> Result<ModuleResult> {
            if argv.command != "echo" {
                return Ok(ModuleResult::NotHandled);
            }
            Ok(ModuleResult::Handled(Some(argv.args.join(" "))))
        }
    }

    struct Failing;

    #[async_trait]
    impl Module for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn version(&self) -> &str {
            "0.0.1"
        }

        fn description(&self) -> &str {
            "Always errors"
        }

        async fn init(&mut self, _registry: &mut Registry) -> Result<()> {
            Ok(())
        }

        async fn cleanup(&mut self) -> Result<()> {
            Ok(())
        }

        async fn handle_command(&self, _argv: &Argv, _session: &mut Session, _host: &Host) -> Result<ModuleResult> {
            Err(crate::Error::Module("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_dispatch_skips_failing_modules() {
        let mut registry = Registry::new();
        let mut manager = ModuleManager::new();
        manager.load_module(Box::new(Failing), &mut registry).await.unwrap();
        manager.load_module(Box::new(Echo), &mut registry).await.unwrap();
        assert_eq!(manager.get_loaded_modules(), vec!["failing", "echo"]);

        let registry = Arc::new(registry);
        let host = Host {
            registry: registry.clone(),
            permissions: Arc::new(AuthorityPermissions::new(registry)),
            localizer: Arc::new(Catalog::new("en-US")),
            observer: None,
            suggester: Arc::new(NoSuggest),
            prefixes: vec![],
        };

        let mut session = Session::direct("p", "u");
        let argv = Argv::new("echo").arg("hi");
        let result = manager.handle_command(&argv, &mut session, &host).await.unwrap();
        assert_eq!(result, ModuleResult::Handled(Some("hi".to_string())));

        let other = Argv::new("weather");
        assert_eq!(manager.handle_command(&other, &mut session, &host).await.unwrap(), ModuleResult::NotHandled);

        manager.unload_module("failing").await.unwrap();
        assert_eq!(manager.get_loaded_modules(), vec!["echo"]);
    }
}
