//! Permission checks

use crate::registry::Registry;
use crate::session::Session;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Host permission evaluation
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Test a subject such as `command:echo` for the requester
    async fn test(&self, subject: &str, session: &Session) -> bool;
}

/// Grants `command:<name>` when the requester's authority reaches the command's
pub struct AuthorityPermissions {
    registry: Arc<Registry>,
}

impl AuthorityPermissions {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl PermissionChecker for AuthorityPermissions {
    async fn test(&self, subject: &str, session: &Session) -> bool {
        let Some(name) = subject.strip_prefix("command:") else {
            return false;
        };
        match self.registry.get(name) {
            Some(command) => session.authority() >= command.authority,
            None => false,
        }
    }
}

/// Request-scoped memo of permission results, keyed by subject
#[derive(Debug, Default)]
pub struct PermissionCache {
    results: HashMap<String, bool>,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn test(&mut self, checker: &dyn PermissionChecker, subject: &str, session: &Session) -> bool {
        if let Some(result) = self.results.get(subject) {
            return *result;
        }
        let result = checker.test(subject, session).await;
        self.results.insert(subject.to_string(), result);
        result
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingChecker(AtomicUsize);

    #[async_trait]
    impl PermissionChecker for CountingChecker {
        async fn test(&self, _subject: &str, _session: &Session) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[tokio::test]
    async fn test_authority_permissions() {
        let mut registry = Registry::new();
        registry.add(Command::new("echo"));
        registry.add(Command::new("shutdown").authority(4));
        let checker = AuthorityPermissions::new(Arc::new(registry));

        let user = Session::direct("p", "u").with_authority(1);
        assert!(checker.test("command:echo", &user).await);
        assert!(!checker.test("command:shutdown", &user).await);
        assert!(!checker.test("command:missing", &user).await);
        assert!(!checker.test("echo", &user).await);

        let admin = Session::direct("p", "u").with_authority(4);
        assert!(checker.test("command:shutdown", &admin).await);
    }

    #[tokio::test]
    async fn test_cache_memoizes_per_subject() {
        let checker = CountingChecker(AtomicUsize::new(0));
        let session = Session::direct("p", "u");
        let mut cache = PermissionCache::new();

        assert!(cache.test(&checker, "command:a", &session).await);
        assert!(cache.test(&checker, "command:a", &session).await);
        assert!(cache.test(&checker, "command:b", &session).await);
        assert_eq!(checker.0.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }
}
