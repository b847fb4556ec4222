//! Requester context and field observation

use crate::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeSet, HashMap};

/// Stored attributes of a user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    /// Privilege level
    pub authority: u32,
    /// Other observed fields
    pub fields: HashMap<String, String>,
}

/// Stored attributes of a channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelRecord {
    pub fields: HashMap<String, String>,
}

/// The context of a single incoming request
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub platform: String,
    /// `None` for direct (private) conversations
    pub channel_id: Option<String>,
    /// Preferred locales, most preferred first
    pub locales: Vec<String>,
    /// Observed user record, if any
    pub user: Option<UserRecord>,
    /// Observed channel record, if any
    pub channel: Option<ChannelRecord>,
}

impl Session {
    /// Create a session for a direct conversation
    pub fn direct(platform: &str, user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            platform: platform.to_string(),
            channel_id: None,
            locales: Vec::new(),
            user: None,
            channel: None,
        }
    }

    /// Create a session inside a guild channel
    pub fn in_channel(platform: &str, user_id: &str, channel_id: &str) -> Self {
        Self {
            channel_id: Some(channel_id.to_string()),
            ..Self::direct(platform, user_id)
        }
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locales.push(locale.to_string());
        self
    }

    pub fn with_authority(mut self, authority: u32) -> Self {
        self.user.get_or_insert_with(UserRecord::default).authority = authority;
        self
    }

    pub fn is_direct(&self) -> bool {
        self.channel_id.is_none()
    }

    /// Requester authority, 0 when no user record has been observed
    pub fn authority(&self) -> u32 {
        self.user.as_ref().map(|u| u.authority).unwrap_or(0)
    }
}

/// Database-backed field observation
#[async_trait]
pub trait FieldObserver: Send + Sync {
    /// Load the given user fields into `session.user`
    async fn observe_user(&self, session: &mut Session, fields: &BTreeSet<String>) -> Result<()>;

    /// Load the given channel fields into `session.channel`
    async fn observe_channel(&self, session: &mut Session, fields: &BTreeSet<String>) -> Result<()>;
}

/// In-memory record store keyed by `platform:id`
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, UserRecord>,
    channels: DashMap<String, ChannelRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, platform: &str, user_id: &str, record: UserRecord) {
        self.users.insert(format!("{}:{}", platform, user_id), record);
    }

    pub fn insert_channel(&self, platform: &str, channel_id: &str, record: ChannelRecord) {
        self.channels.insert(format!("{}:{}", platform, channel_id), record);
    }
}

#[async_trait]
impl FieldObserver for MemoryStore {
    async fn observe_user(&self, session: &mut Session, fields: &BTreeSet<String>) -> Result<()> {
        let key = format!("{}:{}", session.platform, session.user_id);
        let stored = self.users.get(&key).map(|r| r.clone()).unwrap_or_default();

        let user = session.user.get_or_insert_with(UserRecord::default);
        if fields.contains("authority") {
            user.authority = stored.authority;
        }
        for field in fields {
            if let Some(value) = stored.fields.get(field) {
                user.fields.insert(field.clone(), value.clone());
            }
        }

        tracing::debug!("Observed {} user fields for {}", fields.len(), key);
        Ok(())
    }

    async fn observe_channel(&self, session: &mut Session, fields: &BTreeSet<String>) -> Result<()> {
        let Some(channel_id) = session.channel_id.clone() else {
            return Ok(());
        };
        let key = format!("{}:{}", session.platform, channel_id);
        let stored = self.channels.get(&key).map(|r| r.clone()).unwrap_or_default();

        let channel = session.channel.get_or_insert_with(ChannelRecord::default);
        for field in fields {
            if let Some(value) = stored.fields.get(field) {
                channel.fields.insert(field.clone(), value.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_observes_authority() {
        let store = MemoryStore::new();
        store.insert_user("discord", "42", UserRecord { authority: 3, ..Default::default() });

        let mut session = Session::in_channel("discord", "42", "general");
        assert_eq!(session.authority(), 0);

        let fields: BTreeSet<String> = ["authority".to_string()].into_iter().collect();
        store.observe_user(&mut session, &fields).await.unwrap();
        assert_eq!(session.authority(), 3);
        assert!(!session.is_direct());
    }

    #[tokio::test]
    async fn test_channel_observation_skips_direct_sessions() {
        let store = MemoryStore::new();
        let mut session = Session::direct("discord", "42");
        store.observe_channel(&mut session, &BTreeSet::new()).await.unwrap();
        assert!(session.channel.is_none());
    }
}
