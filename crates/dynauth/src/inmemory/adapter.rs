use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use dynauth_core::adapter::{
    check_attribute_names, check_user_attributes, is_session_expired, Attributes,
    DatabaseSession, DatabaseUser, Result, SessionAdapter, UserAdapter,
};

/// In-memory adapter for development and testing.
///
/// Stores users and sessions in HashMaps wrapped in `Arc<RwLock<_>>`.
/// Clones share the same data. Data is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAdapter {
    users: Arc<RwLock<HashMap<String, DatabaseUser>>>,
    sessions: Arc<RwLock<HashMap<String, DatabaseSession>>>,
    extra_user_attributes: Vec<String>,
}

impl InMemoryAdapter {
    /// Creates a new empty in-memory adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute names that belong in `extra_attributes`.
    ///
    /// `update_user` routes them there, `set_user` rejects users that put them
    /// anywhere else.
    pub fn with_extra_user_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_user_attributes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Number of stored sessions, expired ones included.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl UserAdapter for InMemoryAdapter {
    async fn get_user(&self, user_id: &str) -> Result<Option<DatabaseUser>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn set_user(&self, user: &DatabaseUser) -> Result<()> {
        check_user_attributes(user, &self.extra_user_attributes)?;
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, user_id: &str, attributes: &Attributes) -> Result<()> {
        check_attribute_names(attributes)?;
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(user_id) else {
            tracing::debug!(%user_id, "User not found, nothing to update");
            return Ok(());
        };

        for (name, value) in attributes {
            let target = if self.extra_user_attributes.contains(name) {
                &mut user.extra_attributes
            } else {
                &mut user.attributes
            };
            target.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        let mut users = self.users.write().await;
        users.remove(user_id);
        Ok(())
    }
}

#[async_trait]
impl SessionAdapter for InMemoryAdapter {
    async fn get_session(&self, session_id: &str) -> Result<Option<DatabaseSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn get_session_and_user(
        &self,
        session_id: &str,
    ) -> Result<(Option<DatabaseSession>, Option<DatabaseUser>)> {
        let Some(session) = self.get_session(session_id).await? else {
            return Ok((None, None));
        };

        let user = self.get_user(&session.user_id).await?;
        Ok((Some(session), user))
    }

    async fn get_user_sessions(&self, user_id: &str) -> Result<Vec<DatabaseSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_session(&self, session: &DatabaseSession) -> Result<()> {
        check_attribute_names(&session.attributes)?;
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn update_session_expiration(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) => session.expires_at = expires_at,
            None => tracing::debug!(%session_id, "Session not found, nothing to update"),
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.user_id != user_id);
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<()> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !is_session_expired(s, now));

        tracing::debug!(deleted = before - sessions.len(), %now, "Expired sessions deleted");
        Ok(())
    }
}
