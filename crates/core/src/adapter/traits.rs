use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Attributes, DatabaseSession, DatabaseUser, Result};

/// Storage for user records.
#[async_trait]
pub trait UserAdapter: Send + Sync {
    /// Gets a user by their ID.
    async fn get_user(&self, user_id: &str) -> Result<Option<DatabaseUser>>;

    /// Creates a user, replacing any existing user with the same ID.
    async fn set_user(&self, user: &DatabaseUser) -> Result<()>;

    /// Merges attributes into an existing user. Does nothing if the user does not exist.
    async fn update_user(&self, user_id: &str, attributes: &Attributes) -> Result<()>;

    /// Deletes a user by their ID.
    async fn delete_user(&self, user_id: &str) -> Result<()>;
}

/// Storage for session records.
#[async_trait]
pub trait SessionAdapter: Send + Sync {
    /// Gets a session by its ID.
    async fn get_session(&self, session_id: &str) -> Result<Option<DatabaseSession>>;

    /// Gets a session together with the user it belongs to.
    ///
    /// Returns `(None, None)` when the session does not exist.
    async fn get_session_and_user(
        &self,
        session_id: &str,
    ) -> Result<(Option<DatabaseSession>, Option<DatabaseUser>)>;

    /// Gets all sessions of a user.
    async fn get_user_sessions(&self, user_id: &str) -> Result<Vec<DatabaseSession>>;

    /// Creates a session, replacing any existing session with the same ID.
    async fn set_session(&self, session: &DatabaseSession) -> Result<()>;

    /// Moves the expiration of an existing session. Does nothing if the session does not exist.
    async fn update_session_expiration(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Deletes a session by its ID.
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Deletes all sessions for a user (logout-all).
    async fn delete_user_sessions(&self, user_id: &str) -> Result<()>;

    /// Deletes every session that expired at or before now.
    async fn delete_expired_sessions(&self) -> Result<()>;
}

/// Full storage interface required by the authentication layer.
pub trait Adapter: UserAdapter + SessionAdapter {}

impl<T: UserAdapter + SessionAdapter + ?Sized> Adapter for T {}
