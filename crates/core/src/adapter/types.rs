use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open set of attributes owned by the authentication layer.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// A user record as the authentication layer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseUser {
    pub id: String,
    /// Attributes defined by the authentication layer (e.g. `username`).
    #[serde(default)]
    pub attributes: Attributes,
    /// Adapter-configured attributes stored on the same record (e.g. a password hash).
    ///
    /// Kept apart from `attributes` so the layer reads back exactly the set it wrote.
    /// Backends route by the configured names, so a configured name must only
    /// appear here and every name here must be configured.
    #[serde(default)]
    pub extra_attributes: Attributes,
}

impl DatabaseUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
            extra_attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_extra_attribute(
        mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.extra_attributes.insert(name.into(), value);
        self
    }
}

/// A session record as the authentication layer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSession {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl DatabaseSession {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            expires_at,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}
