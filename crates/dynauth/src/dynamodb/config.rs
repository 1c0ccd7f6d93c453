use std::env;

/// Default table name, shared with the table bootstrap.
pub const DEFAULT_TABLE_NAME: &str = "LuciaAuthTable";
/// Index answering "sessions of user X".
pub const DEFAULT_USER_SESSIONS_INDEX: &str = "Gs1";
/// Index answering "sessions expiring before T".
pub const DEFAULT_EXPIRATION_INDEX: &str = "Gs2";

/// DynamoDB adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbAdapterConfig {
    /// Name of the single table holding users and sessions.
    pub table_name: String,
    /// User attributes stored on the user item but not owned by the
    /// authentication layer (e.g. `HashedPassword`). Read back into
    /// `DatabaseUser::extra_attributes`.
    pub extra_user_attributes: Vec<String>,
    pub user_sessions_index: String,
    pub expiration_index: String,
}

impl DynamoDbAdapterConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            extra_user_attributes: Vec::new(),
            user_sessions_index: DEFAULT_USER_SESSIONS_INDEX.to_string(),
            expiration_index: DEFAULT_EXPIRATION_INDEX.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DYNAMODB_TABLE_NAME` - Table name (default: "LuciaAuthTable")
    /// - `DYNAMODB_EXTRA_USER_ATTRIBUTES` - Comma-separated extra user attributes (default: none)
    pub fn from_env() -> Self {
        let table_name =
            env::var("DYNAMODB_TABLE_NAME").unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_string());
        let extra = env::var("DYNAMODB_EXTRA_USER_ATTRIBUTES").unwrap_or_default();

        Self::new(table_name).with_extra_user_attributes(parse_attribute_list(&extra))
    }

    pub fn with_extra_user_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_user_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_user_sessions_index(mut self, index: impl Into<String>) -> Self {
        self.user_sessions_index = index.into();
        self
    }

    pub fn with_expiration_index(mut self, index: impl Into<String>) -> Self {
        self.expiration_index = index.into();
        self
    }
}

impl Default for DynamoDbAdapterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_NAME)
    }
}

/// Splits a comma-separated attribute list, dropping blanks.
fn parse_attribute_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
