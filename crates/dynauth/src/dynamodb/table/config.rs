//! Table configuration types (Functional Core - pure data).

use crate::dynamodb::config::{
    DEFAULT_EXPIRATION_INDEX, DEFAULT_TABLE_NAME, DEFAULT_USER_SESSIONS_INDEX,
};
use crate::dynamodb::keys;

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub gsis: Vec<GsiConfig>,
    pub billing_mode: BillingMode,
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

/// DynamoDB attribute types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
}

/// Global Secondary Index configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsiConfig {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub projection: ProjectionType,
}

/// GSI projection type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionType {
    All,
}

/// Billing mode for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingMode {
    PayPerRequest,
}

impl KeyAttribute {
    fn string(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute_type: AttributeType::String,
        }
    }
}

impl GsiConfig {
    fn string_keys(name: &str, partition_key: &str, sort_key: &str) -> Self {
        Self {
            name: name.to_string(),
            partition_key: KeyAttribute::string(partition_key),
            sort_key: Some(KeyAttribute::string(sort_key)),
            projection: ProjectionType::All,
        }
    }
}

impl TableConfig {
    /// Sets the table name.
    pub fn with_table_name(mut self, name: &str) -> Self {
        self.table_name = name.to_string();
        self
    }
}

/// Returns the canonical table configuration for users and sessions.
/// This is a pure function - no I/O.
pub fn auth_table_config() -> TableConfig {
    TableConfig {
        table_name: DEFAULT_TABLE_NAME.to_string(),
        partition_key: KeyAttribute::string(keys::PK),
        sort_key: Some(KeyAttribute::string(keys::SK)),
        gsis: vec![
            GsiConfig::string_keys(DEFAULT_USER_SESSIONS_INDEX, keys::GS1_PK, keys::GS1_SK),
            GsiConfig::string_keys(DEFAULT_EXPIRATION_INDEX, keys::GS2_PK, keys::GS2_SK),
        ],
        billing_mode: BillingMode::PayPerRequest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_table_config_keys() {
        let config = auth_table_config();

        assert_eq!(config.table_name, "LuciaAuthTable");
        assert_eq!(config.partition_key.name, "Pk");
        assert_eq!(config.sort_key.as_ref().unwrap().name, "Sk");
        assert_eq!(config.billing_mode, BillingMode::PayPerRequest);
    }

    #[test]
    fn test_auth_table_config_indexes() {
        let config = auth_table_config();
        let indexes: Vec<(&str, &str, &str)> = config
            .gsis
            .iter()
            .map(|g| {
                (
                    g.name.as_str(),
                    g.partition_key.name.as_str(),
                    g.sort_key.as_ref().unwrap().name.as_str(),
                )
            })
            .collect();

        assert_eq!(
            indexes,
            vec![("Gs1", "Gs1Pk", "Gs1Sk"), ("Gs2", "Gs2Pk", "Gs2Sk")]
        );
        assert!(config.gsis.iter().all(|g| g.projection == ProjectionType::All));
    }

    #[test]
    fn test_with_table_name() {
        let config = auth_table_config().with_table_name("auth-test");
        assert_eq!(config.table_name, "auth-test");
    }
}
