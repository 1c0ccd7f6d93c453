//! DynamoDB adapter implementation.
//!
//! Implements the storage traits from `dynauth_core::adapter` using DynamoDB.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};

use dynauth_core::adapter::{
    check_user_attributes, AdapterError, Attributes, DatabaseSession, DatabaseUser, Result,
    SessionAdapter, UserAdapter,
};

use super::client::{create_client, ClientConfig};
use super::config::DynamoDbAdapterConfig;
use super::conversions::{
    expired_sessions_condition, format_expires_at, item_key, item_to_session, item_to_user,
    session_to_item, set_expression, user_sessions_condition, user_to_item, Item, KeyCondition,
    EXPIRES_AT,
};
use super::error::{
    is_conditional_check_failed, map_sdk_error, DELETE_ITEM, GET_ITEM, PUT_ITEM, QUERY,
    UPDATE_ITEM,
};
use super::keys;

/// DynamoDB-based adapter implementation.
///
/// Users and sessions share one table; see [`keys`] for the layout.
#[derive(Debug, Clone)]
pub struct DynamoDbAdapter {
    client: Client,
    config: DynamoDbAdapterConfig,
}

impl DynamoDbAdapter {
    /// Creates a new adapter with the given DynamoDB client and configuration.
    pub fn new(client: Client, config: DynamoDbAdapterConfig) -> Self {
        Self { client, config }
    }

    /// Creates a new adapter from environment configuration.
    ///
    /// Uses the AWS SDK default credential chain (honoring `AWS_ENDPOINT_URL`
    /// and `AWS_REGION`) and [`DynamoDbAdapterConfig::from_env`].
    pub async fn from_env() -> Self {
        let client = create_client(&ClientConfig::default()).await;
        Self::new(client, DynamoDbAdapterConfig::from_env())
    }

    /// Get the adapter configuration.
    pub fn config(&self) -> &DynamoDbAdapterConfig {
        &self.config
    }

    /// Get the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn get_item(&self, pk: String, sk: String) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.config.table_name)
            .key(keys::PK, AttributeValue::S(pk))
            .key(keys::SK, AttributeValue::S(sk))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, GET_ITEM))?;

        Ok(result.item)
    }

    async fn delete_item(&self, pk: String, sk: String) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.config.table_name)
            .key(keys::PK, AttributeValue::S(pk))
            .key(keys::SK, AttributeValue::S(sk))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, DELETE_ITEM))?;

        Ok(())
    }

    /// Run an index query to completion, following `LastEvaluatedKey`.
    async fn query_index(&self, index_name: &str, condition: KeyCondition) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(&self.config.table_name)
                .index_name(index_name)
                .key_condition_expression(&condition.expression)
                .set_expression_attribute_names(Some(condition.names.clone()))
                .set_expression_attribute_values(Some(condition.values.clone()))
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(|e| map_sdk_error(e, QUERY))?;

            items.extend(result.items.unwrap_or_default());

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }

    /// Query GSI1 for every session item of a user.
    async fn query_user_sessions(&self, user_id: &str) -> Result<Vec<Item>> {
        self.query_index(
            &self.config.user_sessions_index,
            user_sessions_condition(user_id),
        )
        .await
    }

    /// Delete every item in `items` by its own `Pk`/`Sk`, one request per item.
    ///
    /// Items without readable keys are skipped and the rest still deleted; the
    /// first such item is then reported as invalid data.
    async fn delete_session_items(&self, items: &[Item]) -> Result<usize> {
        let mut deleted = 0;
        let mut invalid: Option<AdapterError> = None;

        for item in items {
            match item_key(item) {
                Ok((pk, sk)) => {
                    self.delete_item(pk, sk).await?;
                    deleted += 1;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Skipping session item without keys");
                    invalid.get_or_insert(err);
                }
            }
        }

        match invalid {
            Some(err) => Err(err),
            None => Ok(deleted),
        }
    }
}

// ============================================================================
// UserAdapter implementation
// ============================================================================

#[async_trait]
impl UserAdapter for DynamoDbAdapter {
    async fn get_user(&self, user_id: &str) -> Result<Option<DatabaseUser>> {
        let item = self
            .get_item(keys::user_pk(user_id), keys::user_sk(user_id))
            .await?;

        match item {
            Some(item) => Ok(Some(item_to_user(
                &item,
                &self.config.extra_user_attributes,
            )?)),
            None => Ok(None),
        }
    }

    async fn set_user(&self, user: &DatabaseUser) -> Result<()> {
        check_user_attributes(user, &self.config.extra_user_attributes)?;
        let item = user_to_item(user)?;

        self.client
            .put_item()
            .table_name(&self.config.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, PUT_ITEM))?;

        tracing::debug!(user_id = %user.id, "User stored");
        Ok(())
    }

    async fn update_user(&self, user_id: &str, attributes: &Attributes) -> Result<()> {
        let Some(set) = set_expression(attributes)? else {
            return Ok(());
        };

        let result = self
            .client
            .update_item()
            .table_name(&self.config.table_name)
            .key(keys::PK, AttributeValue::S(keys::user_pk(user_id)))
            .key(keys::SK, AttributeValue::S(keys::user_sk(user_id)))
            .update_expression(set.expression)
            .set_expression_attribute_names(Some(set.names))
            .expression_attribute_names("#pk", keys::PK)
            .set_expression_attribute_values(Some(set.values))
            .condition_expression("attribute_exists(#pk)")
            .send()
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(%user_id, "User updated");
                Ok(())
            }
            Err(err) if is_conditional_check_failed(&err) => {
                tracing::debug!(%user_id, "User not found, nothing to update");
                Ok(())
            }
            Err(err) => Err(map_sdk_error(err, UPDATE_ITEM)),
        }
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.delete_item(keys::user_pk(user_id), keys::user_sk(user_id))
            .await?;

        tracing::debug!(%user_id, "User deleted");
        Ok(())
    }
}

// ============================================================================
// SessionAdapter implementation
// ============================================================================

#[async_trait]
impl SessionAdapter for DynamoDbAdapter {
    async fn get_session(&self, session_id: &str) -> Result<Option<DatabaseSession>> {
        let item = self
            .get_item(keys::session_pk(session_id), keys::session_sk(session_id))
            .await?;

        match item {
            Some(item) => Ok(Some(item_to_session(&item)?)),
            None => Ok(None),
        }
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
        let items = self.query_user_sessions(user_id).await?;
        items.iter().map(item_to_session).collect()
    }

    async fn set_session(&self, session: &DatabaseSession) -> Result<()> {
        let item = session_to_item(session)?;

        self.client
            .put_item()
            .table_name(&self.config.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, PUT_ITEM))?;

        tracing::debug!(session_id = %session.id, user_id = %session.user_id, "Session stored");
        Ok(())
    }

    async fn update_session_expiration(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = self
            .client
            .update_item()
            .table_name(&self.config.table_name)
            .key(keys::PK, AttributeValue::S(keys::session_pk(session_id)))
            .key(keys::SK, AttributeValue::S(keys::session_sk(session_id)))
            .update_expression("SET #expires_at = :expires_at, #gs2sk = :expires_at")
            .expression_attribute_names("#expires_at", EXPIRES_AT)
            .expression_attribute_names("#gs2sk", keys::GS2_SK)
            .expression_attribute_names("#pk", keys::PK)
            .expression_attribute_values(
                ":expires_at",
                AttributeValue::S(format_expires_at(expires_at)),
            )
            .condition_expression("attribute_exists(#pk)")
            .send()
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(%session_id, %expires_at, "Session expiration updated");
                Ok(())
            }
            Err(err) if is_conditional_check_failed(&err) => {
                tracing::debug!(%session_id, "Session not found, nothing to update");
                Ok(())
            }
            Err(err) => Err(map_sdk_error(err, UPDATE_ITEM)),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.delete_item(keys::session_pk(session_id), keys::session_sk(session_id))
            .await?;

        tracing::debug!(%session_id, "Session deleted");
        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: &str) -> Result<()> {
        let items = self.query_user_sessions(user_id).await?;
        let deleted = self.delete_session_items(&items).await?;

        tracing::debug!(%user_id, deleted, "User sessions deleted");
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<()> {
        let now = Utc::now();
        let items = self
            .query_index(&self.config.expiration_index, expired_sessions_condition(now))
            .await?;
        let deleted = self.delete_session_items(&items).await?;

        tracing::debug!(deleted, %now, "Expired sessions deleted");
        Ok(())
    }
}
