//! Conformance suite against a live DynamoDB endpoint.
//!
//! Ignored by default. Run with `cargo xtask integration`, or start DynamoDB
//! Local yourself and run:
//!
//! ```bash
//! AWS_ENDPOINT_URL=http://localhost:8000 cargo test -p dynauth -- --include-ignored
//! ```

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{Duration, Utc};
use dynauth::dynamodb::table::{auth_table_config, ensure_table};
use dynauth::dynamodb::{create_client, keys, ClientConfig, DynamoDbAdapter, DynamoDbAdapterConfig};
use dynauth::{DatabaseSession, DatabaseUser, SessionAdapter, UserAdapter};
use dynauth_core::testing::{database_user, test_adapter};
use serde_json::json;

const LOCAL_ENDPOINT: &str = "http://127.0.0.1:8000";
const EXTRA_ATTRIBUTE: &str = "HashedPassword";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynauth=debug,dynauth_core=info".into()),
        )
        .with_test_writer()
        .try_init();
}

fn client_config() -> ClientConfig {
    let endpoint = std::env::var("AWS_ENDPOINT_URL").unwrap_or_else(|_| LOCAL_ENDPOINT.into());
    ClientConfig::local(endpoint)
}

#[tokio::test]
#[ignore = "requires DynamoDB Local, run with `cargo xtask integration`"]
async fn dynamodb_adapter_passes_conformance_suite() -> anyhow::Result<()> {
    init_tracing();

    let client = create_client(&client_config()).await;
    let config = DynamoDbAdapterConfig::from_env().with_extra_user_attributes([EXTRA_ATTRIBUTE]);

    ensure_table(&client, &auth_table_config().with_table_name(&config.table_name)).await?;

    let adapter = DynamoDbAdapter::new(client, config);
    let user = database_user().with_extra_attribute(EXTRA_ATTRIBUTE, json!("123456"));
    adapter.set_user(&user).await?;

    test_adapter(&adapter, &user).await?;

    adapter.delete_user(&user.id).await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires DynamoDB Local, run with `cargo xtask integration`"]
async fn dynamodb_adapter_rejects_reserved_attribute_names() -> anyhow::Result<()> {
    init_tracing();

    let client = create_client(&client_config()).await;
    let config = DynamoDbAdapterConfig::from_env();

    ensure_table(&client, &auth_table_config().with_table_name(&config.table_name)).await?;

    let adapter = DynamoDbAdapter::new(client, config);
    let user = database_user().with_attribute("Gs1Pk", json!("USER#someone-else"));

    let err = adapter.set_user(&user).await.unwrap_err();
    assert!(matches!(err, dynauth::AdapterError::InvalidData(_)));
    assert!(adapter.get_user(&user.id).await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "requires DynamoDB Local, run with `cargo xtask integration`"]
async fn dynamodb_adapter_round_trips_empty_ids() -> anyhow::Result<()> {
    init_tracing();

    let client = create_client(&client_config()).await;
    let config = DynamoDbAdapterConfig::from_env();

    ensure_table(&client, &auth_table_config().with_table_name(&config.table_name)).await?;

    let adapter = DynamoDbAdapter::new(client, config);
    let user = DatabaseUser::new("");
    let session = DatabaseSession::new("", "", Utc::now() + Duration::hours(1));
    adapter.set_user(&user).await?;
    adapter.set_session(&session).await?;

    let (found_session, found_user) = adapter.get_session_and_user("").await?;
    assert_eq!(found_session, Some(session));
    assert_eq!(found_user, Some(user));

    adapter.delete_session("").await?;
    adapter.delete_user("").await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires DynamoDB Local, run with `cargo xtask integration`"]
async fn dynamodb_session_sweep_deletes_undecodable_items() -> anyhow::Result<()> {
    init_tracing();

    let client = create_client(&client_config()).await;
    let config = DynamoDbAdapterConfig::from_env();

    ensure_table(&client, &auth_table_config().with_table_name(&config.table_name)).await?;

    let adapter = DynamoDbAdapter::new(client, config);
    let user = database_user();
    let session = DatabaseSession::new(
        session_id_for(&user.id, "good"),
        &user.id,
        Utc::now() + Duration::hours(1),
    );
    adapter.set_session(&session).await?;

    // Indexed under the user but missing UserId/ExpiresAt, with a binary attribute.
    let broken_id = session_id_for(&user.id, "broken");
    adapter
        .client()
        .put_item()
        .table_name(&adapter.config().table_name)
        .item(keys::PK, AttributeValue::S(keys::session_pk(&broken_id)))
        .item(keys::SK, AttributeValue::S(keys::session_sk(&broken_id)))
        .item(keys::GS1_PK, AttributeValue::S(keys::session_gsi1_pk(&user.id)))
        .item(keys::GS1_SK, AttributeValue::S(keys::session_gsi1_sk(&broken_id)))
        .item("avatar", AttributeValue::B(Blob::new(vec![1, 2, 3])))
        .send()
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;

    assert!(adapter.get_session(&broken_id).await.is_err());

    adapter.delete_user_sessions(&user.id).await?;

    assert!(adapter.get_session(&session.id).await?.is_none());
    let raw = adapter
        .client()
        .get_item()
        .table_name(&adapter.config().table_name)
        .key(keys::PK, AttributeValue::S(keys::session_pk(&broken_id)))
        .key(keys::SK, AttributeValue::S(keys::session_sk(&broken_id)))
        .send()
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;
    assert!(raw.item.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "requires DynamoDB Local, run with `cargo xtask integration`"]
async fn dynamodb_adapter_rejects_misplaced_extra_attributes() -> anyhow::Result<()> {
    init_tracing();

    let client = create_client(&client_config()).await;
    let config = DynamoDbAdapterConfig::from_env().with_extra_user_attributes([EXTRA_ATTRIBUTE]);

    ensure_table(&client, &auth_table_config().with_table_name(&config.table_name)).await?;

    let adapter = DynamoDbAdapter::new(client, config);
    let user = database_user().with_attribute(EXTRA_ATTRIBUTE, json!("123456"));

    let err = adapter.set_user(&user).await.unwrap_err();
    assert!(matches!(err, dynauth::AdapterError::InvalidData(_)));
    assert!(adapter.get_user(&user.id).await?.is_none());
    Ok(())
}

fn session_id_for(user_id: &str, suffix: &str) -> String {
    format!("{user_id}-{suffix}")
}
