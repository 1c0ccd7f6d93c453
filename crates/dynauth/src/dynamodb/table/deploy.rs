//! Table deployment operations (Imperative Shell).

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    self as sdk, AttributeDefinition, CreateGlobalSecondaryIndexAction, GlobalSecondaryIndex,
    GlobalSecondaryIndexUpdate, KeySchemaElement, KeyType, Projection, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;

use super::config::{AttributeType, BillingMode, GsiConfig, KeyAttribute, ProjectionType, TableConfig};
use super::error::{Result, TableError};
use super::planning::{
    calculate_deploy_plan, DeployPlan, DestroyPlan, GsiState, GsiStatus, TableState, TableStatus,
};

const ACTIVATION_POLL_ATTEMPTS: u32 = 60;
const ACTIVATION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Create or update the table so it matches `config`, then wait for it to be usable.
///
/// Safe to call repeatedly. Returns the plan that was applied.
pub async fn ensure_table(client: &Client, config: &TableConfig) -> Result<DeployPlan> {
    let current = get_table_state(client, &config.table_name).await?;
    let plan = calculate_deploy_plan(current.as_ref(), config);

    execute_deploy_plan(client, &plan).await?;

    if let (DeployPlan::NoChanges { .. }, Some(state)) = (&plan, &current) {
        if !state.is_ready() {
            wait_for_table_active(client, &config.table_name).await?;
        }
    }

    tracing::info!(table = %config.table_name, "Table ready");
    Ok(plan)
}

/// Execute a deploy plan.
pub async fn execute_deploy_plan(client: &Client, plan: &DeployPlan) -> Result<()> {
    match plan {
        DeployPlan::CreateTable { config } => {
            create_table(client, config).await?;
            wait_for_table_active(client, &config.table_name).await?;
        }
        DeployPlan::AddGsis {
            table_name,
            gsis_to_add,
        } => {
            // DynamoDB accepts one index creation per UpdateTable call
            for gsi in gsis_to_add {
                add_gsi(client, table_name, gsi).await?;
                wait_for_table_active(client, table_name).await?;
            }
        }
        DeployPlan::NoChanges { .. } => {}
    }
    Ok(())
}

/// Execute a destroy plan.
pub async fn execute_destroy_plan(client: &Client, plan: &DestroyPlan) -> Result<()> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            client
                .delete_table()
                .table_name(table_name)
                .send()
                .await
                .map_err(aws_sdk_dynamodb::Error::from)?;
            tracing::info!(table = %table_name, "Table deleted");
        }
        DestroyPlan::AlreadyGone { .. } => {}
    }
    Ok(())
}

/// Fetches current table state, returns None if the table doesn't exist.
pub async fn get_table_state(client: &Client, table_name: &str) -> Result<Option<TableState>> {
    let response = match client.describe_table().table_name(table_name).send().await {
        Ok(response) => response,
        Err(err)
            if err
                .as_service_error()
                .is_some_and(|e| e.is_resource_not_found_exception()) =>
        {
            return Ok(None);
        }
        Err(err) => return Err(aws_sdk_dynamodb::Error::from(err).into()),
    };

    let table = response.table().ok_or_else(|| TableError::MissingDescription {
        table_name: table_name.to_string(),
    })?;

    let gsis = table
        .global_secondary_indexes()
        .iter()
        .map(|gsi| GsiState {
            name: gsi.index_name().unwrap_or_default().to_string(),
            status: match gsi.index_status() {
                Some(sdk::IndexStatus::Creating) => GsiStatus::Creating,
                Some(sdk::IndexStatus::Updating) => GsiStatus::Updating,
                Some(sdk::IndexStatus::Deleting) => GsiStatus::Deleting,
                // DynamoDB Local omits IndexStatus
                _ => GsiStatus::Active,
            },
        })
        .collect();

    let status = match table.table_status() {
        Some(sdk::TableStatus::Creating) => TableStatus::Creating,
        Some(sdk::TableStatus::Updating) => TableStatus::Updating,
        Some(sdk::TableStatus::Deleting) => TableStatus::Deleting,
        _ => TableStatus::Active,
    };

    Ok(Some(TableState { status, gsis }))
}

/// Poll DescribeTable until the table and all of its indexes are active.
pub async fn wait_for_table_active(client: &Client, table_name: &str) -> Result<()> {
    for attempt in 1..=ACTIVATION_POLL_ATTEMPTS {
        if let Some(state) = get_table_state(client, table_name).await? {
            if state.is_ready() {
                return Ok(());
            }
        }
        tracing::debug!(table = %table_name, attempt, "Waiting for table to become active");
        tokio::time::sleep(ACTIVATION_POLL_INTERVAL).await;
    }

    Err(TableError::ActivationTimeout {
        table_name: table_name.to_string(),
    })
}

async fn create_table(client: &Client, config: &TableConfig) -> Result<()> {
    let mut key_schema = vec![key_element(&config.partition_key, KeyType::Hash)?];
    let mut attribute_definitions = Vec::new();
    push_definition(&mut attribute_definitions, &config.partition_key)?;

    if let Some(sk) = &config.sort_key {
        key_schema.push(key_element(sk, KeyType::Range)?);
        push_definition(&mut attribute_definitions, sk)?;
    }

    let mut request = client
        .create_table()
        .table_name(&config.table_name)
        .billing_mode(to_billing_mode(config.billing_mode));

    for gsi in &config.gsis {
        push_gsi_definitions(&mut attribute_definitions, gsi)?;
        request = request.global_secondary_indexes(
            GlobalSecondaryIndex::builder()
                .index_name(&gsi.name)
                .set_key_schema(Some(gsi_key_schema(gsi)?))
                .projection(to_projection(&gsi.projection))
                .build()?,
        );
    }

    request
        .set_key_schema(Some(key_schema))
        .set_attribute_definitions(Some(attribute_definitions))
        .send()
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;

    tracing::info!(table = %config.table_name, "Table creation started");
    Ok(())
}

async fn add_gsi(client: &Client, table_name: &str, gsi: &GsiConfig) -> Result<()> {
    let mut attribute_definitions = Vec::new();
    push_gsi_definitions(&mut attribute_definitions, gsi)?;

    client
        .update_table()
        .table_name(table_name)
        .set_attribute_definitions(Some(attribute_definitions))
        .global_secondary_index_updates(
            GlobalSecondaryIndexUpdate::builder()
                .create(
                    CreateGlobalSecondaryIndexAction::builder()
                        .index_name(&gsi.name)
                        .set_key_schema(Some(gsi_key_schema(gsi)?))
                        .projection(to_projection(&gsi.projection))
                        .build()?,
                )
                .build(),
        )
        .send()
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;

    tracing::info!(table = %table_name, index = %gsi.name, "Index creation started");
    Ok(())
}

fn key_element(key: &KeyAttribute, key_type: KeyType) -> Result<KeySchemaElement> {
    Ok(KeySchemaElement::builder()
        .attribute_name(&key.name)
        .key_type(key_type)
        .build()?)
}

fn gsi_key_schema(gsi: &GsiConfig) -> Result<Vec<KeySchemaElement>> {
    let mut schema = vec![key_element(&gsi.partition_key, KeyType::Hash)?];
    if let Some(sk) = &gsi.sort_key {
        schema.push(key_element(sk, KeyType::Range)?);
    }
    Ok(schema)
}

/// Adds an attribute definition unless one with the same name exists.
fn push_definition(definitions: &mut Vec<AttributeDefinition>, key: &KeyAttribute) -> Result<()> {
    if definitions
        .iter()
        .any(|d| d.attribute_name() == key.name.as_str())
    {
        return Ok(());
    }

    definitions.push(
        AttributeDefinition::builder()
            .attribute_name(&key.name)
            .attribute_type(to_scalar_type(key.attribute_type))
            .build()?,
    );
    Ok(())
}

fn push_gsi_definitions(definitions: &mut Vec<AttributeDefinition>, gsi: &GsiConfig) -> Result<()> {
    push_definition(definitions, &gsi.partition_key)?;
    if let Some(sk) = &gsi.sort_key {
        push_definition(definitions, sk)?;
    }
    Ok(())
}

fn to_scalar_type(attr_type: AttributeType) -> ScalarAttributeType {
    match attr_type {
        AttributeType::String => ScalarAttributeType::S,
    }
}

fn to_billing_mode(mode: BillingMode) -> sdk::BillingMode {
    match mode {
        BillingMode::PayPerRequest => sdk::BillingMode::PayPerRequest,
    }
}

fn to_projection(projection: &ProjectionType) -> Projection {
    match projection {
        ProjectionType::All => Projection::builder()
            .projection_type(sdk::ProjectionType::All)
            .build(),
    }
}
