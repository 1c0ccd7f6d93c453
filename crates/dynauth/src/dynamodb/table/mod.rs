//! Table bootstrap for the auth table.
//!
//! Follows the plan/execute split: `planning` decides what to change from
//! the observed [`TableState`], `deploy` talks to DynamoDB.

mod config;
mod deploy;
mod error;
mod planning;

pub use config::{
    auth_table_config, AttributeType, BillingMode, GsiConfig, KeyAttribute, ProjectionType,
    TableConfig,
};
pub use deploy::{
    ensure_table, execute_deploy_plan, execute_destroy_plan, get_table_state,
    wait_for_table_active,
};
pub use error::{Result, TableError};
pub use planning::{
    calculate_deploy_plan, calculate_destroy_plan, format_deploy_plan, format_destroy_plan,
    DeployPlan, DestroyPlan, GsiState, GsiStatus, TableState, TableStatus,
};
