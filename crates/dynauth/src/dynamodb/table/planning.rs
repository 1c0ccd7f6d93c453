//! Pure functions for calculating deployment plans (Functional Core).

use super::config::{GsiConfig, TableConfig};

/// Represents the current state of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub status: TableStatus,
    pub gsis: Vec<GsiState>,
}

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// GSI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsiState {
    pub name: String,
    pub status: GsiStatus,
}

/// GSI status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsiStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

impl TableState {
    /// Whether the table and every one of its indexes accept traffic.
    pub fn is_ready(&self) -> bool {
        self.status == TableStatus::Active && self.gsis.iter().all(|g| g.status == GsiStatus::Active)
    }
}

/// Planned changes for deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { config: TableConfig },
    /// Table exists, GSIs need to be added.
    AddGsis {
        table_name: String,
        gsis_to_add: Vec<GsiConfig>,
    },
    /// Table is up to date, no changes needed.
    NoChanges { table_name: String },
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

/// Pure function: Calculate what changes are needed to reach desired state.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableConfig) -> DeployPlan {
    match current {
        None => DeployPlan::CreateTable {
            config: desired.clone(),
        },
        Some(state) => {
            // Find GSIs that exist in desired but not in current
            let existing_gsi_names: Vec<&str> =
                state.gsis.iter().map(|g| g.name.as_str()).collect();

            let gsis_to_add: Vec<GsiConfig> = desired
                .gsis
                .iter()
                .filter(|gsi| !existing_gsi_names.contains(&gsi.name.as_str()))
                .cloned()
                .collect();

            if gsis_to_add.is_empty() {
                DeployPlan::NoChanges {
                    table_name: desired.table_name.clone(),
                }
            } else {
                DeployPlan::AddGsis {
                    table_name: desired.table_name.clone(),
                    gsis_to_add,
                }
            }
        }
    }
}

/// Pure function: Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

/// Pure function: Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { config } => {
            let mut lines = vec![
                format!("+ Create table: {}", config.table_name),
                format!("  Partition key: {} (S)", config.partition_key.name),
            ];
            if let Some(sk) = &config.sort_key {
                lines.push(format!("  Sort key: {} (S)", sk.name));
            }
            for gsi in &config.gsis {
                lines.push(format!("  + GSI: {}", gsi.name));
                lines.push(format!("    Partition key: {} (S)", gsi.partition_key.name));
                if let Some(sk) = &gsi.sort_key {
                    lines.push(format!("    Sort key: {} (S)", sk.name));
                }
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::AddGsis {
            table_name,
            gsis_to_add,
        } => {
            let mut lines = vec![format!("~ Update table: {}", table_name)];
            for gsi in gsis_to_add {
                lines.push(format!("  + Add GSI: {}", gsi.name));
            }
            lines
        }
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{}' is up to date", table_name)]
        }
    }
}

/// Pure function: Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!(
                "- Delete table: {} (ALL DATA WILL BE LOST)",
                table_name
            )]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{}' does not exist", table_name)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::table::config::auth_table_config;

    fn state_with_gsis(names: &[&str]) -> TableState {
        TableState {
            status: TableStatus::Active,
            gsis: names
                .iter()
                .map(|name| GsiState {
                    name: name.to_string(),
                    status: GsiStatus::Active,
                })
                .collect(),
        }
    }

    #[test]
    fn test_missing_table_is_created() {
        let desired = auth_table_config();
        let plan = calculate_deploy_plan(None, &desired);

        assert_eq!(plan, DeployPlan::CreateTable { config: desired });
    }

    #[test]
    fn test_missing_gsi_is_added() {
        let desired = auth_table_config();
        let plan = calculate_deploy_plan(Some(&state_with_gsis(&["Gs1"])), &desired);

        match plan {
            DeployPlan::AddGsis {
                table_name,
                gsis_to_add,
            } => {
                assert_eq!(table_name, "LuciaAuthTable");
                assert_eq!(gsis_to_add.len(), 1);
                assert_eq!(gsis_to_add[0].name, "Gs2");
            }
            other => panic!("unexpected plan: {:?}", other),
        }
    }

    #[test]
    fn test_complete_table_needs_no_changes() {
        let desired = auth_table_config();
        let plan = calculate_deploy_plan(Some(&state_with_gsis(&["Gs1", "Gs2"])), &desired);

        assert_eq!(
            plan,
            DeployPlan::NoChanges {
                table_name: "LuciaAuthTable".to_string()
            }
        );
    }

    #[test]
    fn test_destroy_plan() {
        let state = state_with_gsis(&[]);

        assert_eq!(
            calculate_destroy_plan(Some(&state), "auth"),
            DestroyPlan::DeleteTable {
                table_name: "auth".to_string()
            }
        );
        assert_eq!(
            calculate_destroy_plan(None, "auth"),
            DestroyPlan::AlreadyGone {
                table_name: "auth".to_string()
            }
        );
    }

    #[test]
    fn test_is_ready_requires_active_indexes() {
        let mut state = state_with_gsis(&["Gs1", "Gs2"]);
        assert!(state.is_ready());

        state.gsis[1].status = GsiStatus::Creating;
        assert!(!state.is_ready());

        state.gsis[1].status = GsiStatus::Active;
        state.status = TableStatus::Creating;
        assert!(!state.is_ready());
    }

    #[test]
    fn test_format_create_plan() {
        let lines = format_deploy_plan(&DeployPlan::CreateTable {
            config: auth_table_config(),
        });

        assert_eq!(lines[0], "+ Create table: LuciaAuthTable");
        assert!(lines.contains(&"  + GSI: Gs1".to_string()));
        assert!(lines.contains(&"    Partition key: Gs2Pk (S)".to_string()));
        assert_eq!(lines.last().unwrap(), "  Billing: PAY_PER_REQUEST");
    }

    #[test]
    fn test_format_destroy_plan() {
        let lines = format_destroy_plan(&DestroyPlan::AlreadyGone {
            table_name: "auth".to_string(),
        });
        assert_eq!(lines, vec!["= Table 'auth' does not exist".to_string()]);
    }
}
