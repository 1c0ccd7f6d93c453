//! Integration test infrastructure.
//!
//! Runs the adapter conformance suite against DynamoDB Local.
//!
//! # Usage
//!
//! ```bash
//! # Start DynamoDB Local, run the suite, stop the container
//! cargo xtask integration
//!
//! # Skip container management (assumes DynamoDB Local is already running)
//! cargo xtask integration --no-docker
//! ```

mod containers;
mod error;

pub use error::{IntegrationError, Result};

use std::time::Duration;

use dynauth::dynamodb::table::{auth_table_config, ensure_table};
use dynauth::dynamodb::{create_client, ClientConfig, DEFAULT_REGION, DEFAULT_TABLE_NAME};

use crate::prelude::*;
use containers::{
    detect_runtime, is_running, start_container, stop_container, wait_for_health_or_stop,
    ContainerRuntime, DYNAMODB_SPEC,
};

/// Integration test command.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Run the adapter conformance suite against DynamoDB Local.

This command starts a DynamoDB Local container (docker or podman), waits
until it answers, creates the auth table and runs the ignored integration
tests of the dynauth crate. The container is stopped afterward.

Environment variables:
  AWS_ENDPOINT_URL    - Override DynamoDB endpoint (default: http://localhost:8000)")]
pub struct IntegrationCommand {
    /// Skip container management (assume DynamoDB Local is already running).
    #[arg(long)]
    pub no_docker: bool,

    /// Keep containers running after tests complete.
    #[arg(long)]
    pub keep_containers: bool,

    /// Timeout in seconds for container health checks.
    #[arg(long, default_value = "30")]
    pub health_timeout: u64,

    /// Table the suite runs against.
    #[arg(long, default_value = DEFAULT_TABLE_NAME)]
    pub table_name: String,
}

/// Main entry point for integration command.
pub async fn run(command: IntegrationCommand, global: crate::Global) -> Result<()> {
    if !global.is_silent() {
        aprintln!("{}", p_b("Integration Tests"));
        aprintln!();
    }

    let endpoint = std::env::var("AWS_ENDPOINT_URL").unwrap_or_else(|_| DYNAMODB_SPEC.endpoint());

    let runtime = if command.no_docker {
        if !global.is_silent() {
            aprintln!(
                "{} {}",
                p_y("⚠️"),
                "Skipping DynamoDB container management (--no-docker)"
            );
        }
        None
    } else {
        Some(detect_runtime().await?)
    };

    let started = match runtime {
        Some(rt) => start_dynamodb_container(rt, command.health_timeout, &global).await?,
        None => false,
    };

    let outcome = run_suite(&endpoint, &command.table_name, &global).await;

    if let (Some(rt), true) = (runtime, started) {
        if command.keep_containers {
            if !global.is_silent() {
                aprintln!(
                    "{} {}",
                    p_y("⚠️"),
                    "Containers left running (--keep-containers)"
                );
            }
        } else {
            if !global.is_silent() {
                aprintln!("{} {}", p_b("🐳"), "Stopping DynamoDB Local container...");
            }
            stop_container(rt, DYNAMODB_SPEC.name).await;
        }
    }

    aprintln!();
    match &outcome {
        Ok(()) => aprintln!("{} {}", p_g("✅"), p_g("All integration tests passed!")),
        Err(err) => aprintln!("{} {}", p_r("❌"), p_r(&err.to_string())),
    }
    outcome
}

/// Creates the table and runs the test suite against `endpoint`.
async fn run_suite(endpoint: &str, table_name: &str, global: &crate::Global) -> Result<()> {
    if !global.is_silent() {
        aprintln!("{} {}", p_b("📦"), "Setting up test table...");
    }

    let client = create_client(&ClientConfig::local(endpoint)).await;
    ensure_table(&client, &auth_table_config().with_table_name(table_name)).await?;

    if !global.is_silent() {
        aprintln!("{} {}", p_g("✅"), "Test table ready");
        aprintln!("{} {}", p_b("🔧"), p_b("Running DynamoDB integration tests..."));
    }

    let mut cmd = tokio::process::Command::new("cargo");
    cmd.args(test_args());
    for (key, value) in test_environment(endpoint, table_name) {
        cmd.env(key, value);
    }

    let status = cmd.status().await?;
    if !status.success() {
        return Err(IntegrationError::TestFailed(format!(
            "cargo test exited with {}",
            status
        )));
    }

    Ok(())
}

/// Starts DynamoDB Local unless it is already running.
///
/// Returns whether this run started the container.
async fn start_dynamodb_container(
    runtime: ContainerRuntime,
    timeout_secs: u64,
    global: &crate::Global,
) -> Result<bool> {
    if is_running(runtime, DYNAMODB_SPEC.name).await? {
        if !global.is_silent() {
            aprintln!(
                "{} {}",
                p_y("⚠️"),
                "DynamoDB Local container already running"
            );
        }
        return Ok(false);
    }

    if !global.is_silent() {
        aprintln!("{} {}", p_b("🐳"), "Starting DynamoDB Local container...");
    }

    start_container(runtime, &DYNAMODB_SPEC).await?;

    if !global.is_silent() {
        aprintln!(
            "{} {}",
            p_b("⏳"),
            format!("Waiting for container health (max {}s)...", timeout_secs)
        );
    }

    wait_for_health_or_stop(runtime, &DYNAMODB_SPEC, Duration::from_secs(timeout_secs)).await?;

    if !global.is_silent() {
        aprintln!("{} {}", p_g("✅"), "DynamoDB Local is ready");
    }

    Ok(true)
}

/// Arguments for the `cargo` invocation running the ignored tests.
fn test_args() -> [&'static str; 5] {
    ["test", "-p", "dynauth", "--", "--include-ignored"]
}

/// Environment pointing the test suite at DynamoDB Local.
fn test_environment(endpoint: &str, table_name: &str) -> Vec<(&'static str, String)> {
    vec![
        ("AWS_ENDPOINT_URL", endpoint.to_string()),
        ("AWS_REGION", DEFAULT_REGION.to_string()),
        ("AWS_ACCESS_KEY_ID", "test".to_string()),
        ("AWS_SECRET_ACCESS_KEY", "test".to_string()),
        ("DYNAMODB_TABLE_NAME", table_name.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_include_ignored_tests() {
        assert_eq!(
            test_args(),
            ["test", "-p", "dynauth", "--", "--include-ignored"]
        );
    }

    #[test]
    fn test_environment_points_at_endpoint() {
        let vars = test_environment("http://localhost:8000", "auth-test");

        assert!(vars.contains(&("AWS_ENDPOINT_URL", "http://localhost:8000".to_string())));
        assert!(vars.contains(&("AWS_REGION", "us-east-1".to_string())));
        assert!(vars.contains(&("DYNAMODB_TABLE_NAME", "auth-test".to_string())));
    }
}
