//! AWS SDK client setup.

use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::Client;

/// Region used when `AWS_REGION` is not set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Static credentials, for DynamoDB Local which accepts any key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// AWS client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Custom endpoint URL (for local DynamoDB).
    pub endpoint_url: Option<String>,
    /// AWS region.
    pub region: String,
    /// Overrides the default credential chain when set.
    pub credentials: Option<StaticCredentials>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint_url: std::env::var("AWS_ENDPOINT_URL").ok(),
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            credentials: None,
        }
    }
}

impl ClientConfig {
    /// Configuration for a DynamoDB Local instance with dummy credentials.
    pub fn local(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: Some(endpoint_url.into()),
            region: DEFAULT_REGION.to_string(),
            credentials: Some(StaticCredentials {
                access_key_id: "dummy".to_string(),
                secret_access_key: "dummy".to_string(),
            }),
        }
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({})", url),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}

/// Creates a DynamoDB client with the given configuration.
pub async fn create_client(config: &ClientConfig) -> Client {
    let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint_url {
        sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
    }

    if let Some(credentials) = &config.credentials {
        sdk_config_loader = sdk_config_loader.credentials_provider(Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None,
            None,
            "dynauth-static",
        ));
    }

    let sdk_config = sdk_config_loader.load().await;
    tracing::debug!(target = %config.target_display(), "DynamoDB client created");
    Client::new(&sdk_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_config() {
        let config = ClientConfig::local("http://127.0.0.1:8000");

        assert_eq!(config.endpoint_url.as_deref(), Some("http://127.0.0.1:8000"));
        assert_eq!(config.region, "us-east-1");
        assert!(config.credentials.is_some());
    }

    #[test]
    fn test_target_display() {
        let local = ClientConfig::local("http://localhost:8000");
        assert_eq!(local.target_display(), "Local DynamoDB (http://localhost:8000)");

        let remote = ClientConfig {
            endpoint_url: None,
            region: "eu-west-1".to_string(),
            credentials: None,
        };
        assert_eq!(remote.target_display(), "AWS DynamoDB (region: eu-west-1)");
    }
}
