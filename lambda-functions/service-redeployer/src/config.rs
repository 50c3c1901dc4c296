use crate::arn::PartitionMode;
use crate::error::RedeployError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_ecs::error::DisplayErrorContext;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_DEADLINE_MARGIN_MS: u64 = 500;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .finish()
    }
}

/// Region and credentials resolved from the ambient environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    pub region: String,
    pub credentials: Credentials,
}

impl CloudConfig {
    pub fn validate(&self) -> Result<(), RedeployError> {
        if self.region.chars().count() < 2 {
            return Err(RedeployError::Config(format!(
                "resolved region '{}' is empty or too short",
                self.region
            )));
        }

        if self.credentials.access_key_id.is_empty()
            || self.credentials.secret_access_key.is_empty()
        {
            return Err(RedeployError::Config(
                "resolved credentials have an empty access key id or secret access key"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    async fn resolve(&self) -> Result<CloudConfig, RedeployError>;
}

/// Resolves region and credentials through the default AWS provider chain.
#[derive(Debug, Default)]
pub struct AwsConfigProvider;

#[async_trait]
impl ConfigProvider for AwsConfigProvider {
    async fn resolve(&self) -> Result<CloudConfig, RedeployError> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let region = config
            .region()
            .map(|region| region.to_string())
            .unwrap_or_default();

        let provider = config
            .credentials_provider()
            .ok_or_else(|| RedeployError::Config("no credentials provider found".to_string()))?;

        let credentials = provider
            .provide_credentials()
            .await
            .map_err(|e| {
                RedeployError::Config(format!(
                    "failed to load credentials: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(CloudConfig {
            region,
            credentials: Credentials {
                access_key_id: credentials.access_key_id().to_string(),
                secret_access_key: credentials.secret_access_key().to_string(),
                session_token: credentials.session_token().map(str::to_string),
            },
        })
    }
}

/// Function settings read from the Lambda environment at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeployerSettings {
    pub partition_mode: PartitionMode,
    pub deadline_margin: Duration,
    pub ecs_endpoint_url: Option<String>,
}

impl Default for RedeployerSettings {
    fn default() -> Self {
        Self {
            partition_mode: PartitionMode::Detect,
            deadline_margin: Duration::from_millis(DEFAULT_DEADLINE_MARGIN_MS),
            ecs_endpoint_url: None,
        }
    }
}

impl RedeployerSettings {
    pub fn from_env() -> Result<Self, RedeployError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, RedeployError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let partition_mode = match lookup("REDEPLOY_PARTITION") {
            Some(value) => value.parse()?,
            None => PartitionMode::Detect,
        };

        let deadline_margin = match lookup("REDEPLOY_DEADLINE_MARGIN_MS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| {
                    RedeployError::Config(format!(
                        "REDEPLOY_DEADLINE_MARGIN_MS must be a number of milliseconds, got '{}'",
                        value
                    ))
                })?,
            None => Duration::from_millis(DEFAULT_DEADLINE_MARGIN_MS),
        };

        let ecs_endpoint_url = lookup("ECS_ENDPOINT_URL").filter(|url| !url.trim().is_empty());

        Ok(Self {
            partition_mode,
            deadline_margin,
            ecs_endpoint_url,
        })
    }
}
