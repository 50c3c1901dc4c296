use crate::config::CloudConfig;
use async_trait::async_trait;
use aws_sdk_ecs::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::types::{
    CapacityProviderStrategyItem, DeploymentConfiguration, LoadBalancer, PlacementStrategy,
    Service,
};
use aws_sdk_ecs::Client as EcsClient;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum EcsOpsError {
    #[error("AWS ECS API error: {0}")]
    AwsSdkError(String),
}

/// Snapshot of an ECS service as returned by DescribeServices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceDescription {
    pub service_name: Option<String>,
    pub status: Option<String>,
    pub service_arn: Option<String>,
    pub cluster_arn: Option<String>,
    pub task_definition: Option<String>,
    pub desired_count: i32,
    pub capacity_provider_strategy: Option<Vec<CapacityProviderStrategyItem>>,
    pub deployment_configuration: Option<DeploymentConfiguration>,
    pub placement_strategy: Option<Vec<PlacementStrategy>>,
    pub load_balancers: Option<Vec<LoadBalancer>>,
    pub health_check_grace_period_seconds: Option<i32>,
}

impl From<Service> for ServiceDescription {
    fn from(service: Service) -> Self {
        Self {
            service_name: service.service_name,
            status: service.status,
            service_arn: service.service_arn,
            cluster_arn: service.cluster_arn,
            task_definition: service.task_definition,
            desired_count: service.desired_count,
            capacity_provider_strategy: service.capacity_provider_strategy,
            deployment_configuration: service.deployment_configuration,
            placement_strategy: service.placement_strategy,
            load_balancers: service.load_balancers,
            health_check_grace_period_seconds: service.health_check_grace_period_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateServiceRequest {
    pub service: Option<String>,
    pub cluster: Option<String>,
    pub task_definition: Option<String>,
    pub desired_count: i32,
    pub capacity_provider_strategy: Option<Vec<CapacityProviderStrategyItem>>,
    pub deployment_configuration: Option<DeploymentConfiguration>,
    pub placement_strategy: Option<Vec<PlacementStrategy>>,
    pub load_balancers: Option<Vec<LoadBalancer>>,
    pub health_check_grace_period_seconds: Option<i32>,
    pub force_new_deployment: bool,
}

impl UpdateServiceRequest {
    /// Re-submits the service exactly as described, with a forced new deployment.
    ///
    /// The destructuring below is exhaustive on purpose: a field added to
    /// `ServiceDescription` does not compile until it is mapped here or
    /// explicitly ignored.
    pub fn force_redeploy(description: ServiceDescription) -> Self {
        let ServiceDescription {
            service_name: _,
            status: _,
            service_arn,
            cluster_arn,
            task_definition,
            desired_count,
            capacity_provider_strategy,
            deployment_configuration,
            placement_strategy,
            load_balancers,
            health_check_grace_period_seconds,
        } = description;

        Self {
            service: service_arn,
            cluster: cluster_arn,
            task_definition,
            desired_count,
            capacity_provider_strategy,
            deployment_configuration,
            placement_strategy,
            load_balancers,
            health_check_grace_period_seconds,
            force_new_deployment: true,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EcsOps: Send + Sync {
    async fn describe_services(
        &self,
        cluster: &str,
        services: &[String],
    ) -> Result<Vec<ServiceDescription>, EcsOpsError>;

    async fn update_service(
        &self,
        request: UpdateServiceRequest,
    ) -> Result<Option<ServiceDescription>, EcsOpsError>;
}

/// Builds an `EcsOps` bound to the resolved region and credentials.
pub trait EcsConnector: Send + Sync {
    fn connect(&self, config: &CloudConfig) -> Arc<dyn EcsOps>;
}

pub struct AwsEcsOps {
    client: EcsClient,
}

impl AwsEcsOps {
    pub fn new(client: EcsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EcsOps for AwsEcsOps {
    async fn describe_services(
        &self,
        cluster: &str,
        services: &[String],
    ) -> Result<Vec<ServiceDescription>, EcsOpsError> {
        let output = self
            .client
            .describe_services()
            .cluster(cluster)
            .set_services(Some(services.to_vec()))
            .send()
            .await
            .map_err(|e| EcsOpsError::AwsSdkError(DisplayErrorContext(&e).to_string()))?;

        for failure in output.failures() {
            warn!(
                cluster = %cluster,
                arn = failure.arn().unwrap_or_default(),
                reason = failure.reason().unwrap_or_default(),
                detail = failure.detail().unwrap_or_default(),
                "DescribeServices reported a failure"
            );
        }

        Ok(output
            .services
            .unwrap_or_default()
            .into_iter()
            .map(ServiceDescription::from)
            .collect())
    }

    async fn update_service(
        &self,
        request: UpdateServiceRequest,
    ) -> Result<Option<ServiceDescription>, EcsOpsError> {
        let output = self
            .client
            .update_service()
            .set_service(request.service)
            .set_cluster(request.cluster)
            .set_task_definition(request.task_definition)
            .desired_count(request.desired_count)
            .set_capacity_provider_strategy(request.capacity_provider_strategy)
            .set_deployment_configuration(request.deployment_configuration)
            .set_placement_strategy(request.placement_strategy)
            .set_load_balancers(request.load_balancers)
            .set_health_check_grace_period_seconds(request.health_check_grace_period_seconds)
            .force_new_deployment(request.force_new_deployment)
            .send()
            .await
            .map_err(|e| EcsOpsError::AwsSdkError(DisplayErrorContext(&e).to_string()))?;

        Ok(output.service.map(ServiceDescription::from))
    }
}

/// Creates ECS clients from the credentials resolved for the invocation.
#[derive(Debug, Clone, Default)]
pub struct AwsEcsConnector {
    endpoint_url: Option<String>,
}

impl AwsEcsConnector {
    pub fn new(endpoint_url: Option<String>) -> Self {
        Self { endpoint_url }
    }
}

impl EcsConnector for AwsEcsConnector {
    fn connect(&self, config: &CloudConfig) -> Arc<dyn EcsOps> {
        let credentials = Credentials::new(
            config.credentials.access_key_id.clone(),
            config.credentials.secret_access_key.clone(),
            config.credentials.session_token.clone(),
            None,
            "service-redeployer",
        );

        let mut builder = aws_sdk_ecs::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint_url) = &self.endpoint_url {
            info!(endpoint_url = %endpoint_url, "Using ECS endpoint override");
            builder = builder.endpoint_url(endpoint_url);
        }

        Arc::new(AwsEcsOps::new(EcsClient::from_conf(builder.build())))
    }
}
