use crate::arn::service_arn;
use crate::config::{AwsConfigProvider, ConfigProvider, RedeployerSettings};
use crate::ecs::{AwsEcsConnector, EcsConnector, UpdateServiceRequest};
use crate::error::{RedeployError, Stage};
use crate::{AlarmEvent, Response};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Forces an ECS service to redeploy with its current definition.
///
/// Holds no per-invocation state, so a single instance is shared across
/// invocations of the same Lambda execution environment.
pub struct RedeployAction {
    config_provider: Arc<dyn ConfigProvider>,
    connector: Arc<dyn EcsConnector>,
    settings: RedeployerSettings,
}

impl RedeployAction {
    pub fn new(
        config_provider: Arc<dyn ConfigProvider>,
        connector: Arc<dyn EcsConnector>,
        settings: RedeployerSettings,
    ) -> Self {
        Self {
            config_provider,
            connector,
            settings,
        }
    }

    pub fn for_aws(settings: RedeployerSettings) -> Self {
        let connector = AwsEcsConnector::new(settings.ecs_endpoint_url.clone());
        Self::new(Arc::new(AwsConfigProvider), Arc::new(connector), settings)
    }

    pub fn settings(&self) -> &RedeployerSettings {
        &self.settings
    }

    pub async fn execute(&self, event: &AlarmEvent) -> Result<Response, RedeployError> {
        self.execute_until(event, None).await
    }

    /// Runs the pipeline, aborting any remote call still in flight at `deadline`.
    pub async fn execute_until(
        &self,
        event: &AlarmEvent,
        deadline: Option<Instant>,
    ) -> Result<Response, RedeployError> {
        info!(
            account = %event.account,
            cluster = %event.cluster,
            service = %event.service,
            alarm_name = %event.alarm_name,
            "Redeploy requested by alarm"
        );

        let result = self.redeploy(event, deadline).await;

        if let Err(err) = &result {
            error!(
                stage = %err.stage(),
                cluster = %event.cluster,
                service = %event.service,
                error = %err,
                "Redeploy failed"
            );
        }

        result
    }

    async fn redeploy(
        &self,
        event: &AlarmEvent,
        deadline: Option<Instant>,
    ) -> Result<Response, RedeployError> {
        let config = bounded(deadline, Stage::Configuring, self.config_provider.resolve()).await?;
        config.validate()?;

        let partition = self.settings.partition_mode.resolve(&config.region)?;
        let arn = service_arn(
            partition,
            &config.region,
            &event.account,
            &event.cluster,
            &event.service,
        );
        debug!(
            stage = %Stage::Identifying,
            arn = %arn,
            partition = %partition,
            "Built service ARN"
        );

        let ecs = self.connector.connect(&config);

        let services = bounded(deadline, Stage::Fetching, async {
            ecs.describe_services(&event.cluster, std::slice::from_ref(&arn))
                .await
                .map_err(|e| RedeployError::Lookup(format!("describe {}: {}", arn, e)))
        })
        .await?;

        let description = services
            .into_iter()
            .next()
            .ok_or_else(|| RedeployError::Lookup(format!("can't find service by arn: {}", arn)))?;

        debug!(
            stage = %Stage::Constructing,
            status = description.status.as_deref().unwrap_or_default(),
            task_definition = description.task_definition.as_deref().unwrap_or_default(),
            desired_count = description.desired_count,
            "Building forced redeployment"
        );
        let request = UpdateServiceRequest::force_redeploy(description);
        let task_definition = request.task_definition.clone();
        let desired_count = request.desired_count;

        bounded(deadline, Stage::Updating, async {
            ecs.update_service(request)
                .await
                .map_err(|e| RedeployError::Update(format!("update {}: {}", arn, e)))
        })
        .await?;

        info!(
            service = %event.service,
            cluster = %event.cluster,
            arn = %arn,
            "Update service succeeded"
        );

        Ok(Response::builder()
            .status("success".to_string())
            .service(event.service.clone())
            .cluster(event.cluster.clone())
            .service_arn(arn)
            .alarm_name(event.alarm_name.clone())
            .maybe_task_definition(task_definition)
            .desired_count(desired_count)
            .timestamp(Utc::now().to_rfc3339())
            .build())
    }
}

async fn bounded<T, F>(
    deadline: Option<Instant>,
    stage: Stage,
    fut: F,
) -> Result<T, RedeployError>
where
    F: Future<Output = Result<T, RedeployError>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| RedeployError::DeadlineExceeded { stage })?,
        None => fut.await,
    }
}

/// Time left before `deadline_ms` (epoch milliseconds), less `margin`.
/// A zero deadline means the runtime gave none.
pub fn remaining_budget(deadline_ms: u64, now_ms: u64, margin: Duration) -> Option<Duration> {
    if deadline_ms == 0 {
        return None;
    }
    let remaining = Duration::from_millis(deadline_ms.saturating_sub(now_ms));
    Some(remaining.saturating_sub(margin))
}

/// Converts a Lambda context deadline into a tokio instant.
pub fn invocation_deadline(deadline_ms: u64, margin: Duration) -> Option<Instant> {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();

    remaining_budget(deadline_ms, now_ms, margin).map(|budget| Instant::now() + budget)
}
