mod action;
mod arn;
mod config;
mod ecs;
mod error;

use bon::Builder;
use serde::{Deserialize, Serialize};

pub use action::{invocation_deadline, remaining_budget, RedeployAction};
pub use arn::{service_arn, Partition, PartitionMode};
pub use config::{
    AwsConfigProvider, CloudConfig, ConfigProvider, Credentials, RedeployerSettings,
    DEFAULT_DEADLINE_MARGIN_MS,
};
pub use ecs::{
    AwsEcsConnector, AwsEcsOps, EcsConnector, EcsOps, EcsOpsError, ServiceDescription,
    UpdateServiceRequest,
};
pub use error::{RedeployError, Stage};

/// Payload delivered by the alarm trigger.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlarmEvent {
    pub account: String,
    pub cluster: String,
    pub service: String,
    #[serde(default)]
    pub alarm_name: String,
}

#[derive(Builder, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    pub status: String,
    pub service: String,
    pub cluster: String,
    pub service_arn: String,
    pub alarm_name: String,
    pub task_definition: Option<String>,
    pub desired_count: i32,
    pub timestamp: String,
}
