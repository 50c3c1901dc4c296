use crate::error::RedeployError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// Standard commercial regions.
    Aws,
    /// China regions.
    AwsCn,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::AwsCn => "aws-cn",
        }
    }

    /// Classifies a region by its two-letter prefix.
    pub fn from_region(region: &str) -> Result<Self, RedeployError> {
        match region.get(..2) {
            Some("cn") => Ok(Self::AwsCn),
            Some("us") => Ok(Self::Aws),
            _ => Err(RedeployError::InvalidRegion(region.to_string())),
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Partition {
    type Err = RedeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws" => Ok(Self::Aws),
            "aws-cn" => Ok(Self::AwsCn),
            other => Err(RedeployError::Config(format!(
                "unknown partition '{}', expected aws or aws-cn",
                other
            ))),
        }
    }
}

/// How the partition for the service ARN is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionMode {
    #[default]
    Detect,
    Fixed(Partition),
}

impl PartitionMode {
    pub fn resolve(&self, region: &str) -> Result<Partition, RedeployError> {
        match self {
            Self::Detect => Partition::from_region(region),
            Self::Fixed(partition) => Ok(*partition),
        }
    }
}

impl FromStr for PartitionMode {
    type Err = RedeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "auto" => Ok(Self::Detect),
            other => other.parse().map(Self::Fixed),
        }
    }
}

/// Builds `arn:<partition>:ecs:<region>:<account>:service/<cluster>/<service>`.
/// Inputs are inserted verbatim.
pub fn service_arn(
    partition: Partition,
    region: &str,
    account: &str,
    cluster: &str,
    service: &str,
) -> String {
    format!(
        "arn:{}:ecs:{}:{}:service/{}/{}",
        partition, region, account, cluster, service
    )
}
