use std::fmt;
use thiserror::Error;

/// Pipeline stages, in execution order. A failure is terminal for the stage it occurs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuring,
    Identifying,
    Fetching,
    Constructing,
    Updating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuring => write!(f, "configuring"),
            Self::Identifying => write!(f, "identifying"),
            Self::Fetching => write!(f, "fetching"),
            Self::Constructing => write!(f, "constructing"),
            Self::Updating => write!(f, "updating"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RedeployError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("service lookup failed: {0}")]
    Lookup(String),

    #[error("service update failed: {0}")]
    Update(String),

    #[error("invocation deadline exceeded while {stage}")]
    DeadlineExceeded { stage: Stage },
}

impl RedeployError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config(_) => Stage::Configuring,
            Self::InvalidRegion(_) => Stage::Identifying,
            Self::Lookup(_) => Stage::Fetching,
            Self::Update(_) => Stage::Updating,
            Self::DeadlineExceeded { stage } => *stage,
        }
    }
}
