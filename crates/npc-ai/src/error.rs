//! Error types of the agent layer.
//!
//! Only setup can fail: loading configuration and spawning controllers. Once
//! an agent is running, missing bodies or targets surface as `Failure`
//! statuses inside its tree instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::world::AgentId;

pub type Result<T, E = AgentError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config TOML")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent {0} does not exist in the world")]
    UnknownAgent(AgentId),

    #[error("agent {0} has no body to drive")]
    MissingBody(AgentId),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
