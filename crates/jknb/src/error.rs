use thiserror::Error;

use crate::bridge::protocol::CommId;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid version '{name}': {reason}")]
    InvalidVersion { name: String, reason: String },

    #[error("display content must resolve to a JSON object, got {found}")]
    InvalidDisplayContent { found: &'static str },

    #[error("not displayable: {0}")]
    NotDisplayable(String),

    #[error("host port closed")]
    HostPortClosed,

    #[error("comm {0} is closed")]
    CommClosed(CommId),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_displayable(message: impl Into<String>) -> Self {
        Self::NotDisplayable(message.into())
    }

    pub(crate) fn invalid_version(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
