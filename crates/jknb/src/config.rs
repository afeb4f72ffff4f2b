//! Bridge configuration.
//!
//! Hosts normally build a [`BridgeConfig`] directly. A kernel process started
//! by the host can instead read it from the environment:
//!
//! | variable | meaning |
//! |---|---|
//! | `JKNB_TASK_ID` | task identifier (required) |
//! | `JKNB_VERSION` | `x.y.z` kernel version (required) |
//! | `JKNB_BUILD_NUMBER` | build number, default 0 |
//! | `JKNB_USER` | user name, default empty |

use crate::bridge::protocol::TaskId;
use crate::error::{BridgeError, Result};

pub const ENV_TASK_ID: &str = "JKNB_TASK_ID";
pub const ENV_VERSION: &str = "JKNB_VERSION";
pub const ENV_BUILD_NUMBER: &str = "JKNB_BUILD_NUMBER";
pub const ENV_USER: &str = "JKNB_USER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub task_id: TaskId,
    pub version_name: String,
    pub build_number: u32,
    pub user_name: String,
}

impl BridgeConfig {
    pub fn new(task_id: TaskId, version_name: impl Into<String>, build_number: u32) -> Self {
        Self {
            task_id,
            version_name: version_name.into(),
            build_number,
            user_name: String::new(),
        }
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (same keys as [`from_env`](Self::from_env)).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| BridgeError::invalid_argument(format!("{key} is not set")))
        };

        let task_id = TaskId::new(required(ENV_TASK_ID)?)?;
        let version_name = required(ENV_VERSION)?;

        let build_number = match lookup(ENV_BUILD_NUMBER) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                BridgeError::invalid_argument(format!("{ENV_BUILD_NUMBER} is not a number: {raw}"))
            })?,
            None => 0,
        };

        let config = Self::new(task_id, version_name, build_number)
            .with_user_name(lookup(ENV_USER).unwrap_or_default());

        tracing::debug!(
            task_id = %config.task_id,
            version = %config.version_name,
            build_number = config.build_number,
            "Loaded bridge config from environment"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn builder_defaults_user_name_to_empty() {
        let config = BridgeConfig::new(TaskId::new("t").unwrap(), "1.0.0", 3);
        assert_eq!(config.user_name, "");
        assert_eq!(config.with_user_name("grace").user_name, "grace");
    }

    #[test]
    fn from_lookup_reads_all_keys() {
        let config = BridgeConfig::from_lookup(lookup(&[
            (ENV_TASK_ID, "task-9"),
            (ENV_VERSION, "2.4.1"),
            (ENV_BUILD_NUMBER, "77"),
            (ENV_USER, "grace"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            BridgeConfig::new(TaskId::new("task-9").unwrap(), "2.4.1", 77).with_user_name("grace")
        );
    }

    #[test]
    fn from_lookup_defaults_optional_keys() {
        let config =
            BridgeConfig::from_lookup(lookup(&[(ENV_TASK_ID, "task-9"), (ENV_VERSION, "2.4.1")]))
                .unwrap();
        assert_eq!(config.build_number, 0);
        assert_eq!(config.user_name, "");
    }

    #[test]
    fn from_lookup_requires_task_id() {
        let err = BridgeConfig::from_lookup(lookup(&[(ENV_VERSION, "1.0.0")])).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));
        assert!(err.to_string().contains(ENV_TASK_ID));
    }

    #[test]
    fn from_lookup_rejects_empty_task_id() {
        let err = BridgeConfig::from_lookup(lookup(&[(ENV_TASK_ID, ""), (ENV_VERSION, "1.0.0")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TASK_ID));
    }

    #[test]
    fn from_lookup_rejects_bad_build_number() {
        let err = BridgeConfig::from_lookup(lookup(&[
            (ENV_TASK_ID, "t"),
            (ENV_VERSION, "1.0.0"),
            (ENV_BUILD_NUMBER, "latest"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_BUILD_NUMBER));
    }
}
