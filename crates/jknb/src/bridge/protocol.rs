//! Wire protocol for kernel-to-host messages.
//!
//! Every message a bridge, a comm or the host log layer emits is a
//! [`HostMessage`]. The host side decides how to render or route it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};

/// Opaque identifier correlating a kernel session with its host task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(BridgeError::invalid_argument("TaskId cannot be empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a comm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommId(uuid::Uuid);

impl CommId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    pub fn parse(s: &str) -> std::result::Result<Self, uuid::Error> {
        Ok(Self(uuid::Uuid::parse_str(s)?))
    }
}

impl Default for CommId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CommId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messages from kernel to host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Print {
        task_id: TaskId,
        items: Vec<Value>,
    },

    /// Rich display content, usually a MIME bundle.
    DisplayData {
        task_id: TaskId,
        data: Map<String, Value>,
    },

    CommOpen {
        task_id: TaskId,
        comm_id: CommId,
        target_name: String,
        data: Map<String, Value>,
        metadata: Map<String, Value>,
    },

    CommMsg {
        task_id: TaskId,
        comm_id: CommId,
        data: Value,
    },

    CommClose {
        task_id: TaskId,
        comm_id: CommId,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },

    /// Kernel-side tracing record.
    KernelLog {
        target: String,
        level: String,
        message: String,
    },
}

impl HostMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Print { .. } => "print",
            Self::DisplayData { .. } => "display_data",
            Self::CommOpen { .. } => "comm_open",
            Self::CommMsg { .. } => "comm_msg",
            Self::CommClose { .. } => "comm_close",
            Self::KernelLog { .. } => "kernel_log",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_task() -> TaskId {
        TaskId::new("task-7").unwrap()
    }

    fn test_comm_id() -> CommId {
        CommId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap()
    }

    #[test]
    fn task_id_rejects_empty() {
        let err = TaskId::new("").unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));
        assert_eq!(err.to_string(), "invalid argument: TaskId cannot be empty");
        assert_eq!(TaskId::new("t").unwrap().as_str(), "t");
    }

    #[test]
    fn print_serializes() {
        let msg = HostMessage::Print {
            task_id: test_task(),
            items: vec![json!("a"), json!(2)],
        };
        insta::assert_json_snapshot!(msg, @r#"
        {
          "type": "print",
          "task_id": "task-7",
          "items": [
            "a",
            2
          ]
        }
        "#);
    }

    #[test]
    fn comm_msg_serializes() {
        let msg = HostMessage::CommMsg {
            task_id: test_task(),
            comm_id: test_comm_id(),
            data: json!("ping"),
        };
        insta::assert_json_snapshot!(msg, @r#"
        {
          "type": "comm_msg",
          "task_id": "task-7",
          "comm_id": "550e8400-e29b-41d4-a716-446655440000",
          "data": "ping"
        }
        "#);
    }

    #[test]
    fn comm_close_omits_missing_data() {
        let msg = HostMessage::CommClose {
            task_id: test_task(),
            comm_id: test_comm_id(),
            data: None,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "comm_close",
                "task_id": "task-7",
                "comm_id": "550e8400-e29b-41d4-a716-446655440000",
            })
        );
    }

    #[test]
    fn display_data_parses_from_host_json() {
        let raw = r#"{"type":"display_data","task_id":"task-7","data":{"text/plain":"hi"}}"#;
        let msg: HostMessage = serde_json::from_str(raw).unwrap();
        match msg {
            HostMessage::DisplayData { task_id, data } => {
                assert_eq!(task_id, test_task());
                assert_eq!(data.get("text/plain"), Some(&json!("hi")));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn kind_matches_serde_tag() {
        let msg = HostMessage::KernelLog {
            target: "jknb".to_string(),
            level: "info".to_string(),
            message: "hello".to_string(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], json!(msg.kind()));
    }
}
