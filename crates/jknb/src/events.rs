//! Outgoing session events.
//!
//! An event knows how to post itself to a host port; the bridge only builds
//! events and hands them the port it was given.

use serde_json::{Map, Value};

use crate::bridge::port::HostPort;
use crate::bridge::protocol::{HostMessage, TaskId};
use crate::error::Result;

/// Something that can be delivered to a host port.
pub trait Postable {
    fn post_to(self, port: &dyn HostPort) -> Result<()>;
}

/// Output printed by kernel code.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintEvent {
    pub task_id: TaskId,
    pub items: Vec<Value>,
}

impl PrintEvent {
    pub fn new(task_id: TaskId, items: Vec<Value>) -> Self {
        Self { task_id, items }
    }
}

impl Postable for PrintEvent {
    fn post_to(self, port: &dyn HostPort) -> Result<()> {
        tracing::debug!(task_id = %self.task_id, items = self.items.len(), "Posting print event");
        port.post(HostMessage::Print {
            task_id: self.task_id,
            items: self.items,
        })
    }
}

/// Resolved rich display content.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayDataEvent {
    pub task_id: TaskId,
    pub data: Map<String, Value>,
}

impl DisplayDataEvent {
    pub fn new(task_id: TaskId, data: Map<String, Value>) -> Self {
        Self { task_id, data }
    }
}

impl Postable for DisplayDataEvent {
    fn post_to(self, port: &dyn HostPort) -> Result<()> {
        tracing::debug!(task_id = %self.task_id, keys = self.data.len(), "Posting display data event");
        port.post(HostMessage::DisplayData {
            task_id: self.task_id,
            data: self.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::port::ChannelHostPort;
    use serde_json::json;

    #[test]
    fn print_event_posts_print_message() {
        let (port, mut rx) = ChannelHostPort::channel();
        let task_id = TaskId::new("task-1").unwrap();

        PrintEvent::new(task_id.clone(), vec![json!("a"), json!("b")])
            .post_to(&port)
            .unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            HostMessage::Print {
                task_id,
                items: vec![json!("a"), json!("b")],
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn display_event_posts_display_message() {
        let (port, mut rx) = ChannelHostPort::channel();
        let task_id = TaskId::new("task-1").unwrap();
        let Value::Object(data) = json!({"text/plain": "hi"}) else {
            unreachable!()
        };

        DisplayDataEvent::new(task_id, data).post_to(&port).unwrap();

        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.kind(), "display_data");
    }

    #[test]
    fn posting_to_closed_port_fails() {
        let (port, rx) = ChannelHostPort::channel();
        drop(rx);
        let event = PrintEvent::new(TaskId::new("task-1").unwrap(), vec![json!(1)]);
        assert!(event.post_to(&port).is_err());
    }
}
