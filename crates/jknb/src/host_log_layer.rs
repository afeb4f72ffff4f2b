//! Tracing layer that ships kernel-side records to the host as
//! [`HostMessage::KernelLog`].
//!
//! Records go either to a bounded channel, dropped when it is full, or
//! straight to a [`HostPort`], so they travel the same stream as everything
//! else the kernel posts.
//!
//! Records from `jknb::bridge` are never shipped: encoding a frame logs, and
//! shipping that log would encode another frame.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::bridge::port::HostPort;
use crate::bridge::protocol::HostMessage;

const SKIPPED_TARGET_PREFIX: &str = "jknb::bridge";

#[derive(Clone)]
enum Sink {
    Channel(mpsc::Sender<HostMessage>),
    Port(Arc<dyn HostPort>),
}

#[derive(Clone)]
pub struct HostLogLayer {
    sink: Sink,
}

impl std::fmt::Debug for HostLogLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sink = match self.sink {
            Sink::Channel(_) => "channel",
            Sink::Port(_) => "port",
        };
        f.debug_struct("HostLogLayer").field("sink", &sink).finish()
    }
}

impl HostLogLayer {
    pub fn new(tx: mpsc::Sender<HostMessage>) -> Self {
        Self {
            sink: Sink::Channel(tx),
        }
    }

    /// Post records directly to `port`.
    pub fn for_port(port: Arc<dyn HostPort>) -> Self {
        Self {
            sink: Sink::Port(port),
        }
    }

    fn level_name(level: &Level) -> &'static str {
        match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        }
    }
}

impl<S> Layer<S> for HostLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target().starts_with(SKIPPED_TARGET_PREFIX) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let msg = HostMessage::KernelLog {
            target: metadata.target().to_string(),
            level: Self::level_name(metadata.level()).to_string(),
            message: visitor.message,
        };

        // Full or closed sink: drop the record rather than block kernel code.
        match &self.sink {
            Sink::Channel(tx) => {
                let _ = tx.try_send(msg);
            }
            Sink::Port(port) => {
                let _ = port.post(msg);
            }
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}
