//! Host port: where kernel-side messages are delivered.
//!
//! [`ChannelHostPort`] queues messages on an unbounded channel so posting never
//! blocks kernel code. [`forward_to_host`] drains that channel onto any byte
//! stream (stdout, a socket) as length-prefixed JSON frames.

use std::io;

use futures::SinkExt;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio_util::codec::FramedWrite;

use crate::bridge::codec::JsonFrameCodec;
use crate::bridge::protocol::HostMessage;
use crate::error::{BridgeError, Result};

/// Transport handle used to deliver messages to the host process.
pub trait HostPort: Send + Sync {
    fn post(&self, message: HostMessage) -> Result<()>;
}

/// Host port backed by a tokio mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelHostPort {
    tx: mpsc::UnboundedSender<HostMessage>,
}

impl ChannelHostPort {
    pub fn new(tx: mpsc::UnboundedSender<HostMessage>) -> Self {
        Self { tx }
    }

    /// Create a port together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl HostPort for ChannelHostPort {
    fn post(&self, message: HostMessage) -> Result<()> {
        self.tx.send(message).map_err(|_| BridgeError::HostPortClosed)
    }
}

/// Write every queued message to `writer` until all senders are dropped.
///
/// Returns the number of frames written.
pub async fn forward_to_host<W>(
    mut rx: mpsc::UnboundedReceiver<HostMessage>,
    writer: W,
) -> io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(writer, JsonFrameCodec::<HostMessage>::new());
    let mut written = 0usize;

    while let Some(msg) = rx.recv().await {
        let kind = msg.kind();
        if let Err(e) = sink.send(msg).await {
            tracing::warn!(error = %e, kind, "Failed to forward message to host");
            return Err(e);
        }
        written += 1;
    }

    sink.close().await?;
    tracing::debug!(written, "Host port channel closed, forwarder exiting");
    Ok(written)
}
