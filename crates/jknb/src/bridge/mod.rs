//! Kernel-to-host plumbing.
//!
//! - **protocol**: identifiers and the `HostMessage` wire enum
//! - **codec**: length-prefixed JSON framing for AsyncRead/AsyncWrite
//! - **port**: the `HostPort` seam, a channel-backed port and its stream forwarder

pub mod codec;
pub mod port;
pub mod protocol;
