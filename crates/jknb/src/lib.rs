//! jknb: kernel-side bridge to a notebook host.
//!
//! Code running inside a kernel gets a [`KernelBridge`] for its task and uses
//! it to print, open comms and request rich display. Everything leaves the
//! kernel as a [`HostMessage`] posted to a [`HostPort`].

mod error;
mod version;

pub mod bridge;
pub mod comm;
pub mod config;
pub mod display;
pub mod events;
pub mod host_log_layer;
pub mod kernel;
pub mod logging;

pub use bridge::port::{ChannelHostPort, HostPort, forward_to_host};
pub use bridge::protocol::{CommId, HostMessage, TaskId};
pub use comm::{
    CommManager, CommRegistry, DEFAULT_COMM_TARGET, KernelBinding, KernelComm, NewCommOptions,
};
pub use config::BridgeConfig;
pub use display::{DisplayMessage, Displayable};
pub use error::{BridgeError, Result};
pub use events::{DisplayDataEvent, Postable, PrintEvent};
pub use host_log_layer::HostLogLayer;
pub use kernel::KernelBridge;
pub use version::{KernelVersion, get_version_code_from};
