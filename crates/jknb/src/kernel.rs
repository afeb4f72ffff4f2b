//! KernelBridge: what kernel-side code uses to reach its host.
//!
//! One bridge serves one task. It owns no mutable state: printing and display
//! are posted straight to the host port, and comms are handed to the registry
//! as soon as they are created.
//!
//! Construction has no side effects. Binding the bridge to its comm registry is
//! a separate, explicit step (see [`KernelBridge::connect`]).

use std::sync::Arc;

use serde_json::Value;

use crate::bridge::port::HostPort;
use crate::bridge::protocol::TaskId;
use crate::comm::{CommRegistry, DEFAULT_COMM_TARGET, KernelBinding, KernelComm, NewCommOptions};
use crate::config::BridgeConfig;
use crate::display::Displayable;
use crate::error::{BridgeError, Result};
use crate::events::{DisplayDataEvent, Postable, PrintEvent};
use crate::version::KernelVersion;

pub struct KernelBridge {
    task_id: TaskId,
    user_name: String,
    version: KernelVersion,
    host_port: Arc<dyn HostPort>,
    comm_registry: Arc<dyn CommRegistry>,
}

impl std::fmt::Debug for KernelBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelBridge")
            .field("task_id", &self.task_id)
            .field("user_name", &self.user_name)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl KernelBridge {
    /// Build a bridge without registering it anywhere.
    ///
    /// Fails if the configured version name is not `x.y.z` numeric.
    pub fn new(
        config: BridgeConfig,
        host_port: Arc<dyn HostPort>,
        comm_registry: Arc<dyn CommRegistry>,
    ) -> Result<Self> {
        let version = KernelVersion::new(&config.version_name, config.build_number)?;
        Ok(Self {
            task_id: config.task_id,
            user_name: config.user_name,
            version,
            host_port,
            comm_registry,
        })
    }

    /// Build a bridge and bind it to `comm_registry`.
    pub fn connect(
        config: BridgeConfig,
        host_port: Arc<dyn HostPort>,
        comm_registry: Arc<dyn CommRegistry>,
    ) -> Result<Arc<Self>> {
        let bridge = Arc::new(Self::new(config, host_port, Arc::clone(&comm_registry))?);
        comm_registry.bind(KernelBinding::new(&bridge));
        tracing::info!(
            task_id = %bridge.task_id,
            version = %bridge.version.name,
            "Kernel bridge connected"
        );
        Ok(bridge)
    }

    /// Copy of the version record.
    pub fn version(&self) -> KernelVersion {
        self.version.clone()
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Print `items` on the host. Nothing is posted when `items` is empty.
    pub fn print<I>(&self, items: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Ok(());
        }
        PrintEvent::new(self.task_id.clone(), items).post_to(self.host_port.as_ref())
    }

    /// Open a comm on [`DEFAULT_COMM_TARGET`].
    pub fn new_comm(&self) -> Result<Arc<KernelComm>> {
        self.new_comm_for(NewCommOptions::for_target(DEFAULT_COMM_TARGET))
    }

    /// Create a comm and hand it to the registry.
    ///
    /// The returned handle is shared with the registry, which owns the comm
    /// for routing purposes.
    pub fn new_comm_for(&self, options: NewCommOptions) -> Result<Arc<KernelComm>> {
        let target_name = options
            .target_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                BridgeError::invalid_argument(
                    "a target name (namespace) is required to open a kernel comm",
                )
            })?;

        let comm = Arc::new(KernelComm::new_for(
            self.task_id.clone(),
            Arc::clone(&self.host_port),
            target_name,
            options.initial_data.unwrap_or_default(),
            options.metadata.unwrap_or_default(),
        ));
        self.comm_registry.add(Arc::clone(&comm));

        Ok(comm)
    }

    /// Resolve `content` and post it as display data.
    ///
    /// The resolved content must be a JSON object; otherwise nothing is posted
    /// and [`BridgeError::InvalidDisplayContent`] is returned.
    pub async fn display<D>(&self, content: &D) -> Result<()>
    where
        D: Displayable + ?Sized,
    {
        let data = match content.to_display().await? {
            Value::Object(data) => data,
            other => {
                return Err(BridgeError::InvalidDisplayContent {
                    found: json_kind(&other),
                });
            }
        };

        DisplayDataEvent::new(self.task_id.clone(), data).post_to(self.host_port.as_ref())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
