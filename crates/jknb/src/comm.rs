//! Kernel comms and the registry that owns them.
//!
//! The bridge manufactures comms; a [`CommRegistry`] keeps them. The registry
//! is told which bridge it serves through [`CommRegistry::bind`], which holds
//! the bridge weakly so bridge and registry can reference each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::bridge::port::HostPort;
use crate::bridge::protocol::{CommId, HostMessage, TaskId};
use crate::error::{BridgeError, Result};
use crate::kernel::KernelBridge;

/// Target name used by [`KernelBridge::new_comm`].
pub const DEFAULT_COMM_TARGET: &str = "jknb.comm";

/// Options for [`KernelBridge::new_comm_for`].
#[derive(Debug, Clone, Default)]
pub struct NewCommOptions {
    pub target_name: Option<String>,
    pub initial_data: Option<Map<String, Value>>,
    pub metadata: Option<Map<String, Value>>,
}

impl NewCommOptions {
    pub fn for_target(target_name: impl Into<String>) -> Self {
        Self {
            target_name: Some(target_name.into()),
            ..Self::default()
        }
    }

    pub fn with_initial_data(mut self, data: Map<String, Value>) -> Self {
        self.initial_data = Some(data);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A named channel between kernel and host.
pub struct KernelComm {
    id: CommId,
    task_id: TaskId,
    target_name: String,
    data: Map<String, Value>,
    metadata: Map<String, Value>,
    host_port: Arc<dyn HostPort>,
    closed: AtomicBool,
    close_hook: OnceLock<CloseHook>,
}

type CloseHook = Box<dyn Fn(CommId) + Send + Sync>;

impl std::fmt::Debug for KernelComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelComm")
            .field("id", &self.id)
            .field("task_id", &self.task_id)
            .field("target_name", &self.target_name)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl KernelComm {
    pub fn new_for(
        task_id: TaskId,
        host_port: Arc<dyn HostPort>,
        target_name: impl Into<String>,
        data: Map<String, Value>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            id: CommId::new(),
            task_id,
            target_name: target_name.into(),
            data,
            metadata,
            host_port,
            closed: AtomicBool::new(false),
            close_hook: OnceLock::new(),
        }
    }

    pub fn id(&self) -> CommId {
        self.id
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Run `hook` when the comm closes. Only the first hook is kept; returns
    /// false if one was already installed.
    pub fn on_close<F>(&self, hook: F) -> bool
    where
        F: Fn(CommId) + Send + Sync + 'static,
    {
        self.close_hook.set(Box::new(hook)).is_ok()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(BridgeError::CommClosed(self.id));
        }
        Ok(())
    }

    /// Announce the comm to the host with its initial data and metadata.
    pub fn open(&self) -> Result<()> {
        self.ensure_open()?;
        tracing::debug!(comm_id = %self.id, target = %self.target_name, "Opening comm");
        self.host_port.post(HostMessage::CommOpen {
            task_id: self.task_id.clone(),
            comm_id: self.id,
            target_name: self.target_name.clone(),
            data: self.data.clone(),
            metadata: self.metadata.clone(),
        })
    }

    pub fn send(&self, data: impl Into<Value>) -> Result<()> {
        self.ensure_open()?;
        self.host_port.post(HostMessage::CommMsg {
            task_id: self.task_id.clone(),
            comm_id: self.id,
            data: data.into(),
        })
    }

    /// Close the comm. Closing an already closed comm does nothing.
    pub fn close(&self, data: Option<Value>) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::debug!(comm_id = %self.id, "Closing comm");
        if let Some(hook) = self.close_hook.get() {
            hook(self.id);
        }
        self.host_port.post(HostMessage::CommClose {
            task_id: self.task_id.clone(),
            comm_id: self.id,
            data,
        })
    }
}

/// Tells a registry which bridge it serves.
#[derive(Debug, Clone)]
pub struct KernelBinding {
    kernel: Weak<KernelBridge>,
}

impl KernelBinding {
    pub fn new(kernel: &Arc<KernelBridge>) -> Self {
        Self {
            kernel: Arc::downgrade(kernel),
        }
    }

    /// The bound bridge, if it is still alive.
    pub fn kernel(&self) -> Option<Arc<KernelBridge>> {
        self.kernel.upgrade()
    }
}

/// Owner of comms created through a bridge.
pub trait CommRegistry: Send + Sync {
    /// Record the bridge this registry serves.
    fn bind(&self, binding: KernelBinding);

    /// Take ownership of a newly created comm.
    fn add(&self, comm: Arc<KernelComm>);
}

/// In-memory comm registry keyed by comm id. Comms leave the registry when
/// they close.
#[derive(Debug, Default)]
pub struct CommManager {
    comms: Arc<DashMap<CommId, Arc<KernelComm>>>,
    binding: RwLock<Option<KernelBinding>>,
}

impl CommManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kernel(&self) -> Option<Arc<KernelBridge>> {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(KernelBinding::kernel)
    }

    pub fn get(&self, id: &CommId) -> Option<Arc<KernelComm>> {
        self.comms.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: &CommId) -> Option<Arc<KernelComm>> {
        self.comms.remove(id).map(|(_, comm)| comm)
    }

    pub fn len(&self) -> usize {
        self.comms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comms.is_empty()
    }

    /// Close and drop every registered comm.
    ///
    /// All comms are attempted; the first close failure is returned.
    pub fn close_all(&self) -> Result<()> {
        let ids: Vec<CommId> = self.comms.iter().map(|entry| *entry.key()).collect();
        let mut first_err = None;

        for id in ids {
            let Some((_, comm)) = self.comms.remove(&id) else {
                continue;
            };
            if let Err(e) = comm.close(None) {
                tracing::warn!(comm_id = %id, error = %e, "Failed to close comm");
                first_err.get_or_insert(e);
            }
        }

        first_err.map_or(Ok(()), Err)
    }
}

impl CommRegistry for CommManager {
    fn bind(&self, binding: KernelBinding) {
        if let Some(kernel) = binding.kernel() {
            tracing::debug!(task_id = %kernel.task_id(), "Comm manager bound to kernel");
        }
        *self.binding.write().unwrap_or_else(PoisonError::into_inner) = Some(binding);
    }

    fn add(&self, comm: Arc<KernelComm>) {
        if let Some(kernel) = self.kernel()
            && kernel.task_id() != comm.task_id()
        {
            tracing::warn!(
                comm_id = %comm.id(),
                comm_task = %comm.task_id(),
                kernel_task = %kernel.task_id(),
                "Registering comm from another task"
            );
        }
        let id = comm.id();
        self.comms.insert(id, Arc::clone(&comm));

        let comms = Arc::downgrade(&self.comms);
        comm.on_close(move |closed| {
            if let Some(comms) = comms.upgrade() {
                comms.remove(&closed);
            }
        });

        // Closed before the hook was in place.
        if comm.is_closed() {
            self.comms.remove(&id);
            return;
        }
        tracing::debug!(comm_id = %id, target = %comm.target_name(), "Registered comm");
    }
}
