//! Instance data model and state machine (§3, §4.6).

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::callbacks::{ApplicationCallbacks, DeviceCallbacks};
use crate::config::InstanceConfig;
use crate::error::IcapError;
use crate::pending::PendingTable;
use crate::transport::{RemoteAddr, Transport};

/// Which side of the peer pair this instance plays (§GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Application,
    Device,
}

pub(crate) enum Callbacks {
    Application(ApplicationCallbacks),
    Device(DeviceCallbacks),
}

/// Lifecycle state (§4.6).
///
/// ```text
/// Uninit --init()--> Idle --(any send)--> Active <-> Active --deinit()--> Uninit
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Uninit,
    Idle,
    Active,
}

/// Bound of the internal deferred-dispatch queue used by
/// [`Instance::enqueue`]/[`Instance::run`]. This is the async analogue
/// of the bare-metal transport's static `ICAP_MSG_QUEUE_SIZE` queue
/// (§9, SPEC_FULL.md §10.5) — sized off the same `max_pending` config
/// rather than a second hardcoded constant.
const fn queue_depth(cfg: &InstanceConfig) -> usize {
    cfg.max_pending
}

/// One endpoint of an ICAP peer pair: owns a role, a transport, a
/// callback set, a sequence counter + pending-request table, and an
/// opaque lifecycle state (§3).
///
/// Role-specific public methods live on [`crate::api::application::ApplicationInstance`]
/// and [`crate::api::device::DeviceInstance`], which wrap this type.
pub struct Instance<T: Transport> {
    pub(crate) role: Role,
    pub(crate) callbacks: Callbacks,
    pub(crate) transport: Mutex<T>,
    pub(crate) pending: PendingTable,
    pub(crate) config: InstanceConfig,
    state: Mutex<State>,
    queue_tx: mpsc::Sender<(RemoteAddr, Vec<u8>)>,
    queue_rx: Mutex<mpsc::Receiver<(RemoteAddr, Vec<u8>)>>,
}

impl<T: Transport> Instance<T> {
    pub(crate) fn new(role: Role, callbacks: Callbacks, transport: T, config: InstanceConfig) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(queue_depth(&config));
        Instance {
            role,
            callbacks,
            transport: Mutex::new(transport),
            pending: PendingTable::new(config.max_pending),
            config,
            state: Mutex::new(State::Uninit),
            queue_tx,
            queue_rx: Mutex::new(queue_rx),
        }
    }

    /// Bind the transport and move `Uninit -> Idle`. Reinit on an
    /// already-initialized instance fails with `Invalid`.
    pub async fn init(&self) -> Result<(), IcapError> {
        let mut state = self.state.lock().await;
        if *state != State::Uninit {
            return Err(IcapError::Invalid);
        }
        self.transport.lock().await.init().await?;
        *state = State::Idle;
        Ok(())
    }

    /// Tear down: release the transport, drain the pending table (every
    /// current waiter sees `Timeout`, §4.6), move to `Uninit`. No
    /// quiescence requirement — in-flight sends are simply abandoned.
    pub async fn deinit(&self) -> Result<(), IcapError> {
        let mut state = self.state.lock().await;
        if *state == State::Uninit {
            return Ok(());
        }
        for entry in self.pending.drain().await {
            if let crate::pending::PendingEntry::Waiter(tx) = entry {
                let _ = tx.send(Err(IcapError::Timeout));
            }
        }
        self.transport.lock().await.deinit().await?;
        *state = State::Uninit;
        Ok(())
    }

    pub(crate) async fn mark_active(&self) {
        let mut state = self.state.lock().await;
        if *state == State::Idle {
            *state = State::Active;
        }
    }

    pub(crate) async fn is_live(&self) -> bool {
        *self.state.lock().await != State::Uninit
    }

    /// Dispatch one already-received datagram immediately. Used when
    /// the embedding application has a safe calling context to invoke
    /// the dispatcher synchronously (§4.4).
    pub async fn dispatch_now(&self, addr: RemoteAddr, bytes: Vec<u8>) -> Result<(), IcapError> {
        if !self.is_live().await {
            return Err(IcapError::BrokenConn);
        }
        crate::dispatch::dispatch(self, addr, bytes).await
    }

    /// Queue a datagram for later processing instead of dispatching it
    /// inline — for use from a calling context that must not block or
    /// run arbitrary callback code (§4.4, §9's "polling via clock-tick
    /// busy-wait" redesigned as an explicit drain).
    pub fn enqueue(&self, addr: RemoteAddr, bytes: Vec<u8>) -> Result<(), IcapError> {
        self.queue_tx
            .try_send((addr, bytes))
            .map_err(|_| IcapError::Busy)
    }

    /// Drain and dispatch exactly one queued datagram, if any is
    /// waiting. Never blocks past the first available item.
    pub async fn run_once(&self) -> Result<(), IcapError> {
        let item = self.queue_rx.lock().await.try_recv();
        match item {
            Ok((addr, bytes)) => self.dispatch_now(addr, bytes).await,
            Err(mpsc::error::TryRecvError::Empty) => Ok(()),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(IcapError::BrokenConn),
        }
    }

    /// Drain and dispatch queued datagrams until the queue is closed.
    /// The embedding application calls this from its own scheduler loop
    /// (§9: "avoid introducing an implicit timer").
    pub async fn run(&self) -> Result<(), IcapError> {
        loop {
            let item = self.queue_rx.lock().await.recv().await;
            match item {
                Some((addr, bytes)) => self.dispatch_now(addr, bytes).await?,
                None => return Ok(()),
            }
        }
    }

    /// Pull one datagram directly off the transport and dispatch it —
    /// a convenience for the common case of a transport that can be
    /// polled from an async context with no interrupt-context
    /// restriction (what the in-memory reference transport models).
    pub async fn pump(&self) -> Result<(), IcapError> {
        let (addr, bytes) = self.transport.lock().await.recv().await?;
        self.dispatch_now(addr, bytes).await
    }
}

pub(crate) fn new_instance<T: Transport>(
    role: Role,
    callbacks: Callbacks,
    transport: T,
    config: InstanceConfig,
) -> Arc<Instance<T>> {
    Arc::new(Instance::new(role, callbacks, transport, config))
}
