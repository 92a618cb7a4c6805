//! Device-role notification helpers (§4.6). The device side never
//! blocks on its own sends: `FRAG_READY`/`XRUN` register a response
//! callback instead of a waiter, and `ERROR` expects no response at all
//! (§4.5 step 3).

use std::sync::Arc;

use crate::callbacks::DeviceCallbacks;
use crate::config::InstanceConfig;
use crate::error::IcapError;
use crate::instance::{new_instance, Callbacks, Instance, Role};
use crate::pending::PendingEntry;
use crate::transport::{RemoteAddr, Transport};
use crate::wire::{BufFrags, Cmd, Frame, MsgType, Payload};

/// A device-role endpoint: the side that answers application requests
/// through its registered [`DeviceCallbacks`] and raises its own
/// fragment/xrun/error notifications.
pub struct DeviceInstance<T: Transport> {
    inner: Arc<Instance<T>>,
}

impl<T: Transport> Clone for DeviceInstance<T> {
    fn clone(&self) -> Self {
        DeviceInstance {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport> DeviceInstance<T> {
    pub async fn init(
        transport: T,
        callbacks: DeviceCallbacks,
        config: InstanceConfig,
    ) -> Result<Self, IcapError> {
        let inner = new_instance(Role::Device, Callbacks::Device(callbacks), transport, config);
        inner.init().await?;
        Ok(DeviceInstance { inner })
    }

    pub async fn deinit(&self) -> Result<(), IcapError> {
        self.inner.deinit().await
    }

    pub async fn pump(&self) -> Result<(), IcapError> {
        self.inner.pump().await
    }

    pub fn enqueue(&self, addr: RemoteAddr, bytes: Vec<u8>) -> Result<(), IcapError> {
        self.inner.enqueue(addr, bytes)
    }

    pub async fn run_once(&self) -> Result<(), IcapError> {
        self.inner.run_once().await
    }

    pub async fn run(&self) -> Result<(), IcapError> {
        self.inner.run().await
    }

    pub async fn dispatch_now(&self, addr: RemoteAddr, bytes: Vec<u8>) -> Result<(), IcapError> {
        self.inner.dispatch_now(addr, bytes).await
    }

    /// Notify the application that `frags` fragments of `buf_id` are
    /// ready. Does not block; the application's ACK/NAK, once it
    /// arrives, is delivered to the `on_frag_ready_response`/
    /// `on_error_response` callbacks instead.
    pub async fn frag_ready(&self, buf_id: u32, frags: u32) -> Result<(), IcapError> {
        self.notify(Cmd::FragReady, BufFrags { buf_id, frags }).await
    }

    pub async fn xrun(&self, buf_id: u32, frags: u32) -> Result<(), IcapError> {
        self.notify(Cmd::Xrun, BufFrags { buf_id, frags }).await
    }

    async fn notify(&self, cmd: Cmd, frags: BufFrags) -> Result<(), IcapError> {
        let seq = self.inner.pending.register(PendingEntry::Callback(cmd as u32)).await?;
        self.inner.mark_active().await;
        let frame = Frame::new(seq, cmd as u32, MsgType::Msg, Payload::BufFrags(frags))?;
        if let Err(e) = self.inner.transport.lock().await.send(&frame.to_bytes()).await {
            self.inner.pending.take(seq).await;
            return Err(e);
        }
        Ok(())
    }

    /// Report an error to the application. Fire-and-forget: no `ACK`
    /// or `NAK` is expected (§4.5).
    pub async fn error(&self, code: i32) -> Result<(), IcapError> {
        let seq = self.inner.pending.reserve().await?;
        self.inner.mark_active().await;
        let frame = Frame::new(seq, Cmd::Error as u32, MsgType::Msg, Payload::I32(code))?;
        self.inner.transport.lock().await.send(&frame.to_bytes()).await
    }
}
