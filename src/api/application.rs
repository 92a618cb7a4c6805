//! Application-role request helpers (§4.6). Every call here blocks the
//! caller until a matching response arrives or `msg_timeout` elapses —
//! the application role always waits (§4.5 step 3).

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::callbacks::ApplicationCallbacks;
use crate::config::InstanceConfig;
use crate::error::IcapError;
use crate::instance::{new_instance, Callbacks, Instance, Role};
use crate::pending::PendingEntry;
use crate::transport::{RemoteAddr, Transport};
use crate::wire::{
    BufDescriptor, BufOffsets, Cmd, DeviceFeatures, DeviceParams, Frame, MsgType, Payload,
};

/// An application-role endpoint: the side that drives a device through
/// requests and blocks for their replies.
pub struct ApplicationInstance<T: Transport> {
    inner: Arc<Instance<T>>,
}

impl<T: Transport> Clone for ApplicationInstance<T> {
    fn clone(&self) -> Self {
        ApplicationInstance {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport> ApplicationInstance<T> {
    pub async fn init(
        transport: T,
        callbacks: ApplicationCallbacks,
        config: InstanceConfig,
    ) -> Result<Self, IcapError> {
        let inner = new_instance(Role::Application, Callbacks::Application(callbacks), transport, config);
        inner.init().await?;
        Ok(ApplicationInstance { inner })
    }

    pub async fn deinit(&self) -> Result<(), IcapError> {
        self.inner.deinit().await
    }

    /// Pull and dispatch the next inbound datagram directly off the
    /// transport. See [`Instance::pump`].
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

    pub async fn get_dev_num(&self) -> Result<u32, IcapError> {
        let frame = self.request(Cmd::GetDevNum, Payload::Empty).await?;
        Payload::decode_u32(&frame.payload)
    }

    pub async fn get_dev_features(&self, device_id: u32) -> Result<DeviceFeatures, IcapError> {
        let frame = self.request(Cmd::GetDevFeatures, Payload::U32(device_id)).await?;
        Payload::decode_device_features(&frame.payload)
    }

    pub async fn dev_init(&self, params: DeviceParams) -> Result<(), IcapError> {
        self.request(Cmd::DevInit, Payload::DeviceParams(params)).await?;
        Ok(())
    }

    pub async fn dev_deinit(&self, device_id: u32) -> Result<(), IcapError> {
        self.request(Cmd::DevDeinit, Payload::U32(device_id)).await?;
        Ok(())
    }

    pub async fn add_src(&self, descriptor: BufDescriptor) -> Result<u32, IcapError> {
        let frame = self.request(Cmd::AddSrc, Payload::BufDescriptor(descriptor)).await?;
        Payload::decode_u32(&frame.payload)
    }

    pub async fn add_dst(&self, descriptor: BufDescriptor) -> Result<u32, IcapError> {
        let frame = self.request(Cmd::AddDst, Payload::BufDescriptor(descriptor)).await?;
        Payload::decode_u32(&frame.payload)
    }

    pub async fn remove_src(&self, buf_id: u32) -> Result<(), IcapError> {
        self.request(Cmd::RemoveSrc, Payload::U32(buf_id)).await?;
        Ok(())
    }

    pub async fn remove_dst(&self, buf_id: u32) -> Result<(), IcapError> {
        self.request(Cmd::RemoveDst, Payload::U32(buf_id)).await?;
        Ok(())
    }

    pub async fn start(&self, buf_id: u32) -> Result<(), IcapError> {
        self.request(Cmd::Start, Payload::U32(buf_id)).await?;
        Ok(())
    }

    pub async fn stop(&self, buf_id: u32) -> Result<(), IcapError> {
        self.request(Cmd::Stop, Payload::U32(buf_id)).await?;
        Ok(())
    }

    pub async fn pause(&self, buf_id: u32) -> Result<(), IcapError> {
        self.request(Cmd::Pause, Payload::U32(buf_id)).await?;
        Ok(())
    }

    pub async fn resume(&self, buf_id: u32) -> Result<(), IcapError> {
        self.request(Cmd::Resume, Payload::U32(buf_id)).await?;
        Ok(())
    }

    pub async fn buf_offsets(&self, offsets: BufOffsets) -> Result<(), IcapError> {
        self.request(Cmd::BufOffsets, Payload::BufOffsets(offsets)).await?;
        Ok(())
    }

    /// Send a `MSG`, register a waiter for its `seq_num`, and block for
    /// the reply or `msg_timeout` (§4.3 step 1, §4.5 step 3).
    ///
    /// The waiter is registered *before* the send so a reply racing in
    /// immediately after the peer receives the datagram can never find
    /// the table empty (§4.3's race-freedom argument).
    async fn request(&self, cmd: Cmd, payload: Payload) -> Result<Frame, IcapError> {
        let (tx, rx) = oneshot::channel();
        let seq = self.inner.pending.register(PendingEntry::Waiter(tx)).await?;
        self.inner.mark_active().await;
        let frame = Frame::new(seq, cmd as u32, MsgType::Msg, payload)?;
        if let Err(e) = self.inner.transport.lock().await.send(&frame.to_bytes()).await {
            self.inner.pending.take(seq).await;
            return Err(e);
        }
        match tokio::time::timeout(self.inner.config.msg_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(IcapError::BrokenConn),
            Err(_elapsed) => {
                self.inner.pending.take(seq).await;
                Err(IcapError::Timeout)
            }
        }
    }
}
