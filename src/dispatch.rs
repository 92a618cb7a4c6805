//! The dispatcher: decode, verify, route, respond (§4.5).
//!
//! One inbound datagram in, at most one outbound datagram out. Lives as
//! an inherent method on [`Instance`] rather than a free function
//! because every step needs the instance's transport, pending table,
//! and callback set together under one coherent view.

use crate::callbacks::Outcome;
use crate::error::IcapError;
use crate::instance::{Callbacks, Instance};
use crate::pending::PendingEntry;
use crate::transport::{RemoteAddr, Transport};
use crate::wire::{Cmd, Frame, MsgType, Payload};

/// Dispatch one inbound datagram: decode, then verify the sender,
/// then route and (for requests) generate a response (§4.5 step order).
/// Decoding must come first — verifying a frame that turns out to be
/// malformed would latch its sender as the accepted peer before the
/// frame is ever rejected.
pub(crate) async fn dispatch<T: Transport>(
    instance: &Instance<T>,
    addr: RemoteAddr,
    bytes: Vec<u8>,
) -> Result<(), IcapError> {
    let frame = Frame::from_bytes(&bytes)?;
    instance.transport.lock().await.verify_peer(&addr)?;
    instance.mark_active().await;

    match frame.header.ty {
        MsgType::Ack | MsgType::Nak => resolve_response(instance, &frame).await,
        MsgType::Msg => {
            let response = Cmd::from_msg_cmd(frame.header.cmd)
                .and_then(|cmd| route_request(instance, cmd, &frame.payload));
            respond(instance, frame.header.seq_num, frame.header.cmd, response).await
        }
    }
}

/// An inbound `ACK`/`NAK` resolves a pending entry: a blocking waiter
/// (application role, or a device-role caller awaiting an ordinary
/// command's reply) or a registered response callback (device role's
/// own `FRAG_READY`/`XRUN` notifications, §4.5 step 3).
async fn resolve_response<T: Transport>(instance: &Instance<T>, frame: &Frame) -> Result<(), IcapError> {
    let Some(entry) = instance.pending.take(frame.header.seq_num).await else {
        tracing::debug!(seq = frame.header.seq_num, "response with no matching pending request");
        return Ok(());
    };
    match entry {
        PendingEntry::Waiter(tx) => {
            let result = match frame.header.ty {
                MsgType::Ack => Ok(frame.clone()),
                MsgType::Nak => {
                    let code = Payload::decode_i32(&frame.payload).unwrap_or(IcapError::Protocol.code());
                    Err(IcapError::from_code(code).unwrap_or(IcapError::Protocol))
                }
                MsgType::Msg => unreachable!("only ACK/NAK resolve a pending entry"),
            };
            let _ = tx.send(result);
            Ok(())
        }
        PendingEntry::Callback(orig_cmd) => {
            resolve_notification_callback(instance, orig_cmd, frame);
            Ok(())
        }
    }
}

fn resolve_notification_callback<T: Transport>(instance: &Instance<T>, orig_cmd: u32, frame: &Frame) {
    let Callbacks::Device(cb) = &instance.callbacks else {
        return;
    };
    let response = match frame.header.ty {
        MsgType::Ack => Payload::decode_u32(&frame.payload).ok().map(Ok),
        MsgType::Nak => Payload::decode_i32(&frame.payload).ok().map(Err),
        MsgType::Msg => None,
    };
    let Some(response) = response else { return };
    match Cmd::from_u32(orig_cmd) {
        Some(Cmd::FragReady) => match response {
            Ok(buf_id) => call_notify(&cb.frag_ready_response, buf_id),
            Err(code) => call_notify(&cb.error_response, code),
        },
        Some(Cmd::Xrun) => match response {
            Ok(buf_id) => call_notify(&cb.xrun_response, buf_id),
            Err(code) => call_notify(&cb.error_response, code),
        },
        // ERROR is fire-and-forget on the device side (§4.5); the device
        // API never registers a `Callback` for it, so this is unreachable
        // in practice.
        _ => {}
    }
}

fn call_notify<A>(slot: &Option<Box<dyn Fn(A) + Send + Sync>>, arg: A) {
    if let Some(f) = slot {
        f(arg);
    }
}

/// Route an inbound `MSG` to the matching callback and turn its
/// `Outcome` into a response. `Ok(None)` means no response is sent at
/// all (the device-role `ERROR` fire-and-forget case, §4.5); `MsgId`
/// means `cmd` isn't in this instance's role table.
fn route_request<T: Transport>(
    instance: &Instance<T>,
    cmd: Cmd,
    payload: &[u8],
) -> Result<Option<(MsgType, Payload)>, IcapError> {
    match &instance.callbacks {
        Callbacks::Device(cb) => match cmd {
            Cmd::GetDevNum => Ok(Some(invoke(&cb.get_dev_num, (), Payload::U32))),
            Cmd::GetDevFeatures => {
                let device_id = Payload::decode_u32(payload)?;
                Ok(Some(invoke(&cb.get_dev_features, device_id, Payload::DeviceFeatures)))
            }
            Cmd::DevInit => {
                let params = Payload::decode_device_params(payload)?;
                Ok(Some(invoke(&cb.dev_init, params, |_| Payload::Empty)))
            }
            Cmd::DevDeinit => {
                let device_id = Payload::decode_u32(payload)?;
                Ok(Some(invoke(&cb.dev_deinit, device_id, |_| Payload::Empty)))
            }
            Cmd::AddSrc => {
                let desc = Payload::decode_buf_descriptor(payload)?;
                Ok(Some(invoke(&cb.add_src, desc, Payload::U32)))
            }
            Cmd::AddDst => {
                let desc = Payload::decode_buf_descriptor(payload)?;
                Ok(Some(invoke(&cb.add_dst, desc, Payload::U32)))
            }
            Cmd::RemoveSrc => {
                let buf_id = Payload::decode_u32(payload)?;
                Ok(Some(invoke(&cb.remove_src, buf_id, |_| Payload::Empty)))
            }
            Cmd::RemoveDst => {
                let buf_id = Payload::decode_u32(payload)?;
                Ok(Some(invoke(&cb.remove_dst, buf_id, |_| Payload::Empty)))
            }
            Cmd::Start => {
                let buf_id = Payload::decode_u32(payload)?;
                Ok(Some(invoke(&cb.start, buf_id, |_| Payload::Empty)))
            }
            Cmd::Stop => {
                let buf_id = Payload::decode_u32(payload)?;
                Ok(Some(invoke(&cb.stop, buf_id, |_| Payload::Empty)))
            }
            Cmd::Pause => {
                let buf_id = Payload::decode_u32(payload)?;
                Ok(Some(invoke(&cb.pause, buf_id, |_| Payload::Empty)))
            }
            Cmd::Resume => {
                let buf_id = Payload::decode_u32(payload)?;
                Ok(Some(invoke(&cb.resume, buf_id, |_| Payload::Empty)))
            }
            Cmd::BufOffsets => {
                let offsets = Payload::decode_buf_offsets(payload)?;
                Ok(Some(invoke(&cb.buf_offsets, offsets, |_| Payload::Empty)))
            }
            Cmd::Error => {
                let code = Payload::decode_i32(payload)?;
                call_notify(&cb.error, code);
                Ok(None)
            }
            Cmd::FragReady | Cmd::Xrun => Err(IcapError::MsgId),
        },
        Callbacks::Application(cb) => match cmd {
            Cmd::FragReady => {
                let frags = Payload::decode_buf_frags(payload)?;
                Ok(Some(invoke(&cb.frag_ready, frags, Payload::U32)))
            }
            Cmd::Xrun => {
                let frags = Payload::decode_buf_frags(payload)?;
                Ok(Some(invoke(&cb.xrun, frags, Payload::U32)))
            }
            Cmd::Error => {
                let code = Payload::decode_i32(payload)?;
                Ok(Some(invoke(&cb.error, code, |_| Payload::Empty)))
            }
            _ => Err(IcapError::MsgId),
        },
    }
}

fn invoke<A, R>(
    handler: &Option<Box<dyn Fn(A) -> Outcome<R> + Send + Sync>>,
    arg: A,
    to_payload: impl FnOnce(R) -> Payload,
) -> (MsgType, Payload) {
    match handler {
        None => (MsgType::Ack, Payload::Empty),
        Some(h) => match h(arg) {
            Outcome::Success(v) => (MsgType::Ack, to_payload(v)),
            Outcome::Failure(code) => (MsgType::Nak, Payload::I32(code)),
        },
    }
}

async fn respond<T: Transport>(
    instance: &Instance<T>,
    seq_num: u32,
    cmd: u32,
    response: Result<Option<(MsgType, Payload)>, IcapError>,
) -> Result<(), IcapError> {
    let (ty, payload) = match response {
        Ok(None) => return Ok(()),
        Ok(Some(pair)) => pair,
        Err(e) => (MsgType::Nak, Payload::I32(e.code())),
    };
    let frame = Frame::new(seq_num, cmd, ty, payload)?;
    instance.transport.lock().await.send(&frame.to_bytes()).await
}
