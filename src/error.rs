//! Error taxonomy for the protocol core.
//!
//! Every variant carries the exact negative wire value from §6/§7 of the
//! protocol spec, so a [`IcapError`] round-trips losslessly through a
//! `NAK` payload: `IcapError::Invalid.code()` is the value a peer's NAK
//! carries, and [`IcapError::from_code`] is its inverse.

use thiserror::Error;

/// Protocol error, one variant per wire error code.
///
/// Input-validation variants (`Invalid`, `MsgLen`, `MsgId`, `MsgType`,
/// `Protocol`, `ProtoNotSup`) are raised by the wire codec and never
/// reach a callback. Peer-identity variants (`RemoteAddr`, `BrokenConn`)
/// abort the originating request, if any. Resource variants (`NoMem`,
/// `NoBufs`, `Busy`) are surfaced to the caller and never silently
/// retried. `Timeout` is returned only to a synchronous waiter.
/// `NotSup` is returned by callbacks to signal a command isn't
/// implemented at the peer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IcapError {
    #[error("out of memory")]
    NoMem,
    #[error("resource busy")]
    Busy,
    #[error("invalid argument")]
    Invalid,
    #[error("connection broken")]
    BrokenConn,
    #[error("unknown message type")]
    MsgType,
    #[error("protocol version mismatch")]
    Protocol,
    #[error("unknown command id")]
    MsgId,
    #[error("frame from unrecognized remote address")]
    RemoteAddr,
    #[error("payload_len does not match datagram length")]
    MsgLen,
    #[error("protocol not supported")]
    ProtoNotSup,
    #[error("request timed out")]
    Timeout,
    #[error("no buffers available")]
    NoBufs,
    #[error("command not supported by peer")]
    NotSup,
}

impl IcapError {
    /// The negative wire value carried in a `NAK` payload (§6).
    pub const fn code(self) -> i32 {
        match self {
            IcapError::NoMem => -12,
            IcapError::Busy => -16,
            IcapError::Invalid => -22,
            IcapError::BrokenConn => -32,
            IcapError::MsgType => -42,
            IcapError::Protocol => -71,
            IcapError::MsgId => -74,
            IcapError::RemoteAddr => -78,
            IcapError::MsgLen => -90,
            IcapError::ProtoNotSup => -93,
            IcapError::Timeout => -110,
            IcapError::NoBufs => -233,
            IcapError::NotSup => -252,
        }
    }

    /// Recover an [`IcapError`] from a negative wire code. Returns `None`
    /// for codes that don't match any known error (callers should treat
    /// those as an opaque negative status rather than fail decoding).
    pub const fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            -12 => IcapError::NoMem,
            -16 => IcapError::Busy,
            -22 => IcapError::Invalid,
            -32 => IcapError::BrokenConn,
            -42 => IcapError::MsgType,
            -71 => IcapError::Protocol,
            -74 => IcapError::MsgId,
            -78 => IcapError::RemoteAddr,
            -90 => IcapError::MsgLen,
            -93 => IcapError::ProtoNotSup,
            -110 => IcapError::Timeout,
            -233 => IcapError::NoBufs,
            -252 => IcapError::NotSup,
            _ => return None,
        })
    }
}
