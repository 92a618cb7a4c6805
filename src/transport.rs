//! Transport adapter interface (§4.4).
//!
//! The core depends on a transport with these five operations; the
//! concrete implementation (kernel inter-processor messaging, user-space
//! character device, bare-metal queues) is external and out of scope
//! (§1). This mirrors `IpcTransport` in this codebase's existing
//! transport abstraction, generalized for the peer-identity-latching
//! contract the protocol core requires.

use async_trait::async_trait;

use crate::error::IcapError;

/// Opaque remote peer address. The transport decides what this means
/// (an rpmsg endpoint address, a socket address, ...); the core only
/// ever compares it for equality to latch/verify the single remote
/// peer (§3 invariants, §4.4).
pub type RemoteAddr = Vec<u8>;

/// Transport-level capability the protocol core is built against.
///
/// All operations are non-blocking modulo the underlying send
/// primitive (§5: "only the synchronous-wait may block"); `send` is a
/// best-effort, at-most-one-datagram primitive, not a queue.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Bind the transport to an instance. One-shot per instance —
    /// calling `init` twice without an intervening `deinit` is a
    /// transport-level misuse, not a protocol concern.
    async fn init(&mut self) -> Result<(), IcapError>;

    /// Release resources. Idempotent after a failed `init`.
    async fn deinit(&mut self) -> Result<(), IcapError>;

    /// Send one datagram. At most one frame is ever in flight through
    /// this call; the transport must not fragment it.
    async fn send(&mut self, bytes: &[u8]) -> Result<(), IcapError>;

    /// Verify (and on the first call, latch) the peer address a frame
    /// claims to be from. `RemoteAddr` on mismatch with an
    /// already-latched peer (§3: "the instance accepts inbound frames
    /// from at most one remote identity; the first inbound frame
    /// latches that identity").
    fn verify_peer(&mut self, addr: &RemoteAddr) -> Result<(), IcapError>;

    /// Wait for the next inbound datagram.
    ///
    /// §4.4 describes `deliver_inbound` as a push the transport makes
    /// into the core, invoked from whatever execution context the
    /// transport owns (interrupt, softirq, reader thread), either
    /// synchronously or via a drain loop. In async Rust the natural
    /// analogue of "push into the core, or enqueue for later drain" is
    /// a pull the core's `run`/`run_once` loop performs against a
    /// transport-owned inbound queue — that's what this method is.
    async fn recv(&mut self) -> Result<(RemoteAddr, Vec<u8>), IcapError>;
}

pub mod memory;
