//! In-memory reference transport: a channel pair standing in for a
//! concrete shared-memory driver. Used by the test suite and by
//! anything embedding this crate that wants to exercise the protocol
//! engine without real hardware.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::IcapError;
use crate::transport::{RemoteAddr, Transport};

/// Channel-backed transport. Construct a connected pair with
/// [`MemoryTransport::pair`].
pub struct MemoryTransport {
    local_addr: RemoteAddr,
    peer_addr: Option<RemoteAddr>,
    outbound: mpsc::Sender<(RemoteAddr, Vec<u8>)>,
    inbound: mpsc::Receiver<(RemoteAddr, Vec<u8>)>,
}

impl MemoryTransport {
    /// Build two transports wired to each other, addressed `addr_a`
    /// and `addr_b` respectively. Each side sees the other's address
    /// as the source of inbound frames, so `verify_peer` latches onto
    /// the expected peer on first receive.
    pub fn pair(addr_a: RemoteAddr, addr_b: RemoteAddr) -> (Self, Self) {
        let (tx_a_to_b, rx_a_to_b) = mpsc::channel(32);
        let (tx_b_to_a, rx_b_to_a) = mpsc::channel(32);
        let a = MemoryTransport {
            local_addr: addr_a,
            peer_addr: None,
            outbound: tx_a_to_b,
            inbound: rx_b_to_a,
        };
        let b = MemoryTransport {
            local_addr: addr_b,
            peer_addr: None,
            outbound: tx_b_to_a,
            inbound: rx_a_to_b,
        };
        (a, b)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn init(&mut self) -> Result<(), IcapError> {
        Ok(())
    }

    async fn deinit(&mut self) -> Result<(), IcapError> {
        self.inbound.close();
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), IcapError> {
        self.outbound
            .send((self.local_addr.clone(), bytes.to_vec()))
            .await
            .map_err(|_| IcapError::BrokenConn)
    }

    fn verify_peer(&mut self, addr: &RemoteAddr) -> Result<(), IcapError> {
        match &self.peer_addr {
            Some(latched) if latched == addr => Ok(()),
            Some(_) => Err(IcapError::RemoteAddr),
            None => {
                self.peer_addr = Some(addr.clone());
                Ok(())
            }
        }
    }

    async fn recv(&mut self) -> Result<(RemoteAddr, Vec<u8>), IcapError> {
        self.inbound.recv().await.ok_or(IcapError::BrokenConn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pair_delivers_what_was_sent() {
        let (mut a, mut b) = MemoryTransport::pair(b"a".to_vec(), b"b".to_vec());
        a.send(b"hello").await.unwrap();
        let (addr, bytes) = b.recv().await.unwrap();
        assert_eq!(addr, b"a".to_vec());
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn verify_peer_latches_then_rejects_mismatch() {
        let (mut a, _b) = MemoryTransport::pair(b"a".to_vec(), b"b".to_vec());
        assert!(a.verify_peer(&b"peer-1".to_vec()).is_ok());
        assert!(a.verify_peer(&b"peer-1".to_vec()).is_ok());
        assert_eq!(
            a.verify_peer(&b"peer-2".to_vec()),
            Err(IcapError::RemoteAddr)
        );
    }
}
