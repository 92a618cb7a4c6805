//! Fixed 40-byte frame header (§3).
//!
//! All multi-byte fields are little-endian; the layout has no padding.
//! Encoding/decoding is done by hand rather than through a derive, per
//! the redesign guidance in §9 ("manual `memcpy` of packed structs maps
//! to explicit serializer/deserializer functions with compile-time
//! layout assertions") — a `#[repr(C, packed)]` struct plus
//! `std::mem::transmute` would not be portable across host/target
//! endianness or alignment, so each field is packed/unpacked explicitly.

use crate::error::IcapError;

/// Wire size of [`Header`] in bytes: 6 `u32` fields + 16 reserved bytes.
pub const HEADER_LEN: usize = 6 * 4 + 16;

/// Protocol version this crate speaks. A mismatch on decode is `Protocol`.
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum payload bytes a single frame may carry (§6): the largest
/// payload variant, the fragment-offset batch (4 + 64 * 4 = 260 bytes).
pub const MAX_PAYLOAD_LEN: u32 = 260;

/// Frame type discriminant (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MsgType {
    Msg = 0,
    Ack = 1,
    Nak = 2,
}

impl MsgType {
    fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(MsgType::Msg),
            1 => Some(MsgType::Ack),
            2 => Some(MsgType::Nak),
            _ => None,
        }
    }
}

/// Fixed frame header (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub protocol_version: u32,
    pub seq_num: u32,
    pub cmd: u32,
    pub ty: MsgType,
    pub flags: u32,
    pub payload_len: u32,
}

impl Header {
    pub fn encode(&self, out: &mut [u8; HEADER_LEN]) {
        out[0..4].copy_from_slice(&self.protocol_version.to_le_bytes());
        out[4..8].copy_from_slice(&self.seq_num.to_le_bytes());
        out[8..12].copy_from_slice(&self.cmd.to_le_bytes());
        out[12..16].copy_from_slice(&(self.ty as u32).to_le_bytes());
        out[16..20].copy_from_slice(&self.flags.to_le_bytes());
        // reserved[16] at out[20..36], sender always zeroes it.
        out[20..36].fill(0);
        out[36..40].copy_from_slice(&self.payload_len.to_le_bytes());
    }

    /// Decode a header from the first [`HEADER_LEN`] bytes of `buf`.
    ///
    /// The `reserved` field is intentionally never inspected (§9 open
    /// question: ignore-on-receive, for forward compatibility).
    pub fn decode(buf: &[u8; HEADER_LEN]) -> Result<Self, IcapError> {
        let protocol_version = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        if protocol_version != PROTOCOL_VERSION {
            return Err(IcapError::Protocol);
        }
        let seq_num = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        let cmd = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        let ty_raw = u32::from_le_bytes(buf[12..16].try_into().unwrap());
        let ty = MsgType::from_u32(ty_raw).ok_or(IcapError::MsgType)?;
        let flags = u32::from_le_bytes(buf[16..20].try_into().unwrap());
        let payload_len = u32::from_le_bytes(buf[36..40].try_into().unwrap());
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(IcapError::MsgLen);
        }
        Ok(Header {
            protocol_version,
            seq_num,
            cmd,
            ty,
            flags,
            payload_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header {
            protocol_version: PROTOCOL_VERSION,
            seq_num: 7,
            cmd: 59,
            ty: MsgType::Msg,
            flags: 0,
            payload_len: 4,
        }
    }

    #[test]
    fn round_trips() {
        let h = sample();
        let mut buf = [0u8; HEADER_LEN];
        h.encode(&mut buf);
        let decoded = Header::decode(&buf).unwrap();
        assert_eq!(h, decoded);
    }

    #[test]
    fn rejects_bad_version() {
        let mut buf = [0u8; HEADER_LEN];
        sample().encode(&mut buf);
        buf[0..4].copy_from_slice(&2u32.to_le_bytes());
        assert_eq!(Header::decode(&buf), Err(IcapError::Protocol));
    }

    #[test]
    fn rejects_bad_type() {
        let mut buf = [0u8; HEADER_LEN];
        sample().encode(&mut buf);
        buf[12..16].copy_from_slice(&3u32.to_le_bytes());
        assert_eq!(Header::decode(&buf), Err(IcapError::MsgType));
    }

    #[test]
    fn reserved_bytes_are_ignored_on_decode() {
        let mut buf = [0u8; HEADER_LEN];
        sample().encode(&mut buf);
        buf[20..36].fill(0xAA);
        assert!(Header::decode(&buf).is_ok());
    }

    #[test]
    fn encode_zeroes_reserved() {
        let mut buf = [0xFFu8; HEADER_LEN];
        sample().encode(&mut buf);
        assert_eq!(&buf[20..36], &[0u8; 16]);
    }
}
