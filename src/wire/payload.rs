//! Payload union (§3, §6): a tagged union interpreted per `cmd`, bounded
//! by [`crate::wire::header::MAX_PAYLOAD_LEN`].
//!
//! Structs here mirror the packed C structs in `icap.h`
//! (`icap_buf_descriptor`, `icap_buf_offsets`, `icap_device_features`)
//! field-for-field; `DeviceParams` fills in a detail the retrieved
//! original source left undefined (`struct icap_device_params` wasn't
//! present in the kept header set) with the minimal fields `DEV_INIT`
//! needs to stand up a device (§4.5's `DEV_INIT` row: "dev_params").

use crate::error::IcapError;
use crate::wire::header::MAX_PAYLOAD_LEN;

pub const BUF_NAME_LEN: usize = 64;
pub const MAX_FRAG_OFFSETS: usize = 64;

/// Buffer layout hint (§GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BufType {
    Circular = 0,
    Scattered = 1,
}

impl BufType {
    fn from_u32(v: u32) -> Result<Self, IcapError> {
        match v {
            0 => Ok(BufType::Circular),
            1 => Ok(BufType::Scattered),
            _ => Err(IcapError::Invalid),
        }
    }
}

/// Remote audio buffer descriptor, used by `ADD_SRC`/`ADD_DST` (§6).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BufDescriptor {
    pub name: String,
    pub device_id: i32,
    pub buf_addr: u64,
    pub buf_size: u32,
    pub buf_type: u32,
    pub gap_size: u32,
    pub frag_size: u32,
    pub channels: u32,
    pub pcm_format: u32,
    pub pcm_rate: u32,
}

impl BufDescriptor {
    const WIRE_LEN: usize = BUF_NAME_LEN + 4 + 8 + 4 * 7;

    fn encode(&self, out: &mut Vec<u8>) {
        let mut name_bytes = [0u8; BUF_NAME_LEN];
        let src = self.name.as_bytes();
        let n = src.len().min(BUF_NAME_LEN);
        name_bytes[..n].copy_from_slice(&src[..n]);
        out.extend_from_slice(&name_bytes);
        out.extend_from_slice(&self.device_id.to_le_bytes());
        out.extend_from_slice(&self.buf_addr.to_le_bytes());
        out.extend_from_slice(&self.buf_size.to_le_bytes());
        out.extend_from_slice(&self.buf_type.to_le_bytes());
        out.extend_from_slice(&self.gap_size.to_le_bytes());
        out.extend_from_slice(&self.frag_size.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.pcm_format.to_le_bytes());
        out.extend_from_slice(&self.pcm_rate.to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Result<Self, IcapError> {
        if buf.len() != Self::WIRE_LEN {
            return Err(IcapError::MsgLen);
        }
        let name_end = buf[..BUF_NAME_LEN]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(BUF_NAME_LEN);
        let name = String::from_utf8_lossy(&buf[..name_end]).into_owned();
        let mut off = BUF_NAME_LEN;
        let device_id = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        off += 4;
        let buf_addr = u64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
        off += 8;
        let buf_size = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        off += 4;
        let buf_type_raw = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        BufType::from_u32(buf_type_raw)?;
        off += 4;
        let gap_size = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        off += 4;
        let frag_size = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        off += 4;
        let channels = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        off += 4;
        let pcm_format = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        off += 4;
        let pcm_rate = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        Ok(BufDescriptor {
            name,
            device_id,
            buf_addr,
            buf_size,
            buf_type: buf_type_raw,
            gap_size,
            frag_size,
            channels,
            pcm_format,
            pcm_rate,
        })
    }
}

/// Fragment-offset batch, used by `BUF_OFFSETS` (§6). Max 64 offsets.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BufOffsets {
    pub offsets: Vec<u32>,
}

impl BufOffsets {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), IcapError> {
        if self.offsets.len() > MAX_FRAG_OFFSETS {
            return Err(IcapError::Invalid);
        }
        out.extend_from_slice(&(self.offsets.len() as u32).to_le_bytes());
        for o in &self.offsets {
            out.extend_from_slice(&o.to_le_bytes());
        }
        let padding = MAX_FRAG_OFFSETS - self.offsets.len();
        out.extend(std::iter::repeat(0u8).take(padding * 4));
        Ok(())
    }

    fn decode(buf: &[u8]) -> Result<Self, IcapError> {
        if buf.len() != 4 + MAX_FRAG_OFFSETS * 4 {
            return Err(IcapError::MsgLen);
        }
        let num = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
        if num > MAX_FRAG_OFFSETS {
            return Err(IcapError::Invalid);
        }
        let mut offsets = Vec::with_capacity(num);
        for i in 0..num {
            let off = 4 + i * 4;
            offsets.push(u32::from_le_bytes(buf[off..off + 4].try_into().unwrap()));
        }
        Ok(BufOffsets { offsets })
    }
}

/// Fragment-count record accompanying `FRAG_READY`/`XRUN` (§6, E2E-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BufFrags {
    pub buf_id: u32,
    pub frags: u32,
}

impl BufFrags {
    const WIRE_LEN: usize = 8;

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.buf_id.to_le_bytes());
        out.extend_from_slice(&self.frags.to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Result<Self, IcapError> {
        if buf.len() != Self::WIRE_LEN {
            return Err(IcapError::MsgLen);
        }
        Ok(BufFrags {
            buf_id: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            frags: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
        })
    }
}

/// Device capability advertisement, returned by `GET_DEV_FEATURES` (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceFeatures {
    pub playback: i32,
    pub record: i32,
    pub channels: u32,
    pub pcm_formats: u32,
    pub rates: u32,
}

impl DeviceFeatures {
    const WIRE_LEN: usize = 4 + 4 + 4 + 4 + 4;

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.playback.to_le_bytes());
        out.extend_from_slice(&self.record.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.pcm_formats.to_le_bytes());
        out.extend_from_slice(&self.rates.to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Result<Self, IcapError> {
        if buf.len() != Self::WIRE_LEN {
            return Err(IcapError::MsgLen);
        }
        Ok(DeviceFeatures {
            playback: i32::from_le_bytes(buf[0..4].try_into().unwrap()),
            record: i32::from_le_bytes(buf[4..8].try_into().unwrap()),
            channels: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            pcm_formats: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
            rates: u32::from_le_bytes(buf[16..20].try_into().unwrap()),
        })
    }
}

/// Device init parameters for `DEV_INIT` (§4.5; field set is this
/// crate's call — see `DESIGN.md` — the retrieved original source did
/// not include `struct icap_device_params`'s definition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceParams {
    pub device_id: u32,
    pub channels: u32,
    pub pcm_format: u32,
    pub pcm_rate: u32,
}

impl DeviceParams {
    const WIRE_LEN: usize = 4 * 4;

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.device_id.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.pcm_format.to_le_bytes());
        out.extend_from_slice(&self.pcm_rate.to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Result<Self, IcapError> {
        if buf.len() != Self::WIRE_LEN {
            return Err(IcapError::MsgLen);
        }
        Ok(DeviceParams {
            device_id: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            channels: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            pcm_format: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            pcm_rate: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
        })
    }
}

/// The tagged-union payload, interpreted per `cmd` by whoever decodes it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Payload {
    Empty,
    Raw(Vec<u8>),
    I32(i32),
    U32(u32),
    BufDescriptor(BufDescriptor),
    BufOffsets(BufOffsets),
    BufFrags(BufFrags),
    DeviceFeatures(DeviceFeatures),
    DeviceParams(DeviceParams),
}

impl Payload {
    pub fn to_bytes(&self) -> Result<Vec<u8>, IcapError> {
        let mut out = Vec::new();
        match self {
            Payload::Empty => {}
            Payload::Raw(bytes) => out.extend_from_slice(bytes),
            Payload::I32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Payload::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Payload::BufDescriptor(d) => d.encode(&mut out),
            Payload::BufOffsets(o) => o.encode(&mut out)?,
            Payload::BufFrags(f) => f.encode(&mut out),
            Payload::DeviceFeatures(f) => f.encode(&mut out),
            Payload::DeviceParams(p) => p.encode(&mut out),
        }
        if out.len() as u32 > MAX_PAYLOAD_LEN {
            return Err(IcapError::MsgLen);
        }
        Ok(out)
    }

    /// Decode raw payload bytes as a `u32` scalar (the common ACK shape
    /// for "return an id/count").
    pub fn decode_u32(buf: &[u8]) -> Result<u32, IcapError> {
        if buf.len() != 4 {
            return Err(IcapError::MsgLen);
        }
        Ok(u32::from_le_bytes(buf.try_into().unwrap()))
    }

    /// Decode raw payload bytes as an `i32` scalar (the NAK error shape).
    pub fn decode_i32(buf: &[u8]) -> Result<i32, IcapError> {
        if buf.len() != 4 {
            return Err(IcapError::MsgLen);
        }
        Ok(i32::from_le_bytes(buf.try_into().unwrap()))
    }

    pub fn decode_buf_descriptor(buf: &[u8]) -> Result<BufDescriptor, IcapError> {
        BufDescriptor::decode(buf)
    }

    pub fn decode_buf_offsets(buf: &[u8]) -> Result<BufOffsets, IcapError> {
        BufOffsets::decode(buf)
    }

    pub fn decode_buf_frags(buf: &[u8]) -> Result<BufFrags, IcapError> {
        BufFrags::decode(buf)
    }

    pub fn decode_device_features(buf: &[u8]) -> Result<DeviceFeatures, IcapError> {
        DeviceFeatures::decode(buf)
    }

    pub fn decode_device_params(buf: &[u8]) -> Result<DeviceParams, IcapError> {
        DeviceParams::decode(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buf_descriptor_round_trips() {
        let d = BufDescriptor {
            name: "pcm0".to_string(),
            device_id: 0,
            buf_addr: 0x1000,
            buf_size: 4096,
            buf_type: BufType::Circular as u32,
            gap_size: 0,
            frag_size: 256,
            channels: 2,
            pcm_format: 2,
            pcm_rate: 1 << 7,
        };
        let bytes = Payload::BufDescriptor(d.clone()).to_bytes().unwrap();
        assert_eq!(bytes.len(), BufDescriptor::WIRE_LEN);
        let decoded = Payload::decode_buf_descriptor(&bytes).unwrap();
        assert_eq!(d, decoded);
    }

    #[test]
    fn buf_offsets_round_trips() {
        let o = BufOffsets {
            offsets: vec![0, 256, 512],
        };
        let bytes = Payload::BufOffsets(o.clone()).to_bytes().unwrap();
        assert_eq!(bytes.len(), 4 + MAX_FRAG_OFFSETS * 4);
        let decoded = Payload::decode_buf_offsets(&bytes).unwrap();
        assert_eq!(o, decoded);
    }

    #[test]
    fn buf_offsets_rejects_oversize() {
        let o = BufOffsets {
            offsets: vec![0; MAX_FRAG_OFFSETS + 1],
        };
        assert_eq!(Payload::BufOffsets(o).to_bytes(), Err(IcapError::Invalid));
    }

    #[test]
    fn scalar_round_trips() {
        let bytes = Payload::I32(-22).to_bytes().unwrap();
        assert_eq!(Payload::decode_i32(&bytes), Ok(-22));
        let bytes = Payload::U32(42).to_bytes().unwrap();
        assert_eq!(Payload::decode_u32(&bytes), Ok(42));
    }

    #[test]
    fn buf_frags_matches_e2e4() {
        let f = BufFrags {
            buf_id: 5,
            frags: 16,
        };
        let bytes = Payload::BufFrags(f).to_bytes().unwrap();
        assert_eq!(bytes, vec![5, 0, 0, 0, 16, 0, 0, 0]);
    }
}
