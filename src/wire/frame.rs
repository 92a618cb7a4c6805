//! A complete self-delimited frame: header + payload, transmitted as one
//! datagram (§3, §4.1).

use crate::error::IcapError;
use crate::wire::command::Cmd;
use crate::wire::header::{Header, MsgType, HEADER_LEN};
use crate::wire::payload::Payload;

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(seq_num: u32, cmd: u32, ty: MsgType, payload: Payload) -> Result<Self, IcapError> {
        let bytes = payload.to_bytes()?;
        Ok(Frame {
            header: Header {
                protocol_version: crate::wire::header::PROTOCOL_VERSION,
                seq_num,
                cmd,
                ty,
                flags: 0,
                payload_len: bytes.len() as u32,
            },
            payload: bytes,
        })
    }

    /// Serialize into one contiguous datagram. Never writes beyond
    /// `HEADER_LEN + payload_len` (§4.1's first design contract).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        let mut header_buf = [0u8; HEADER_LEN];
        self.header.encode(&mut header_buf);
        out.extend_from_slice(&header_buf);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Decode one datagram. `MsgLen` if `len != HEADER_LEN +
    /// header.payload_len` (§4.1's second design contract). `cmd` is
    /// not validated against the known command set here — an unknown
    /// `cmd` on a `MSG` frame must still get a `NAK(MsgId)` reply
    /// (§4.5), which requires a `seq_num` to address it to, so that
    /// check happens in the dispatcher instead of here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IcapError> {
        if bytes.len() < HEADER_LEN {
            return Err(IcapError::MsgLen);
        }
        let header_buf: [u8; HEADER_LEN] = bytes[..HEADER_LEN].try_into().unwrap();
        let header = Header::decode(&header_buf)?;
        let rest = &bytes[HEADER_LEN..];
        if rest.len() as u32 != header.payload_len {
            return Err(IcapError::MsgLen);
        }
        Ok(Frame {
            header,
            payload: rest.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_get_dev_num_request() {
        let frame = Frame::new(1, Cmd::GetDevNum as u32, MsgType::Msg, Payload::Empty).unwrap();
        let bytes = frame.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN);
        let decoded = Frame::from_bytes(&bytes).unwrap();
        assert_eq!(frame, decoded);
    }

    #[test]
    fn round_trips_ack_with_payload() {
        let frame = Frame::new(1, Cmd::GetDevNum as u32, MsgType::Ack, Payload::U32(3)).unwrap();
        let bytes = frame.to_bytes();
        assert_eq!(bytes, vec![
            1, 0, 0, 0, // protocol_version
            1, 0, 0, 0, // seq_num
            9, 0, 0, 0, // cmd
            1, 0, 0, 0, // type=ACK
            0, 0, 0, 0, // flags
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // reserved
            4, 0, 0, 0, // payload_len
            3, 0, 0, 0, // payload
        ]);
        let decoded = Frame::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.payload, vec![3, 0, 0, 0]);
    }

    #[test]
    fn rejects_length_mismatch() {
        let frame = Frame::new(1, Cmd::GetDevNum as u32, MsgType::Ack, Payload::U32(3)).unwrap();
        let mut bytes = frame.to_bytes();
        bytes.pop();
        assert_eq!(Frame::from_bytes(&bytes), Err(IcapError::MsgLen));
    }

    #[test]
    fn decodes_unknown_cmd_on_msg_without_validating() {
        // Validating `cmd` against the known set happens in the
        // dispatcher, which can reply with `NAK(MsgId)`; the decoder
        // itself has no seq_num-addressed way to answer, so it passes
        // an unknown cmd through.
        let frame = Frame::new(1, 1, MsgType::Msg, Payload::Empty).unwrap();
        let bytes = frame.to_bytes();
        assert_eq!(Frame::from_bytes(&bytes).unwrap().header.cmd, 1);
    }

    #[test]
    fn passes_through_unknown_cmd_on_response() {
        let frame = Frame::new(1, 1, MsgType::Ack, Payload::Empty).unwrap();
        let bytes = frame.to_bytes();
        assert!(Frame::from_bytes(&bytes).is_ok());
    }
}
