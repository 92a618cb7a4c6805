//! Wire codec (§4.1): framing, packing and validation of the fixed
//! header + tagged-union payload.

pub mod command;
pub mod frame;
pub mod header;
pub mod payload;

pub use command::{Cmd, PcmFormat, PcmRate};
pub use frame::Frame;
pub use header::{Header, MsgType, HEADER_LEN, MAX_PAYLOAD_LEN, PROTOCOL_VERSION};
pub use payload::{BufDescriptor, BufFrags, BufOffsets, BufType, DeviceFeatures, DeviceParams, Payload};
