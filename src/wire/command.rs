//! Command identifiers and PCM format/rate constants (§6).

use crate::error::IcapError;

/// Command identifier carried in a frame's `cmd` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Cmd {
    GetDevNum = 9,
    GetDevFeatures = 10,
    DevInit = 11,
    DevDeinit = 12,
    AddSrc = 50,
    AddDst = 51,
    RemoveSrc = 52,
    RemoveDst = 53,
    Start = 54,
    Stop = 55,
    Pause = 56,
    Resume = 57,
    BufOffsets = 58,
    FragReady = 59,
    Xrun = 60,
    Error = 200,
}

impl Cmd {
    /// Look up a known command, or `None` for an id outside the known
    /// set. Decoding a `MSG` frame with an unknown `cmd` is `MsgId`
    /// (§4.1); responses pass arbitrary `cmd` values through untouched,
    /// so only `MSG` decoding consults this.
    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            9 => Cmd::GetDevNum,
            10 => Cmd::GetDevFeatures,
            11 => Cmd::DevInit,
            12 => Cmd::DevDeinit,
            50 => Cmd::AddSrc,
            51 => Cmd::AddDst,
            52 => Cmd::RemoveSrc,
            53 => Cmd::RemoveDst,
            54 => Cmd::Start,
            55 => Cmd::Stop,
            56 => Cmd::Pause,
            57 => Cmd::Resume,
            58 => Cmd::BufOffsets,
            59 => Cmd::FragReady,
            60 => Cmd::Xrun,
            200 => Cmd::Error,
            _ => return None,
        })
    }

    /// Validate and convert a raw `cmd` field found on an inbound `MSG`.
    pub fn from_msg_cmd(v: u32) -> Result<Self, IcapError> {
        Cmd::from_u32(v).ok_or(IcapError::MsgId)
    }
}

/// PCM sample format codes (§6), values 0..=17.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PcmFormat {
    S8 = 0,
    U8 = 1,
    S16Le = 2,
    S16Be = 3,
    U16Le = 4,
    U16Be = 5,
    S24Le = 6,
    S24Be = 7,
    U24Le = 8,
    U24Be = 9,
    S32Le = 10,
    S32Be = 11,
    U32Le = 12,
    U32Be = 13,
    FloatLe = 14,
    FloatBe = 15,
    Float64Le = 16,
    Float64Be = 17,
}

impl PcmFormat {
    pub fn from_u32(v: u32) -> Option<Self> {
        const TABLE: [PcmFormat; 18] = [
            PcmFormat::S8,
            PcmFormat::U8,
            PcmFormat::S16Le,
            PcmFormat::S16Be,
            PcmFormat::U16Le,
            PcmFormat::U16Be,
            PcmFormat::S24Le,
            PcmFormat::S24Be,
            PcmFormat::U24Le,
            PcmFormat::U24Be,
            PcmFormat::S32Le,
            PcmFormat::S32Be,
            PcmFormat::U32Le,
            PcmFormat::U32Be,
            PcmFormat::FloatLe,
            PcmFormat::FloatBe,
            PcmFormat::Float64Le,
            PcmFormat::Float64Be,
        ];
        TABLE.get(v as usize).copied()
    }

    /// Feature-mask bit for this format: `1 << code`.
    pub fn mask_bit(self) -> u32 {
        1u32 << (self as u32)
    }
}

/// Sample rate bit position within a device's rate mask (§6). Bit 30
/// means "any rate" and has no discrete frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmRate(pub u32);

impl PcmRate {
    const RATES_HZ: [u32; 15] = [
        5512, 8000, 11025, 16000, 22050, 32000, 44100, 48000, 64000, 88200, 96000, 176400,
        192000, 320000, 384000,
    ];

    pub const ANY_RATE_BIT: u32 = 30;

    /// Bit position for a concrete sample rate, if it's one of the
    /// known 15 frequencies (bits 0..=14).
    pub fn bit_for_hz(hz: u32) -> Option<u32> {
        Self::RATES_HZ.iter().position(|&r| r == hz).map(|i| i as u32)
    }

    pub fn hz_for_bit(bit: u32) -> Option<u32> {
        Self::RATES_HZ.get(bit as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmd_round_trips() {
        for raw in [9, 10, 11, 12, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 200] {
            let cmd = Cmd::from_u32(raw).unwrap();
            assert_eq!(cmd as u32, raw);
        }
    }

    #[test]
    fn unknown_cmd_is_none() {
        assert!(Cmd::from_u32(1).is_none());
        assert_eq!(Cmd::from_msg_cmd(1), Err(IcapError::MsgId));
    }

    #[test]
    fn pcm_format_mask_bit() {
        assert_eq!(PcmFormat::S8.mask_bit(), 1);
        assert_eq!(PcmFormat::S16Le.mask_bit(), 1 << 2);
    }

    #[test]
    fn pcm_rate_bit_for_48k() {
        assert_eq!(PcmRate::bit_for_hz(48000), Some(7));
        assert_eq!(PcmRate::hz_for_bit(7), Some(48000));
    }
}
