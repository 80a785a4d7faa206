
use crate::proto::command::Command;
use crate::proto::{ProtoError, Result};

/// Length of one answer of the meter.
pub const FRAME_LEN: usize = 12;

/// Last byte of every answer.
pub const FRAME_END: u8 = 0x0a;

pub(crate) const DIGIT_COUNT: usize = 5;

const MODE_BYTE: usize = 1;
const POSITION_BYTE: usize = 2;
const SIGN_BYTE: usize = 4;
const SIGN_FLAG: u8 = 0b0001_0000;
const DIGITS_START: usize = 5;

/// Answer of the meter exactly as received.
///
/// Layout:
///
/// | byte | content                                   |
/// |------|-------------------------------------------|
/// | 0    | echo of the request (`0x89`)              |
/// | 1    | bits 3..6: mode code                      |
/// | 2    | bits 3..5: decimal point position - 1     |
/// | 4    | bit 4: minus sign                         |
/// | 5..9 | display digits, ASCII or `>` for overflow |
/// | 11   | line feed                                 |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame([u8; FRAME_LEN]);

impl RawFrame {
    pub fn new(data: [u8; FRAME_LEN]) -> Self {
        Self(data)
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Checks the framing markers: request echo at the start, line feed at the end.
    pub fn validate(self) -> Result<Self> {
        if self.0[0] != Command::ReadDisplay.byte() || self.0[FRAME_LEN - 1] != FRAME_END {
            return Err(ProtoError::InvalidFrame(self.hex()));
        }
        Ok(self)
    }

    /// Space separated upper case hex dump, e.g. `89 70 08 ...`.
    pub fn hex(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn mode_code(&self) -> u8 {
        (self.0[MODE_BYTE] >> 3) & 0x0f
    }

    /// Decimal point position before any mode specific adjustment, 1..=8.
    pub(crate) fn raw_decimal_position(&self) -> i8 {
        (((self.0[POSITION_BYTE] >> 3) & 0x07) + 1) as i8
    }

    pub(crate) fn is_negative(&self) -> bool {
        self.0[SIGN_BYTE] & SIGN_FLAG != 0
    }

    pub(crate) fn digit_bytes(&self) -> &[u8] {
        &self.0[DIGITS_START..DIGITS_START + DIGIT_COUNT]
    }
}

impl TryFrom<&[u8]> for RawFrame {
    type Error = ProtoError;

    fn try_from(value: &[u8]) -> std::result::Result<Self, Self::Error> {
        let data: [u8; FRAME_LEN] = value.try_into().map_err(|_| ProtoError::ShortRead {
            received: value.len(),
        })?;
        Ok(Self(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DCV: [u8; FRAME_LEN] = [
        0x89, 0x70, 0x08, 0x00, 0x00, b'0', b'1', b'2', b'3', b'4', 0x00, 0x0a,
    ];

    #[test]
    fn accepts_framed_answer() {
        let frame = RawFrame::new(DCV).validate().expect("valid frame");
        assert_eq!(frame.mode_code(), 0xe);
        assert_eq!(frame.raw_decimal_position(), 2);
        assert!(!frame.is_negative());
        assert_eq!(frame.digit_bytes(), b"01234");
    }

    #[test]
    fn rejects_missing_echo() {
        let mut data = DCV;
        data[0] = 0x88;
        match RawFrame::new(data).validate() {
            Err(ProtoError::InvalidFrame(hex)) => {
                assert_eq!(hex, "88 70 08 00 00 30 31 32 33 34 00 0A")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_missing_line_feed() {
        for end in [0x00, 0x0d, 0x89, 0xff] {
            let mut data = DCV;
            data[FRAME_LEN - 1] = end;
            assert!(matches!(
                RawFrame::new(data).validate(),
                Err(ProtoError::InvalidFrame(_))
            ));
        }
    }

    #[test]
    fn invalid_frame_message_carries_dump() {
        let err = RawFrame::new([0; FRAME_LEN]).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Communication device invalid answer: 00 00 00 00 00 00 00 00 00 00 00 00"
        );
    }

    #[test]
    fn sign_flag_is_independent_of_other_bits() {
        for byte in 0..=u8::MAX {
            let mut data = DCV;
            data[SIGN_BYTE] = byte;
            assert_eq!(RawFrame::new(data).is_negative(), byte & 0x10 != 0);
        }
    }

    #[test]
    fn raw_position_uses_three_bits() {
        let mut data = DCV;
        data[POSITION_BYTE] = 0xff;
        assert_eq!(RawFrame::new(data).raw_decimal_position(), 8);
        data[POSITION_BYTE] = 0x07;
        assert_eq!(RawFrame::new(data).raw_decimal_position(), 1);
    }

    #[test]
    fn length_must_match() {
        assert!(matches!(
            RawFrame::try_from(&DCV[..11]),
            Err(ProtoError::ShortRead { received: 11 })
        ));
        assert!(RawFrame::try_from(&DCV[..]).is_ok());
    }
}
