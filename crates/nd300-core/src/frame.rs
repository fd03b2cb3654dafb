//! Frame codec: [`Message`] to and from the fixed 6-byte wire frame
//!
//! No I/O happens here; this is pure data transformation.
//!
//! # Wire format
//!
//! ```text
//! +-------+--------+----------+------+-------+----------+
//! | start | sender | reserved | code | datum | checksum |
//! | 0x01  | 0x10/1 |   0x00   |      |       |          |
//! +-------+--------+----------+------+-------+----------+
//!     0       1         2        3       4        5
//! ```
//!
//! The datum byte is always present; codes without data send 0. The checksum
//! is the sum of bytes 0-4 with overflow discarded.

use crate::code::DataArity;
use crate::error::{DispenserError, Result};
use crate::message::Message;
use crate::registry;

/// Length of every frame on the wire
pub const FRAME_LEN: usize = 6;

/// First byte of every frame
pub const START_BYTE: u8 = 0x01;

/// Byte 2 is unused and always zero
pub const RESERVED_BYTE: u8 = 0x00;

/// A raw frame
pub type Frame = [u8; FRAME_LEN];

// Byte offsets of each field within a frame.
const OFF_START: usize = 0;
const OFF_SENDER: usize = 1;
const OFF_RESERVED: usize = 2;
const OFF_CODE: usize = 3;
const OFF_DATUM: usize = 4;
const OFF_CHECKSUM: usize = 5;

/// Sum of `bytes`, modulo 256
pub fn compute_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Encode a message into its wire frame
pub fn encode(message: &Message) -> Frame {
    let code = message.code();
    let mut frame = [0u8; FRAME_LEN];
    frame[OFF_START] = START_BYTE;
    frame[OFF_SENDER] = registry::sender_of(code).byte();
    frame[OFF_RESERVED] = RESERVED_BYTE;
    frame[OFF_CODE] = code.byte();
    frame[OFF_DATUM] = message.datum().unwrap_or(0);
    frame[OFF_CHECKSUM] = compute_checksum(&frame[..OFF_CHECKSUM]);
    frame
}

/// Decode and validate a wire frame
///
/// Checks run in order: length, start byte, code, checksum, sender. Each
/// check assumes the previous ones passed, so the first failure is the most
/// specific diagnosis available.
pub fn decode(bytes: &[u8]) -> Result<Message> {
    if bytes.len() != FRAME_LEN {
        return Err(DispenserError::BadLength {
            expected: FRAME_LEN,
            actual: bytes.len(),
        });
    }

    if bytes[OFF_START] != START_BYTE {
        return Err(DispenserError::BadStartByte(bytes[OFF_START]));
    }

    let code = registry::resolve(bytes[OFF_CODE])?;

    let received = bytes[OFF_CHECKSUM];
    let computed = compute_checksum(&bytes[..OFF_CHECKSUM]);
    if received != computed {
        return Err(DispenserError::BadChecksum { received, computed });
    }

    let entry = registry::entry(code);
    if bytes[OFF_SENDER] != entry.sender.byte() {
        return Err(DispenserError::BadSender {
            code,
            received: bytes[OFF_SENDER],
            expected: entry.sender,
        });
    }

    let datum = match entry.arity {
        DataArity::None => None,
        DataArity::OneByte => Some(bytes[OFF_DATUM]),
    };

    Ok(Message::from_checked(code, datum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Code, Command, Status};
    use crate::registry::REGISTRY;

    #[test]
    fn test_compute_checksum() {
        assert_eq!(compute_checksum(&[0x01, 0x01, 0x00, 0xBB, 0x0B]), 0xC8);
        // Overflow is discarded
        assert_eq!(compute_checksum(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF]), 0xFB);
        assert_eq!(compute_checksum(&[]), 0x00);
    }

    #[test]
    fn test_encode() {
        assert_eq!(
            encode(&Message::single_payout(23)),
            [0x01, 0x10, 0x00, 0x10, 0x17, 0x38]
        );
        assert_eq!(
            encode(&Message::reset_dispenser()),
            [0x01, 0x10, 0x00, 0x12, 0x00, 0x23]
        );
        assert_eq!(
            encode(&Message::status(Status::PayoutSuccessful, 3)),
            [0x01, 0x01, 0x00, 0xAA, 0x03, 0xAF]
        );
    }

    #[test]
    fn test_decode_valid() {
        assert_eq!(
            decode(&[0x01, 0x10, 0x00, 0x10, 0x17, 0x38]).unwrap(),
            Message::single_payout(23)
        );
        assert_eq!(
            decode(&[0x01, 0x01, 0x00, 0xAA, 0x03, 0xAF]).unwrap(),
            Message::status(Status::PayoutSuccessful, 3)
        );
    }

    #[test]
    fn test_decode_no_data_code_drops_datum() {
        let msg = decode(&[0x01, 0x10, 0x00, 0x11, 0x00, 0x22]).unwrap();
        assert_eq!(msg, Message::request_status());
        assert_eq!(msg.datum(), None);
    }

    #[test]
    fn test_decode_bad_length() {
        match decode(&[0x01, 0x10, 0x00, 0x10, 0x17]) {
            Err(DispenserError::BadLength { expected: 6, actual: 5 }) => {}
            other => panic!("Expected BadLength, got {:?}", other),
        }
        match decode(&[0x01, 0x10, 0x00, 0x10, 0x17, 0x38, 0x01]) {
            Err(DispenserError::BadLength { expected: 6, actual: 7 }) => {}
            other => panic!("Expected BadLength, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_bad_start_byte() {
        assert!(matches!(
            decode(&[0x00, 0x10, 0x00, 0x10, 0x17, 0x38]),
            Err(DispenserError::BadStartByte(0x00))
        ));
    }

    #[test]
    fn test_decode_unknown_code() {
        assert!(matches!(
            decode(&[0x01, 0x01, 0x00, 0x42, 0x00, 0x44]),
            Err(DispenserError::UnknownCode(0x42))
        ));
    }

    #[test]
    fn test_decode_bad_checksum() {
        match decode(&[0x01, 0x10, 0x00, 0x10, 0x17, 0x33]) {
            Err(DispenserError::BadChecksum { received, computed }) => {
                assert_eq!(received, 0x33);
                assert_eq!(computed, 0x38);
            }
            other => panic!("Expected BadChecksum, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_bad_sender() {
        // Command code with machine sender byte
        match decode(&[0x01, 0x01, 0x00, 0x10, 0x17, 0x29]) {
            Err(DispenserError::BadSender { code, received, .. }) => {
                assert_eq!(code, Code::Command(Command::SingleMachinePayout));
                assert_eq!(received, 0x01);
            }
            other => panic!("Expected BadSender, got {:?}", other),
        }
        // Status code with operator sender byte
        assert!(matches!(
            decode(&[0x01, 0x10, 0x00, 0xAA, 0x03, 0xBE]),
            Err(DispenserError::BadSender { .. })
        ));
    }

    #[test]
    fn test_checksum_checked_before_sender() {
        // Wrong sender and wrong checksum: the checksum is reported
        assert!(matches!(
            decode(&[0x01, 0x01, 0x00, 0x10, 0x17, 0x38]),
            Err(DispenserError::BadChecksum { .. })
        ));
    }

    #[test]
    fn test_every_code_survives_the_wire() {
        for entry in REGISTRY {
            let data: Vec<Option<u8>> = match entry.arity {
                DataArity::None => vec![None],
                DataArity::OneByte => (0..=u8::MAX).map(Some).collect(),
            };
            for datum in data {
                let msg = Message::new(entry.code, datum).unwrap();
                assert_eq!(decode(&encode(&msg)).unwrap(), msg);
            }
        }
    }
}
