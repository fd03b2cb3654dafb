//! Error types for the ND-300 driver

use crate::code::{Code, DataArity, Sender};
use thiserror::Error;

/// Result type for ND-300 operations
pub type Result<T> = std::result::Result<T, DispenserError>;

/// ND-300 error types
#[derive(Debug, Error)]
pub enum DispenserError {
    /// Frame is not exactly [`crate::frame::FRAME_LEN`] bytes
    #[error("Bad frame length: expected {expected} bytes, got {actual}")]
    BadLength { expected: usize, actual: usize },

    /// First byte is not the start marker
    #[error("Bad start byte: expected 0x01, got 0x{0:02X}")]
    BadStartByte(u8),

    /// Byte does not name any command or status
    #[error("Unknown code: 0x{0:02X}")]
    UnknownCode(u8),

    /// Trailing checksum does not match the frame contents
    #[error("Bad checksum: received 0x{received:02X} but computed 0x{computed:02X}")]
    BadChecksum { received: u8, computed: u8 },

    /// Sender byte disagrees with the sender the code requires
    #[error("Bad sender for {code}: received {}, expected {expected}", describe_sender(.received))]
    BadSender {
        code: Code,
        received: u8,
        expected: Sender,
    },

    /// Nothing arrived before the read timeout
    #[error("No response from dispenser at this time")]
    NoResponse,

    /// Some bytes arrived, but not a whole frame
    #[error("Truncated response: {}", hex::encode(.0))]
    Truncated(Vec<u8>),

    /// Attempted to originate a machine-only code
    #[error("Expected an operator command, got {0}")]
    NotAnOperatorCode(Code),

    /// Datum presence does not match the code's arity
    #[error("{code} expects {expected}, got {}", describe_datum(.datum))]
    DataArityMismatch {
        code: Code,
        expected: DataArity,
        datum: Option<u8>,
    },

    /// Payout polling gave up while the machine was still busy
    #[error("Dispenser still busy after {0} status polls")]
    PollLimitExceeded(u32),

    /// Serial port could not be opened or configured
    #[error("Serial error: {0}")]
    Serial(String),

    /// Transport I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_sender(byte: &u8) -> String {
    match Sender::from_byte(*byte) {
        Some(sender) => sender.to_string(),
        None => format!("unknown party (0x{:02X})", byte),
    }
}

fn describe_datum(datum: &Option<u8>) -> String {
    match datum {
        Some(value) => format!("datum {}", value),
        None => "no datum".to_string(),
    }
}

impl DispenserError {
    /// Whether the error came from validating a received frame
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            DispenserError::BadLength { .. }
                | DispenserError::BadStartByte(_)
                | DispenserError::UnknownCode(_)
                | DispenserError::BadChecksum { .. }
                | DispenserError::BadSender { .. }
        )
    }
}
