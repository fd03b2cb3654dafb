//! Decoded messages: a code paired with its optional datum

use crate::code::{Code, Command, DataArity, Sender, Status};
use crate::error::{DispenserError, Result};
use crate::frame::{self, Frame};
use crate::registry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated (code, datum) pair
///
/// The datum is present exactly when the code's arity is
/// [`DataArity::OneByte`]; every constructor enforces this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    code: Code,
    #[serde(skip_serializing_if = "Option::is_none")]
    datum: Option<u8>,
}

impl Message {
    /// Build a message, checking the datum against the code's arity
    pub fn new(code: impl Into<Code>, datum: Option<u8>) -> Result<Self> {
        let code = code.into();
        let expected = registry::data_arity_of(code);
        match (expected, datum) {
            (DataArity::None, None) | (DataArity::OneByte, Some(_)) => Ok(Self { code, datum }),
            _ => Err(DispenserError::DataArityMismatch {
                code,
                expected,
                datum,
            }),
        }
    }

    /// Dispense `quantity` notes from a single machine
    pub const fn single_payout(quantity: u8) -> Self {
        Self {
            code: Code::Command(Command::SingleMachinePayout),
            datum: Some(quantity),
        }
    }

    /// Ask for the current machine status
    pub const fn request_status() -> Self {
        Self {
            code: Code::Command(Command::RequestMachineStatus),
            datum: None,
        }
    }

    /// Reset the dispenser
    pub const fn reset_dispenser() -> Self {
        Self {
            code: Code::Command(Command::ResetDispenser),
            datum: None,
        }
    }

    /// A machine status report
    pub const fn status(status: Status, datum: u8) -> Self {
        Self {
            code: Code::Status(status),
            datum: Some(datum),
        }
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn datum(&self) -> Option<u8> {
        self.datum
    }

    /// The status carried by this message, if it came from the machine
    pub fn as_status(&self) -> Option<Status> {
        self.code.as_status()
    }

    /// The party that sends this message's code
    pub fn sender(&self) -> Sender {
        registry::sender_of(self.code)
    }

    /// Encode to the 6-byte wire frame
    pub fn to_frame(&self) -> Frame {
        frame::encode(self)
    }

    /// Decode and validate a wire frame
    pub fn from_frame(bytes: &[u8]) -> Result<Self> {
        frame::decode(bytes)
    }

    /// Build from parts already checked by the codec
    pub(crate) fn from_checked(code: Code, datum: Option<u8>) -> Self {
        Self { code, datum }
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct Raw {
            code: Code,
            #[serde(default)]
            datum: Option<u8>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Message::new(raw.code, raw.datum).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.sender().arrow(), self.code.name())?;
        match self.datum {
            Some(datum) => write!(f, "{}", datum),
            None => f.write_str("No data"),
        }
    }
}
