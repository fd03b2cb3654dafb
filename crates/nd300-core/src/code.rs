//! Protocol codes and the parties that send them
//!
//! Every byte at offset 3 of a frame names either a [`Command`] (operator to
//! machine) or a [`Status`] (machine to operator). The two families never
//! share a value, so a single byte resolves to at most one [`Code`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sender byte values on the wire
pub mod sender_byte {
    /// Frames originating from the operator (host)
    pub const OPERATOR: u8 = 0x10;
    /// Frames originating from the dispenser
    pub const MACHINE: u8 = 0x01;
}

/// Party of origin for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    /// Host driving the dispenser
    Operator,
    /// The dispenser itself
    Machine,
}

impl Sender {
    /// Get the wire protocol value
    pub const fn byte(self) -> u8 {
        match self {
            Sender::Operator => sender_byte::OPERATOR,
            Sender::Machine => sender_byte::MACHINE,
        }
    }

    /// Parse a sender byte, if it names a known party
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            sender_byte::OPERATOR => Some(Sender::Operator),
            sender_byte::MACHINE => Some(Sender::Machine),
            _ => None,
        }
    }

    /// Log arrow for this direction of travel
    pub const fn arrow(self) -> &'static str {
        match self {
            Sender::Operator => "==>",
            Sender::Machine => "<==",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Operator => write!(f, "operator (0x{:02X})", self.byte()),
            Sender::Machine => write!(f, "machine (0x{:02X})", self.byte()),
        }
    }
}

/// Whether a code carries a semantic data byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataArity {
    /// The data byte is present on the wire but always zero
    None,
    /// One unsigned byte, 0-255
    OneByte,
}

impl fmt::Display for DataArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataArity::None => f.write_str("no datum"),
            DataArity::OneByte => f.write_str("a one-byte datum"),
        }
    }
}

/// Operator to machine commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    /// Dispense notes from this machine; datum is the quantity
    SingleMachinePayout = 0x10,
    /// Ask the machine for its current status
    RequestMachineStatus = 0x11,
    /// Reset the dispenser mechanism
    ResetDispenser = 0x12,
    /// Dispense across chained machines; datum is the quantity
    MultipleMachinesPayout = 0x13,
}

impl Command {
    /// All commands, in wire order
    pub const ALL: [Command; 4] = [
        Command::SingleMachinePayout,
        Command::RequestMachineStatus,
        Command::ResetDispenser,
        Command::MultipleMachinesPayout,
    ];

    /// Get the wire protocol value
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Look up a command by its wire value
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x10 => Some(Command::SingleMachinePayout),
            0x11 => Some(Command::RequestMachineStatus),
            0x12 => Some(Command::ResetDispenser),
            0x13 => Some(Command::MultipleMachinesPayout),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Command::SingleMachinePayout => "SingleMachinePayout",
            Command::RequestMachineStatus => "RequestMachineStatus",
            Command::ResetDispenser => "ResetDispenser",
            Command::MultipleMachinesPayout => "MultipleMachinesPayout",
        }
    }
}

/// Machine to operator statuses
///
/// Every status carries a one-byte datum. For payout results it is the number
/// of notes involved; for conditions it is whatever the firmware reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Status {
    StatusFine = 0x00,
    EmptyNote = 0x01,
    StockLess = 0x02,
    NoteJam = 0x03,
    OverLength = 0x04,
    NoteNotExit = 0x05,
    SensorError = 0x06,
    DoubleNoteError = 0x07,
    MotorError = 0x08,
    /// Still dispensing; poll again
    DispensingBusy = 0x09,
    SensorAdjusting = 0x0A,
    ChecksumError = 0x0B,
    LowPowerError = 0x0C,
    PayoutSuccessful = 0xAA,
    PayoutFails = 0xBB,
}

impl Status {
    /// All statuses, in wire order
    pub const ALL: [Status; 15] = [
        Status::StatusFine,
        Status::EmptyNote,
        Status::StockLess,
        Status::NoteJam,
        Status::OverLength,
        Status::NoteNotExit,
        Status::SensorError,
        Status::DoubleNoteError,
        Status::MotorError,
        Status::DispensingBusy,
        Status::SensorAdjusting,
        Status::ChecksumError,
        Status::LowPowerError,
        Status::PayoutSuccessful,
        Status::PayoutFails,
    ];

    /// Get the wire protocol value
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Look up a status by its wire value
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Status::StatusFine),
            0x01 => Some(Status::EmptyNote),
            0x02 => Some(Status::StockLess),
            0x03 => Some(Status::NoteJam),
            0x04 => Some(Status::OverLength),
            0x05 => Some(Status::NoteNotExit),
            0x06 => Some(Status::SensorError),
            0x07 => Some(Status::DoubleNoteError),
            0x08 => Some(Status::MotorError),
            0x09 => Some(Status::DispensingBusy),
            0x0A => Some(Status::SensorAdjusting),
            0x0B => Some(Status::ChecksumError),
            0x0C => Some(Status::LowPowerError),
            0xAA => Some(Status::PayoutSuccessful),
            0xBB => Some(Status::PayoutFails),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Status::StatusFine => "StatusFine",
            Status::EmptyNote => "EmptyNote",
            Status::StockLess => "StockLess",
            Status::NoteJam => "NoteJam",
            Status::OverLength => "OverLength",
            Status::NoteNotExit => "NoteNotExit",
            Status::SensorError => "SensorError",
            Status::DoubleNoteError => "DoubleNoteError",
            Status::MotorError => "MotorError",
            Status::DispensingBusy => "DispensingBusy",
            Status::SensorAdjusting => "SensorAdjusting",
            Status::ChecksumError => "ChecksumError",
            Status::LowPowerError => "LowPowerError",
            Status::PayoutSuccessful => "PayoutSuccessful",
            Status::PayoutFails => "PayoutFails",
        }
    }

    /// The machine is still working on a payout
    pub const fn is_busy(self) -> bool {
        matches!(self, Status::DispensingBusy)
    }

    /// The payout completed
    pub const fn is_terminal_success(self) -> bool {
        matches!(self, Status::PayoutSuccessful)
    }

    /// Fault conditions, as opposed to payout results, busy or fine
    pub const fn is_error(self) -> bool {
        !matches!(
            self,
            Status::StatusFine
                | Status::DispensingBusy
                | Status::SensorAdjusting
                | Status::PayoutSuccessful
        )
    }
}

/// A protocol code: either a command or a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Code {
    Command(Command),
    Status(Status),
}

impl Code {
    /// Get the wire protocol value
    pub const fn byte(self) -> u8 {
        match self {
            Code::Command(command) => command.byte(),
            Code::Status(status) => status.byte(),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Code::Command(command) => command.name(),
            Code::Status(status) => status.name(),
        }
    }

    /// The status, if this code is one
    pub const fn as_status(self) -> Option<Status> {
        match self {
            Code::Status(status) => Some(status),
            Code::Command(_) => None,
        }
    }
}

impl From<Command> for Code {
    fn from(command: Command) -> Self {
        Code::Command(command)
    }
}

impl From<Status> for Code {
    fn from(status: Status) -> Self {
        Code::Status(status)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.byte())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes_roundtrip() {
        for command in Command::ALL {
            assert_eq!(Command::from_byte(command.byte()), Some(command));
        }
    }

    #[test]
    fn test_status_bytes_roundtrip() {
        for status in Status::ALL {
            assert_eq!(Status::from_byte(status.byte()), Some(status));
        }
    }

    #[test]
    fn test_families_are_disjoint() {
        for command in Command::ALL {
            assert!(
                Status::from_byte(command.byte()).is_none(),
                "{} collides with a status",
                command.name()
            );
        }
    }

    #[test]
    fn test_sender_bytes() {
        assert_eq!(Sender::Operator.byte(), 0x10);
        assert_eq!(Sender::Machine.byte(), 0x01);
        assert_eq!(Sender::from_byte(0x10), Some(Sender::Operator));
        assert_eq!(Sender::from_byte(0x02), None);
    }

    #[test]
    fn test_status_classification() {
        assert!(Status::DispensingBusy.is_busy());
        assert!(!Status::PayoutSuccessful.is_error());
        assert!(Status::PayoutFails.is_error());
        assert!(Status::NoteJam.is_error());
        assert!(!Status::StatusFine.is_error());

        assert!(Status::PayoutSuccessful.is_terminal_success());
        let successes = Status::ALL
            .iter()
            .filter(|status| status.is_terminal_success())
            .count();
        assert_eq!(successes, 1);
        assert!(!Status::StatusFine.is_terminal_success());
        assert!(!Status::DispensingBusy.is_terminal_success());
    }

    #[test]
    fn test_code_json_format() {
        let json = serde_json::to_string(&Code::Status(Status::PayoutSuccessful)).unwrap();
        assert_eq!(json, "\"PayoutSuccessful\"");

        let code: Code = serde_json::from_str("\"ResetDispenser\"").unwrap();
        assert_eq!(code, Code::Command(Command::ResetDispenser));
    }
}
