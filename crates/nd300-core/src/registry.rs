//! Protocol registry: which party sends each code and whether it carries data
//!
//! The table is a compile-time constant. Lookups are `const fn` matches over
//! the two code families, so they are total and never allocate.

use crate::code::{Code, Command, DataArity, Sender, Status};
use crate::error::{DispenserError, Result};

/// Metadata for one protocol code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub code: Code,
    pub sender: Sender,
    pub arity: DataArity,
}

/// Number of codes the protocol defines
pub const CODE_COUNT: usize = Command::ALL.len() + Status::ALL.len();

/// Every recognized code with its metadata, commands first
pub const REGISTRY: [RegistryEntry; CODE_COUNT] = build_registry();

const fn build_registry() -> [RegistryEntry; CODE_COUNT] {
    let mut table = [entry(Code::Command(Command::SingleMachinePayout)); CODE_COUNT];
    let mut i = 0;
    while i < Command::ALL.len() {
        table[i] = entry(Code::Command(Command::ALL[i]));
        i += 1;
    }
    let mut j = 0;
    while j < Status::ALL.len() {
        table[Command::ALL.len() + j] = entry(Code::Status(Status::ALL[j]));
        j += 1;
    }
    table
}

/// Registry entry for a code
pub const fn entry(code: Code) -> RegistryEntry {
    RegistryEntry {
        code,
        sender: sender_of(code),
        arity: data_arity_of(code),
    }
}

/// The only party allowed to send `code`
pub const fn sender_of(code: Code) -> Sender {
    match code {
        Code::Command(_) => Sender::Operator,
        Code::Status(_) => Sender::Machine,
    }
}

/// Whether `code` carries a semantic datum
pub const fn data_arity_of(code: Code) -> DataArity {
    match code {
        Code::Command(Command::SingleMachinePayout)
        | Code::Command(Command::MultipleMachinesPayout) => DataArity::OneByte,
        Code::Command(Command::RequestMachineStatus) | Code::Command(Command::ResetDispenser) => {
            DataArity::None
        }
        Code::Status(_) => DataArity::OneByte,
    }
}

/// Resolve a raw code byte, trying commands before statuses
pub fn resolve(byte: u8) -> Result<Code> {
    if let Some(command) = Command::from_byte(byte) {
        return Ok(Code::Command(command));
    }
    Status::from_byte(byte)
        .map(Code::Status)
        .ok_or(DispenserError::UnknownCode(byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_code() {
        assert_eq!(REGISTRY.len(), 19);
        for entry in REGISTRY {
            assert_eq!(resolve(entry.code.byte()).unwrap(), entry.code);
        }
    }

    #[test]
    fn test_command_metadata() {
        let payout = entry(Code::Command(Command::SingleMachinePayout));
        assert_eq!(payout.sender, Sender::Operator);
        assert_eq!(payout.arity, DataArity::OneByte);

        assert_eq!(
            data_arity_of(Code::Command(Command::RequestMachineStatus)),
            DataArity::None
        );
        assert_eq!(
            data_arity_of(Code::Command(Command::ResetDispenser)),
            DataArity::None
        );
        assert_eq!(
            data_arity_of(Code::Command(Command::MultipleMachinesPayout)),
            DataArity::OneByte
        );
    }

    #[test]
    fn test_statuses_come_from_machine_with_data() {
        for status in Status::ALL {
            let entry = entry(Code::Status(status));
            assert_eq!(entry.sender, Sender::Machine);
            assert_eq!(entry.arity, DataArity::OneByte);
        }
    }

    #[test]
    fn test_resolve_prefers_commands() {
        assert_eq!(resolve(0x10).unwrap(), Code::Command(Command::SingleMachinePayout));
        assert_eq!(resolve(0x09).unwrap(), Code::Status(Status::DispensingBusy));
        assert_eq!(resolve(0xAA).unwrap(), Code::Status(Status::PayoutSuccessful));
    }

    #[test]
    fn test_resolve_unknown() {
        match resolve(0x42) {
            Err(DispenserError::UnknownCode(0x42)) => {}
            other => panic!("Expected UnknownCode, got {:?}", other),
        }
    }
}
