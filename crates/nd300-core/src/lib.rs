//! # nd300-core
//!
//! Core types for the ND-300CM/KM bill dispenser serial protocol.
//!
//! This crate provides the I/O-free half of the driver:
//! - Command and status codes
//! - The protocol registry (sender and data arity per code)
//! - Validated messages
//! - The 6-byte frame codec and checksum

pub mod code;
pub mod error;
pub mod frame;
pub mod message;
pub mod registry;

pub use code::{Code, Command, DataArity, Sender, Status};
pub use error::{DispenserError, Result};
pub use frame::{FRAME_LEN, Frame, compute_checksum, decode, encode};
pub use message::Message;
pub use registry::{RegistryEntry, resolve};
