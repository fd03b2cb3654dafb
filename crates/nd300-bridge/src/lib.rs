//! Serial bridge to ND-300CM/KM bill dispensers
//!
//! This crate provides:
//! - A [`Transport`] trait for frame-sized reads and writes with a timeout
//! - A serial port transport (9600 baud, even parity)
//! - [`Connection`], which sends commands, reads statuses and runs payouts
//!
//! Multiple machine payout is not supported.

pub mod connection;
pub mod serial;
pub mod transport;

pub use connection::{Connection, Exchange};
pub use serial::{SerialConfig, SerialTransport};
pub use transport::{StreamTransport, Transport};
