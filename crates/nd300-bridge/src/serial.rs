//! Serial port adapter
//!
//! The ND-300 talks 9600 baud, 8 data bits, even parity, 1 stop bit.

use crate::transport::StreamTransport;
use nd300_core::{DispenserError, Result};
use std::time::Duration;
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::info;

/// Default device path for USB serial adapters on Linux
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Fixed line speed of the dispenser
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Transport over a real serial port
pub type SerialTransport = StreamTransport<SerialStream>;

/// Configuration for a dispenser connection
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Serial device path
    pub device: String,
    /// Line speed
    pub baud_rate: u32,
    /// Parity bit
    pub parity: Parity,
    /// How long a single read waits for a full frame
    pub timeout: Duration,
    /// Cap on status polls during a payout; `None` polls until the machine settles
    pub max_polls: Option<u32>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::Even,
            timeout: Duration::from_secs(2),
            max_polls: None,
        }
    }
}

impl SerialConfig {
    /// Default settings against a specific device
    pub fn with_device(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }
}

/// Open the serial port described by `config`
///
/// Must be called from within a tokio runtime.
pub fn open(config: &SerialConfig) -> Result<SerialTransport> {
    info!(
        "Opening {} at {} baud, parity {:?}",
        config.device, config.baud_rate, config.parity
    );

    let stream = tokio_serial::new(config.device.as_str(), config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(config.parity)
        .stop_bits(StopBits::One)
        .timeout(config.timeout)
        .open_native_async()
        .map_err(|e| DispenserError::Serial(format!("Failed to open {}: {}", config.device, e)))?;

    Ok(StreamTransport::new(stream, config.timeout))
}
