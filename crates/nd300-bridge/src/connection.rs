//! Request/response exchanges with the dispenser
//!
//! A [`Connection`] owns one transport and drives it one frame at a time.
//! Nothing runs in the background: every method awaits its full round trip
//! before returning, and callers must not share a connection between tasks.

use crate::serial::{self, SerialConfig, SerialTransport};
use crate::transport::Transport;
use nd300_core::{Code, DispenserError, FRAME_LEN, Message, Result, Sender, registry};
use serde::Serialize;
use tracing::{debug, info, warn};

/// A command and the machine's answer to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Exchange {
    /// The command that started the exchange
    pub sent: Message,
    /// The final message read back
    pub received: Message,
    /// Status requests issued while the machine reported busy
    pub polls: u32,
}

impl Exchange {
    /// The machine answered with a successful payout
    pub fn succeeded(&self) -> bool {
        self.received
            .as_status()
            .is_some_and(|status| status.is_terminal_success())
    }
}

/// Progress of a payout
#[derive(Debug)]
enum PayoutState {
    /// Payout command not yet written
    Requesting,
    /// Waiting for a non-busy status
    AwaitingSettlement { sent: Message, polls: u32 },
    /// The machine reported a final status
    Settled(Exchange),
}

/// Connection to a single dispenser
///
/// Dropping the connection drops the transport, which releases the port on
/// every exit path. [`Connection::close`] additionally flushes first.
pub struct Connection<T> {
    transport: T,
    max_polls: Option<u32>,
}

impl Connection<SerialTransport> {
    /// Open the serial port in `config` and wrap it
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let transport = serial::open(config)?;
        Ok(Self::new(transport).with_max_polls(config.max_polls))
    }
}

impl<T: Transport> Connection<T> {
    /// Wrap an already-open transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            max_polls: None,
        }
    }

    /// Limit how many status polls a payout may issue while the machine is busy
    pub fn with_max_polls(mut self, max_polls: Option<u32>) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn max_polls(&self) -> Option<u32> {
        self.max_polls
    }

    /// Send an operator command, returning the message that was written
    pub async fn send(&mut self, code: impl Into<Code>, datum: Option<u8>) -> Result<Message> {
        let code = code.into();
        if registry::sender_of(code) != Sender::Operator {
            return Err(DispenserError::NotAnOperatorCode(code));
        }
        let message = Message::new(code, datum)?;
        self.write_message(message).await
    }

    /// Read one frame and decode it
    pub async fn receive(&mut self) -> Result<Message> {
        let mut buf = [0u8; FRAME_LEN];
        let n = self.transport.read_frame(&mut buf).await?;

        match n {
            0 => Err(DispenserError::NoResponse),
            n if n < FRAME_LEN => {
                warn!("Truncated frame: {}", hex::encode(&buf[..n]));
                Err(DispenserError::Truncated(buf[..n].to_vec()))
            }
            _ => {
                debug!("[Machine→Operator] {}", hex::encode(buf));
                let message = Message::from_frame(&buf)?;
                debug!("{}", message);
                Ok(message)
            }
        }
    }

    /// Dispense `quantity` notes and wait for the machine to settle
    ///
    /// While the machine answers `DispensingBusy`, a status request is sent
    /// and the next answer read. Any other status ends the payout and is
    /// returned as-is, including failures; the caller inspects it. Transport
    /// and decode errors abort the payout immediately.
    pub async fn payout(&mut self, quantity: u8) -> Result<Exchange> {
        let mut state = PayoutState::Requesting;

        loop {
            state = match state {
                PayoutState::Requesting => {
                    let sent = self.write_message(Message::single_payout(quantity)).await?;
                    PayoutState::AwaitingSettlement { sent, polls: 0 }
                }
                PayoutState::AwaitingSettlement { sent, polls } => {
                    let received = self.receive().await?;
                    let busy = received.as_status().is_some_and(|status| status.is_busy());

                    if busy {
                        if self.max_polls.is_some_and(|max| polls >= max) {
                            warn!("Dispenser still busy after {} polls, giving up", polls);
                            return Err(DispenserError::PollLimitExceeded(polls));
                        }
                        debug!("Dispenser busy, polling status (poll {})", polls + 1);
                        self.write_message(Message::request_status()).await?;
                        PayoutState::AwaitingSettlement {
                            sent,
                            polls: polls + 1,
                        }
                    } else {
                        PayoutState::Settled(Exchange {
                            sent,
                            received,
                            polls,
                        })
                    }
                }
                PayoutState::Settled(exchange) => {
                    if exchange.succeeded() {
                        info!(
                            "Payout of {} settled with {} after {} polls",
                            quantity, exchange.received, exchange.polls
                        );
                    } else {
                        warn!(
                            "Payout of {} settled with {} after {} polls",
                            quantity, exchange.received, exchange.polls
                        );
                    }
                    return Ok(exchange);
                }
            };
        }
    }

    /// Request the machine status once
    pub async fn status(&mut self) -> Result<Exchange> {
        let sent = self.write_message(Message::request_status()).await?;
        let received = self.receive().await?;
        Ok(Exchange {
            sent,
            received,
            polls: 0,
        })
    }

    /// Reset the dispenser
    ///
    /// The machine's answer, if any, is left unread.
    pub async fn reset_dispenser(&mut self) -> Result<Message> {
        self.write_message(Message::reset_dispenser()).await
    }

    /// Flush and release the transport
    pub async fn close(mut self) -> Result<()> {
        self.transport.shutdown().await?;
        info!("Connection closed");
        Ok(())
    }

    /// Unwrap the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    async fn write_message(&mut self, message: Message) -> Result<Message> {
        let frame = message.to_frame();
        debug!("{}", message);
        debug!("[Operator→Machine] {}", hex::encode(frame));
        self.transport.write_frame(&frame).await?;
        Ok(message)
    }
}
