//! Transport abstraction for the dispenser link
//!
//! A [`Transport`] moves raw frames. It knows nothing about the protocol
//! beyond "write these bytes" and "give me up to N bytes before the timeout".

use async_trait::async_trait;
use nd300_core::Result;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::debug;

/// Ordered byte channel to the dispenser
#[async_trait]
pub trait Transport: Send {
    /// Write a whole frame and flush it
    async fn write_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Fill `buf` from the link
    ///
    /// Returns once `buf` is full, the peer closes the stream, or the read
    /// timeout elapses, whichever comes first. The return value is the number
    /// of bytes placed in `buf`, which may be anything from 0 to `buf.len()`.
    async fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Flush and close the link
    async fn shutdown(&mut self) -> Result<()>;
}

/// [`Transport`] over any tokio byte stream
///
/// Used with a serial port in production and with in-memory streams in tests.
pub struct StreamTransport<S> {
    stream: S,
    timeout: Duration,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a stream; every read gives up after `timeout`
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self { stream, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Unwrap the underlying stream
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        let deadline = Instant::now() + self.timeout;
        let mut filled = 0;

        while filled < buf.len() {
            match tokio::time::timeout_at(deadline, self.stream.read(&mut buf[filled..])).await {
                Ok(Ok(0)) => {
                    debug!("Stream closed after {} bytes", filled);
                    break;
                }
                Ok(Ok(n)) => filled += n,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    debug!("Read timed out after {} bytes", filled);
                    break;
                }
            }
        }

        Ok(filled)
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_accumulates_split_chunks() {
        let mock = tokio_test::io::Builder::new()
            .read(&[0x01, 0x01])
            .read(&[0x00, 0xAA])
            .read(&[0x03, 0xAF])
            .build();
        let mut transport = StreamTransport::new(mock, Duration::from_secs(1));

        let mut buf = [0u8; 6];
        let n = transport.read_frame(&mut buf).await.unwrap();
        assert_eq!(n, 6);
        assert_eq!(buf, [0x01, 0x01, 0x00, 0xAA, 0x03, 0xAF]);
    }

    #[tokio::test]
    async fn test_read_stops_at_timeout() {
        let (client, mut peer) = tokio::io::duplex(64);
        peer.write_all(&[0x01, 0x01, 0x00]).await.unwrap();

        let mut transport = StreamTransport::new(client, Duration::from_millis(50));
        let mut buf = [0u8; 6];
        let n = transport.read_frame(&mut buf).await.unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..n], &[0x01, 0x01, 0x00]);

        // Keep the peer open until the read has timed out
        drop(peer);
    }

    #[tokio::test]
    async fn test_read_returns_zero_on_silence() {
        let (client, _peer) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(client, Duration::from_millis(20));

        let mut buf = [0u8; 6];
        assert_eq!(transport.read_frame(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_frame() {
        let mock = tokio_test::io::Builder::new()
            .write(&[0x01, 0x10, 0x00, 0x12, 0x00, 0x23])
            .build();
        let mut transport = StreamTransport::new(mock, Duration::from_secs(1));
        transport
            .write_frame(&[0x01, 0x10, 0x00, 0x12, 0x00, 0x23])
            .await
            .unwrap();
    }
}
