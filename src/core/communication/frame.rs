//! Line framing for the SCPI link.
//!
//! Outbound commands are ASCII followed by a single LF. Inbound replies are
//! collected in fixed-size reads until the last byte received is the LF.

use crate::core::communication::transport::Transport;
use crate::domain::error::{F4tError, F4tResult};
use tracing::{debug, warn};

/// Line terminator for requests and replies
pub const TERMINATOR: u8 = 0x0A;
/// Size of each receive while accumulating a reply
pub const CHUNK_SIZE: usize = 10;

/// A decoded reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply text with trailing whitespace and terminator removed
    pub text: String,
    /// False when the receive timed out before the terminator arrived
    pub complete: bool,
}

/// Encode `text` as ASCII and append the terminator.
///
/// Rejects non-ASCII text and text that already contains the terminator.
pub fn encode_command(text: &str) -> F4tResult<Vec<u8>> {
    if let Some(c) = text.chars().find(|c| !c.is_ascii()) {
        return Err(F4tError::Encoding(format!(
            "'{}' is not representable in ASCII (command {:?})",
            c, text
        )));
    }
    if text.as_bytes().contains(&TERMINATOR) {
        return Err(F4tError::Encoding(format!(
            "command {:?} contains the line terminator",
            text
        )));
    }

    let mut frame = Vec::with_capacity(text.len() + 1);
    frame.extend_from_slice(text.as_bytes());
    frame.push(TERMINATOR);
    Ok(frame)
}

/// Decode accumulated reply bytes and strip trailing whitespace.
pub fn decode_reply(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

/// Request/response framing over a [`Transport`].
pub struct Framer<T> {
    transport: T,
    chunk_size: usize,
}

impl<T: Transport> Framer<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            chunk_size: CHUNK_SIZE,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one command as a single write.
    pub async fn send_command(&mut self, text: &str) -> F4tResult<()> {
        let frame = encode_command(text)?;
        debug!("TX {:?} [{}]", text, hex::encode(&frame));
        self.transport.write_raw(&frame).await
    }

    /// Accumulate one reply.
    ///
    /// A timeout before the terminator ends accumulation and yields the
    /// bytes collected so far with `complete == false`. Peer close and I/O
    /// failures propagate.
    pub async fn read_response(&mut self) -> F4tResult<Reply> {
        let mut accumulator: Vec<u8> = Vec::new();

        let complete = loop {
            match self.transport.read_chunk(self.chunk_size).await {
                Ok(chunk) => {
                    accumulator.extend_from_slice(&chunk);
                    if accumulator.last() == Some(&TERMINATOR) {
                        break true;
                    }
                }
                Err(F4tError::Timeout { .. }) => break false,
                Err(e) => return Err(e),
            }
        };

        let text = decode_reply(&accumulator);
        if complete {
            debug!("RX {:?} [{}]", text, hex::encode(&accumulator));
        } else {
            warn!(
                "Receive timed out after {} bytes without terminator: {:?}",
                accumulator.len(),
                text
            );
        }
        Ok(Reply { text, complete })
    }

    /// One full transaction: send then read.
    pub async fn query(&mut self, text: &str) -> F4tResult<Reply> {
        self.send_command(text).await?;
        self.read_response().await
    }

    pub async fn drain(&mut self) -> F4tResult<usize> {
        self.transport.drain().await
    }

    pub async fn close(&mut self) -> F4tResult<()> {
        self.transport.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::tcp::client::TcpConnection;
    use proptest::prelude::*;
    use std::time::Duration;

    fn mock_framer(stream: tokio_test::io::Mock) -> Framer<TcpConnection<tokio_test::io::Mock>> {
        Framer::new(TcpConnection::from_stream(
            stream,
            "mock",
            Duration::from_millis(100),
        ))
    }

    #[test]
    fn test_encode_appends_single_terminator() {
        assert_eq!(encode_command("*IDN?").unwrap(), b"*IDN?\n".to_vec());
        assert_eq!(encode_command("").unwrap(), b"\n".to_vec());
    }

    #[test]
    fn test_encode_rejects_non_ascii_and_terminator() {
        assert!(matches!(encode_command(":UNITS:TEMPERATURE °C"), Err(F4tError::Encoding(_))));
        assert!(matches!(encode_command("*IDN?\n*RST"), Err(F4tError::Encoding(_))));
    }

    #[test]
    fn test_decode_strips_trailing_whitespace() {
        assert_eq!(decode_reply(b"25.00\r\n"), "25.00");
        assert_eq!(decode_reply(b""), "");
    }

    #[tokio::test]
    async fn test_idn_round_trip() {
        let stream = tokio_test::io::Builder::new()
            .write(b"*IDN?\n")
            .read(b"WATLOW ELECTRIC,F4T1L1AA1A4A1AA,1234567,01.05.0009\n")
            .build();
        let mut framer = mock_framer(stream);

        let reply = framer.query("*IDN?").await.unwrap();
        assert!(reply.complete);
        assert_eq!(reply.text, "WATLOW ELECTRIC,F4T1L1AA1A4A1AA,1234567,01.05.0009");
    }

    #[tokio::test]
    async fn test_reply_split_across_reads() {
        let stream = tokio_test::io::Builder::new()
            .read(b"RAM")
            .read(b"PA")
            .read(b"\n")
            .build();
        let mut framer = mock_framer(stream);

        let reply = framer.read_response().await.unwrap();
        assert_eq!(reply, Reply { text: "RampA".to_string(), complete: true });
    }

    #[tokio::test]
    async fn test_peer_close_mid_reply_propagates() {
        let stream = tokio_test::io::Builder::new().read(b"25.").build();
        let mut framer = mock_framer(stream);

        assert!(matches!(framer.read_response().await, Err(F4tError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_encoding_error_writes_nothing() {
        let stream = tokio_test::io::Builder::new().build();
        let mut framer = mock_framer(stream);

        assert!(framer.send_command("température?").await.is_err());
    }

    proptest! {
        #[test]
        fn prop_frame_is_text_plus_terminator(text in "[ -~]{0,64}") {
            let frame = encode_command(&text).unwrap();
            prop_assert_eq!(frame.len(), text.len() + 1);
            prop_assert_eq!(&frame[..text.len()], text.as_bytes());
            prop_assert_eq!(frame.iter().filter(|b| **b == TERMINATOR).count(), 1);
        }

        #[test]
        fn prop_reply_decodes_without_terminator(text in "[!-~]([ -~]{0,30}[!-~])?") {
            let mut wire = text.clone().into_bytes();
            wire.push(TERMINATOR);
            prop_assert_eq!(decode_reply(&wire), text);
        }
    }
}
