use crate::domain::error::{F4tError, F4tResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Size of the single receive performed by [`Transport::drain`]
pub const DRAIN_CHUNK_SIZE: usize = 1024;

/// Raw byte transport to one controller.
///
/// Implementations are single-owner: every operation takes `&mut self`, so
/// at most one read or write is in flight on a connection.
#[async_trait]
pub trait Transport: Send {
    /// Receive timeout applied to every read
    fn timeout(&self) -> Duration;

    /// Whether the underlying socket is still held
    fn is_open(&self) -> bool;

    /// Write the whole buffer in one transport write
    async fn write_raw(&mut self, data: &[u8]) -> F4tResult<()>;

    /// Read up to `max_bytes`.
    ///
    /// Fails with `Timeout` when nothing arrives within [`Transport::timeout`]
    /// and with `ConnectionClosed` when the peer has closed the socket.
    async fn read_chunk(&mut self, max_bytes: usize) -> F4tResult<Vec<u8>>;

    /// Release the socket. Calling it again is a no-op.
    async fn close(&mut self) -> F4tResult<()>;

    /// Discard stale bytes left by an earlier transaction.
    ///
    /// Performs one timeout-bounded receive; a timeout counts as an empty
    /// buffer. Returns the number of bytes thrown away.
    async fn drain(&mut self) -> F4tResult<usize> {
        match self.read_chunk(DRAIN_CHUNK_SIZE).await {
            Ok(stale) => {
                warn!("Discarded {} stale bytes: {}", stale.len(), hex::encode(&stale));
                Ok(stale.len())
            }
            Err(F4tError::Timeout { .. }) => {
                debug!("Receive buffer already empty");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}
