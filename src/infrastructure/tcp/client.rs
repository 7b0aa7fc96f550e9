use crate::core::communication::transport::Transport;
use crate::domain::{
    config::ConnectionConfig,
    error::{F4tError, F4tResult},
};
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

/// One socket to one controller.
///
/// The stream is released by `close()` or, failing that, when the value is
/// dropped, so every exit path of the owning scope frees the socket.
pub struct TcpConnection<S = TcpStream> {
    peer: String,
    stream: Option<S>,
    timeout: Duration,
}

impl TcpConnection<TcpStream> {
    /// Connect to `host:port`. The configured timeout bounds the handshake.
    pub async fn open(config: &ConnectionConfig) -> F4tResult<Self> {
        let host = config.host.as_str();
        let port = config.port;
        info!("Connecting to F4T at {}:{}", host, port);

        let stream = tokio::time::timeout(config.timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| F4tError::Connection {
                host: host.to_string(),
                port,
                reason: format!("handshake timed out after {:?}", config.timeout),
            })?
            .map_err(|e| F4tError::Connection {
                host: host.to_string(),
                port,
                reason: e.to_string(),
            })?;

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        info!("TCP connection established to {}:{}", host, port);
        Ok(Self::from_stream(
            stream,
            format!("{}:{}", host, port),
            config.timeout,
        ))
    }
}

impl<S> TcpConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream
    pub fn from_stream(stream: S, peer: impl Into<String>, timeout: Duration) -> Self {
        Self {
            peer: peer.into(),
            stream: Some(stream),
            timeout,
        }
    }

    fn stream_mut(&mut self) -> F4tResult<&mut S> {
        self.stream.as_mut().ok_or(F4tError::NotConnected)
    }

    /// Map a socket error, dropping the stream when the peer is gone.
    fn io_failure(&mut self, error: io::Error) -> F4tError {
        if peer_gone(&error) {
            info!("Connection to {} lost: {}", self.peer, error);
            self.stream = None;
            F4tError::ConnectionClosed
        } else {
            F4tError::Network(error)
        }
    }
}

fn peer_gone(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted | io::ErrorKind::BrokenPipe
    )
}

#[async_trait]
impl<S> Transport for TcpConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    async fn write_raw(&mut self, data: &[u8]) -> F4tResult<()> {
        let stream = self.stream_mut()?;
        let written = match stream.write_all(data).await {
            Ok(()) => stream.flush().await,
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => {
                trace!("Wrote {} bytes", data.len());
                Ok(())
            }
            Err(e) => Err(self.io_failure(e)),
        }
    }

    async fn read_chunk(&mut self, max_bytes: usize) -> F4tResult<Vec<u8>> {
        if max_bytes == 0 {
            return Err(F4tError::InvalidInput("chunk size must be non-zero".to_string()));
        }
        let timeout = self.timeout;
        let stream = self.stream_mut()?;
        let mut buffer = vec![0u8; max_bytes];

        match tokio::time::timeout(timeout, stream.read(&mut buffer)).await {
            Ok(Ok(0)) => {
                info!("Connection to {} closed by peer", self.peer);
                self.stream = None;
                Err(F4tError::ConnectionClosed)
            }
            Ok(Ok(n)) => {
                buffer.truncate(n);
                trace!("Read {} bytes: {}", n, hex::encode(&buffer));
                Ok(buffer)
            }
            Ok(Err(e)) => Err(self.io_failure(e)),
            Err(_) => Err(F4tError::Timeout {
                partial: String::new(),
            }),
        }
    }

    async fn close(&mut self) -> F4tResult<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                warn!("Failed to shutdown connection to {}: {}", self.peer, e);
            }
            info!("Connection to {} closed", self.peer);
        }
        Ok(())
    }
}

impl<S> Drop for TcpConnection<S> {
    fn drop(&mut self) {
        if self.stream.take().is_some() {
            debug!("Releasing unclosed connection to {}", self.peer);
        }
    }
}
