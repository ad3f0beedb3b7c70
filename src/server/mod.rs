//! TCP line server multiplexing clients onto the shared command-log
//! device.
//!
//! Each accepted connection gets its own worker task and its own device
//! handle. Received bytes are written through the device's framer; a
//! terminator in a received chunk triggers echoing the entire current log
//! back to that client. A seek directive repositions the worker's handle
//! and echoes from the new cursor instead (see [`parse_seek_directive`]).

mod directive;

use std::{io, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use snafu::{ResultExt, Snafu};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpSocket, TcpStream},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use self::directive::{SEEK_DIRECTIVE_PREFIX, parse_seek_directive};
use crate::device::{ControlCommand, Device, DeviceError};

/// Error from server startup or shutdown.
#[derive(Debug, Snafu)]
pub enum ServerError {
    /// Creating or configuring the listening socket failed.
    #[snafu(display("failed to prepare listening socket: {source}"))]
    Socket {
        /// Underlying socket error.
        source: io::Error,
    },

    /// Binding the configured address failed.
    #[snafu(display("failed to bind {address}: {source}"))]
    Bind {
        /// Address the server tried to bind.
        address: SocketAddr,
        /// Underlying bind error.
        source: io::Error,
    },

    /// Putting the bound socket into listening mode failed.
    #[snafu(display("failed to listen on {address}: {source}"))]
    Listen {
        /// Address the server bound.
        address: SocketAddr,
        /// Underlying listen error.
        source: io::Error,
    },
}

/// Error that ends a single client connection.
#[derive(Debug, Snafu)]
enum ConnectionError {
    #[snafu(display("receive failed: {source}"))]
    Recv { source: io::Error },

    #[snafu(display("send failed: {source}"))]
    Send { source: io::Error },

    #[snafu(display("device write failed: {source}"))]
    DeviceWrite { source: DeviceError },
}

/// The TCP server. Bind first, then [`run`](Server::run) until the
/// cancellation token fires.
#[derive(Debug)]
pub struct Server {
    device: Arc<Device>,
    listener: TcpListener,
    recv_buffer_size: usize,
}

impl Server {
    /// Binds `address` with address reuse and the given backlog. Must be
    /// called within a tokio runtime.
    pub fn bind(
        device: Arc<Device>,
        address: SocketAddr,
        backlog: u32,
        recv_buffer_size: usize,
    ) -> Result<Self, ServerError> {
        let socket = match address {
            SocketAddr::V4(_) => TcpSocket::new_v4().context(SocketSnafu)?,
            SocketAddr::V6(_) => TcpSocket::new_v6().context(SocketSnafu)?,
        };
        socket.set_reuseaddr(true).context(SocketSnafu)?;
        socket.bind(address).context(BindSnafu { address })?;
        let listener = socket.listen(backlog).context(ListenSnafu { address })?;
        Ok(Self {
            device,
            listener,
            recv_buffer_size,
        })
    }

    /// The address the listener actually bound (useful when binding port
    /// 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until `shutdown` fires, then closes the
    /// listener and joins every remaining worker.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), ServerError> {
        let address = self.local_addr().context(SocketSnafu)?;
        info!(message = "Listening.", %address);

        let mut workers = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let connection = Connection {
                            stream,
                            peer,
                            device: Arc::clone(&self.device),
                            recv_buffer_size: self.recv_buffer_size,
                        };
                        workers.spawn(connection.run());
                    }
                    Err(error) => {
                        error!(message = "Failed to accept connection.", %error);
                    }
                },
                // Reap finished workers as they exit so the set only holds
                // live connections.
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    if let Err(error) = joined {
                        error!(message = "Connection worker panicked.", %error);
                    }
                }
            }
        }

        drop(self.listener);
        info!(
            message = "Shutting down, waiting for open connections.",
            workers = workers.len()
        );
        while let Some(joined) = workers.join_next().await {
            if let Err(error) = joined {
                error!(message = "Connection worker panicked.", %error);
            }
        }
        Ok(())
    }
}

struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    device: Arc<Device>,
    recv_buffer_size: usize,
}

impl Connection {
    async fn run(mut self) {
        info!(message = "Accepted connection.", peer = %self.peer);
        match self.serve().await {
            Ok(()) => info!(message = "Closed connection.", peer = %self.peer),
            Err(error) => {
                warn!(message = "Closed connection on error.", peer = %self.peer, %error)
            }
        }
    }

    async fn serve(&mut self) -> Result<(), ConnectionError> {
        let mut handle = self.device.open();
        let mut buf = vec![0u8; self.recv_buffer_size];
        loop {
            let received = self.stream.read(&mut buf).await.context(RecvSnafu)?;
            if received == 0 {
                return Ok(());
            }
            let chunk = &buf[..received];
            debug!(message = "Received bytes.", peer = %self.peer, bytes = received);

            if let Some(seek_to) = parse_seek_directive(chunk) {
                // The directive is consumed, not stored.
                match handle.control(ControlCommand::SeekToCommand(seek_to)) {
                    Ok(cursor) => {
                        debug!(message = "Repositioned cursor.", peer = %self.peer, cursor);
                        let reply = handle.drain();
                        self.send(&reply).await?;
                    }
                    Err(error) => {
                        warn!(message = "Rejected seek directive.", peer = %self.peer, %error);
                    }
                }
            } else {
                handle.write(chunk).context(DeviceWriteSnafu)?;
                if chunk.contains(&b'\n') {
                    // A completed command echoes the whole log, oldest to
                    // newest, from a fresh cursor at zero.
                    let reply = self.device.contents_from(0);
                    self.send(&reply).await?;
                }
            }
        }
    }

    async fn send(&mut self, chunks: &[Bytes]) -> Result<(), ConnectionError> {
        for chunk in chunks {
            self.stream.write_all(chunk).await.context(SendSnafu)?;
        }
        self.stream.flush().await.context(SendSnafu)
    }
}
