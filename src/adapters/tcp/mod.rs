//! Non-blocking TCP adapter.
//!
//! Implements the [`Listener`] and [`Connection`] ports for the bridge.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: raw lwIP sockets, `listen()` with the
//!   configured backlog, `O_NONBLOCK` on the listener, `MSG_DONTWAIT`
//!   on every receive and send.
//! - **all other targets**: `std::net::TcpListener` / `TcpStream` in
//!   non-blocking mode for host-side testing. The backlog is the OS
//!   default there.
//!
//! ## Connection model
//!
//! 1. [`TcpBridgeListener::bind`] creates, binds and listens on
//!    `0.0.0.0:<port>`. Any failure is fatal for the owning channel.
//! 2. `try_accept()` returns immediately with `None` when nobody is waiting.
//! 3. Reads and writes never block; `EAGAIN` surfaces as
//!    [`LinkError::WouldBlock`].
//! 4. Dropping a [`TcpClient`] closes its socket.

use log::{info, warn};

use crate::app::ports::{Connection, Listener};
use crate::error::{LinkError, NetError};

#[cfg(not(target_os = "espidf"))]
use std::io::{Read, Write};

#[cfg(target_os = "espidf")]
mod esp_impl;

// ───────────────────────────────────────────────────────────────
// Listener
// ───────────────────────────────────────────────────────────────

/// Listening socket of one bridge channel.
pub struct TcpBridgeListener {
    port: u16,

    #[cfg(target_os = "espidf")]
    fd: esp_impl::Socket,

    #[cfg(not(target_os = "espidf"))]
    listener: std::net::TcpListener,
}

impl TcpBridgeListener {
    /// Bind to all interfaces on `port` and listen, non-blocking.
    #[cfg(target_os = "espidf")]
    pub fn bind(port: u16, backlog: u8) -> Result<Self, NetError> {
        let fd = esp_impl::listen(port, backlog)?;
        info!("TCP: listening on port {} (backlog {})", port, backlog);
        Ok(Self { port, fd })
    }

    /// Bind to all interfaces on `port` and listen, non-blocking.
    ///
    /// Pass port `0` to let the OS pick a free port; [`port()`](Listener::port)
    /// reports the one actually bound.
    #[cfg(not(target_os = "espidf"))]
    pub fn bind(port: u16, backlog: u8) -> Result<Self, NetError> {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        let listener = std::net::TcpListener::bind(addr).map_err(|e| {
            warn!("TCP(sim): bind {} failed: {}", port, e);
            NetError::Bind
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|_| NetError::NonBlocking)?;
        let port = listener.local_addr().map_or(port, |a| a.port());

        info!("TCP(sim): listening on port {} (backlog {} ignored)", port, backlog);
        Ok(Self { port, listener })
    }

    #[cfg(target_os = "espidf")]
    fn platform_accept(&mut self) -> Option<TcpClient> {
        esp_impl::accept(&self.fd).map(|fd| TcpClient { fd })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_accept(&mut self) -> Option<TcpClient> {
        match self.listener.accept() {
            Ok((stream, addr)) => {
                if stream.set_nonblocking(true).is_err() {
                    warn!("TCP(sim): failed to set non-blocking on client socket");
                    return None;
                }
                info!("TCP(sim): port {} connection from {}", self.port, addr);
                Some(TcpClient { stream })
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("TCP(sim): accept error: {}", e);
                None
            }
        }
    }
}

impl Listener for TcpBridgeListener {
    type Conn = TcpClient;

    fn try_accept(&mut self) -> Option<TcpClient> {
        self.platform_accept()
    }

    fn port(&self) -> u16 {
        self.port
    }
}

// ───────────────────────────────────────────────────────────────
// Client connection
// ───────────────────────────────────────────────────────────────

/// One accepted client socket.
pub struct TcpClient {
    #[cfg(target_os = "espidf")]
    fd: esp_impl::Socket,

    #[cfg(not(target_os = "espidf"))]
    stream: std::net::TcpStream,
}

impl TcpClient {
    #[cfg(target_os = "espidf")]
    fn platform_recv(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        esp_impl::recv(&self.fd, buf)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_recv(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        match self.stream.read(buf) {
            Ok(0) => Err(LinkError::Closed),
            Ok(n) => Ok(n),
            Err(e) => Err(map_io_error(&e)),
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_send(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        esp_impl::send(&self.fd, data)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_send(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        self.stream.write(data).map_err(|e| map_io_error(&e))
    }
}

#[cfg(not(target_os = "espidf"))]
fn map_io_error(e: &std::io::Error) -> LinkError {
    use std::io::ErrorKind;
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::Interrupted => LinkError::WouldBlock,
        ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::NotConnected => LinkError::Closed,
        _ => LinkError::Io,
    }
}

impl Connection for TcpClient {
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        self.platform_recv(buf)
    }

    fn try_send(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        self.platform_send(data)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests (host / simulation path only)
// ───────────────────────────────────────────────────────────────
