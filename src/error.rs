//! Unified error types for the Skylink bridge.
//!
//! A single `Error` enum that every subsystem converts into, so the task
//! entry points handle failures uniformly. All variants are `Copy` so they
//! can be logged and passed between tasks without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible setup operation in the bridge funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Listener socket setup failed.
    Net(NetError),
    /// A bounded queue rejected a record.
    Queue(QueueError),
    /// Configuration is invalid.
    Config(&'static str),
    /// A bridge task could not be created.
    Spawn,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Net(e) => write!(f, "net: {e}"),
            Self::Queue(e) => write!(f, "queue: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn => write!(f, "task spawn failed"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Listener setup errors
// ---------------------------------------------------------------------------

/// Fatal listener setup failures. None of these are retried: a port that
/// cannot be bound now will not become bindable by looping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    /// `socket()` returned an error.
    SocketCreate,
    /// `bind()` failed (port in use, no such interface).
    Bind,
    /// `listen()` failed.
    Listen,
    /// The socket could not be switched to non-blocking mode.
    NonBlocking,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SocketCreate => write!(f, "socket creation failed"),
            Self::Bind => write!(f, "bind failed"),
            Self::Listen => write!(f, "listen failed"),
            Self::NonBlocking => write!(f, "O_NONBLOCK setup failed"),
        }
    }
}

impl From<NetError> for Error {
    fn from(e: NetError) -> Self {
        Self::Net(e)
    }
}

// ---------------------------------------------------------------------------
// Queue errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Every record slot is occupied.
    Full,
    /// The record is longer than a queue slot can hold.
    RecordTooLarge,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "queue full"),
            Self::RecordTooLarge => write!(f, "record too large"),
        }
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Self::Queue(e)
    }
}

// ---------------------------------------------------------------------------
// Per-connection I/O outcomes
// ---------------------------------------------------------------------------

/// Result of a non-blocking socket operation that did not transfer data.
///
/// `WouldBlock` is the normal "nothing to do" answer for accept and receive.
/// For send it counts as a failed attempt: a peer whose window stays closed
/// is indistinguishable from a dead one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    WouldBlock,
    /// Peer closed the connection (EOF or reset).
    Closed,
    /// Any other socket error.
    Io,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WouldBlock => write!(f, "would block"),
            Self::Closed => write!(f, "connection closed"),
            Self::Io => write!(f, "socket I/O error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
