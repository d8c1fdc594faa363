//! ESP-IDF platform helpers for the TCP adapter.
//!
//! This module is compiled only for `target_os = "espidf"` and talks to
//! lwIP directly so the listen backlog and per-call `MSG_DONTWAIT` flags
//! are under our control.
//!
//! All public items are `pub(super)` to keep them private to the adapter.

use log::warn;

use esp_idf_svc::sys::{
    AF_INET, EAGAIN, EWOULDBLOCK, F_SETFL, IPPROTO_TCP, MSG_DONTWAIT, O_NONBLOCK, SOCK_STREAM,
    in_addr, lwip_accept, lwip_bind, lwip_close, lwip_fcntl, lwip_htons, lwip_listen, lwip_recv,
    lwip_send, lwip_socket, sockaddr_in,
};

use crate::error::{LinkError, NetError};

/// Owned lwIP socket descriptor, closed on drop.
pub(super) struct Socket(core::ffi::c_int);

impl Drop for Socket {
    fn drop(&mut self) {
        // SAFETY: the descriptor was returned by lwip_socket/lwip_accept and
        // is closed exactly once here.
        unsafe {
            lwip_close(self.0);
        }
    }
}

fn errno() -> i32 {
    // SAFETY: __errno() returns the pointer to the current task errno,
    // which is valid to read in any task context.
    unsafe { *esp_idf_svc::sys::__errno() }
}

fn would_block(err: i32) -> bool {
    err == EAGAIN as i32 || err == EWOULDBLOCK as i32
}

/// Create, bind and listen on `0.0.0.0:<port>`, non-blocking.
pub(super) fn listen(port: u16, backlog: u8) -> Result<Socket, NetError> {
    // SAFETY: lwIP socket call with valid domain/type/protocol.
    let fd = unsafe { lwip_socket(AF_INET as _, SOCK_STREAM as _, IPPROTO_TCP as _) };
    if fd < 0 {
        warn!("TCP(espidf): lwip_socket failed (errno {})", errno());
        return Err(NetError::SocketCreate);
    }
    // From here on the descriptor is closed by Drop on every error path.
    let sock = Socket(fd);

    let addr = sockaddr_in {
        sin_len: 0,
        sin_family: AF_INET as _,
        // SAFETY: lwip_htons takes a u16 and returns the network-byte-order value.
        sin_port: unsafe { lwip_htons(port) },
        sin_addr: in_addr { s_addr: 0 }, // INADDR_ANY = 0
        sin_zero: [0; 8],
    };

    // SAFETY: `addr` is valid for the bind() call; errors are checked.
    let rc = unsafe {
        lwip_bind(
            sock.0,
            core::ptr::addr_of!(addr).cast(),
            core::mem::size_of::<sockaddr_in>() as _,
        )
    };
    if rc < 0 {
        warn!("TCP(espidf): bind port {} failed (errno {})", port, errno());
        return Err(NetError::Bind);
    }

    // SAFETY: sock is a bound stream socket.
    let rc = unsafe { lwip_listen(sock.0, backlog as _) };
    if rc < 0 {
        warn!("TCP(espidf): listen port {} failed (errno {})", port, errno());
        return Err(NetError::Listen);
    }

    // SAFETY: F_SETFL + O_NONBLOCK is a valid fcntl for sockets.
    let rc = unsafe { lwip_fcntl(sock.0, F_SETFL as _, O_NONBLOCK as _) };
    if rc < 0 {
        warn!("TCP(espidf): O_NONBLOCK failed (errno {})", errno());
        return Err(NetError::NonBlocking);
    }

    Ok(sock)
}

/// Non-blocking accept. `None` when no client is waiting.
pub(super) fn accept(listener: &Socket) -> Option<Socket> {
    // SAFETY: listener fd is valid and non-blocking; the peer address
    // is not needed.
    let fd = unsafe { lwip_accept(listener.0, core::ptr::null_mut(), core::ptr::null_mut()) };
    if fd < 0 {
        let err = errno();
        if !would_block(err) {
            warn!("TCP(espidf): accept failed (errno {})", err);
        }
        return None;
    }
    Some(Socket(fd))
}

pub(super) fn recv(sock: &Socket, buf: &mut [u8]) -> Result<usize, LinkError> {
    // SAFETY: `buf` is valid for `buf.len()` writable bytes.
    let n = unsafe {
        lwip_recv(
            sock.0,
            buf.as_mut_ptr().cast(),
            buf.len(),
            MSG_DONTWAIT as _,
        )
    };
    match n {
        n if n > 0 => Ok(n as usize),
        0 => Err(LinkError::Closed),
        _ if would_block(errno()) => Err(LinkError::WouldBlock),
        _ => Err(LinkError::Io),
    }
}

pub(super) fn send(sock: &Socket, data: &[u8]) -> Result<usize, LinkError> {
    // SAFETY: `data` is valid for `data.len()` readable bytes.
    let n = unsafe { lwip_send(sock.0, data.as_ptr().cast(), data.len(), MSG_DONTWAIT as _) };
    if n >= 0 {
        return Ok(n as usize);
    }
    if would_block(errno()) {
        Err(LinkError::WouldBlock)
    } else {
        Err(LinkError::Io)
    }
}
