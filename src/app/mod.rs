//! Application core: port traits, events and instrument state, zero I/O.
//!
//! The bridge engine in [`crate::bridge`] only talks to sockets, queues,
//! the router and the state source through the **port traits** defined in
//! [`ports`], keeping it fully testable without a network stack.

pub mod events;
pub mod ports;
pub mod state;
