//! TCP ↔ queue bridge.
//!
//! Each bridged channel owns one listening port and one [`QueuePair`]:
//! records in the outbound queue are broadcast to every connected client,
//! bytes received from any client land in the inbound queue. A
//! [`BridgeChannel`] is driven by its own task (see [`supervisor`]).
//!
//! [`QueuePair`]: crate::queue::QueuePair
//! [`BridgeChannel`]: channel::BridgeChannel

pub mod block;
pub mod bootstrap;
pub mod channel;
pub mod mode;
pub mod registry;
pub mod supervisor;

pub use channel::BridgeChannel;
pub use mode::ModeFlag;
