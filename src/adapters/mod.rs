//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements           | Connects to                 |
//! |-------------|----------------------|-----------------------------|
//! | `log_sink`  | EventSink            | Serial log output           |
//! | `snapshot`  | StateSource          | In-memory instrument state  |
//! | `tcp`       | Listener, Connection | lwIP / std::net TCP sockets |

pub mod log_sink;
pub mod snapshot;
pub mod tcp;
