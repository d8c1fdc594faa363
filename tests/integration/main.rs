//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives a bridge channel
//! iteration by iteration against in-memory sockets. All tests run on the
//! host (x86_64) with no network stack required.

mod bootstrap_tests;
mod bridge_tests;
mod mock_net;
