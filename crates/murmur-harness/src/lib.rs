//! Test transports for Murmur multi-peer scenarios.
//!
//! Two implementations of [`murmur_core::Transport`]:
//!
//! - [`SimTransport`]: turmoil's simulated UDP, for deterministic multi-host
//!   runs with virtual time, latency, and partitions
//! - [`MemoryNetwork`] / [`MemoryTransport`]: an in-process network with
//!   per-host fault injection (unreachable hosts, corrupted datagrams, raw
//!   injection), for tests that need to observe send failures directly

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;
mod sim_transport;

pub use memory::{MemoryNetwork, MemoryTransport};
pub use sim_transport::SimTransport;
