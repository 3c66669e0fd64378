//! Murmur session core
//!
//! Everything a participant needs between the operator's keyboard and the
//! UDP socket: the Lamport clock, the peer directory, the send fan-out, and
//! the receive loop.
//!
//! # Architecture
//!
//! A session is two long-lived tasks. The [`Sender`] turns operator input
//! into one envelope per peer; the [`Receiver`] turns inbound datagrams into
//! [`Delivered`] messages. They share only the [`LogicalClock`] and read-only
//! state (directory, confidentiality scheme, transport).
//!
//! I/O goes through the [`Transport`] trait so the same session code runs on
//! a real socket, inside a turmoil simulation, or over an in-memory network
//! with injected faults.
//!
//! # Components
//!
//! - [`clock`]: Lamport logical clock
//! - [`directory`]: Peer endpoints and keys
//! - [`transport`]: Datagram transport abstraction and the UDP implementation
//! - [`sender`]: Outbound fan-out
//! - [`receiver`]: Inbound decode/open/deliver pipeline
//! - [`session`]: Wiring of the above
//! - [`error`]: Session and receive error types

pub mod clock;
pub mod directory;
pub mod error;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod transport;

pub use clock::LogicalClock;
pub use directory::{Endpoint, Peer, PeerDirectory, PeerSpec};
pub use error::{ReceiveError, SessionError};
pub use receiver::{Delivered, Receiver};
pub use sender::{SendReport, Sender};
pub use session::{Session, SessionConfig};
pub use transport::{Transport, UdpTransport};
