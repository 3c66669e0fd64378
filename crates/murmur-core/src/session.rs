//! Session wiring.
//!
//! Builds the shared state once and hands out the two halves. The halves
//! share the clock, the directory, the scheme, and the transport; nothing
//! else.

use std::{io, net::SocketAddr, sync::Arc};

use murmur_crypto::ConfidentialityScheme;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::info;

use crate::{
    clock::LogicalClock,
    directory::{PeerDirectory, PeerSpec},
    error::SessionError,
    receiver::{Delivered, Receiver},
    sender::Sender,
    transport::Transport,
};

/// Everything needed to start a session, as plain data.
#[derive(Debug)]
pub struct SessionConfig {
    /// Our display name
    pub alias: String,
    /// Confidentiality scheme, identical across all participants
    pub scheme: ConfidentialityScheme,
    /// Peers to send to
    pub peers: Vec<PeerSpec>,
    /// Seed for seal randomness; `None` draws from OS entropy
    pub rng_seed: Option<u64>,
}

impl SessionConfig {
    /// Config with OS-seeded randomness
    pub fn new(
        alias: impl Into<String>,
        scheme: ConfidentialityScheme,
        peers: Vec<PeerSpec>,
    ) -> Self {
        Self { alias: alias.into(), scheme, peers, rng_seed: None }
    }

    /// Use a fixed seed, for deterministic tests
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

/// A configured session, not yet running.
pub struct Session<T: Transport> {
    alias: String,
    clock: Arc<LogicalClock>,
    directory: Arc<PeerDirectory>,
    scheme: Arc<ConfidentialityScheme>,
    transport: Arc<T>,
    rng: ChaCha20Rng,
}

impl<T: Transport> Session<T> {
    /// Validate `config` and build the shared state.
    ///
    /// # Errors
    ///
    /// Any [`PeerDirectory::new`] error.
    pub fn new(transport: T, config: SessionConfig) -> Result<Self, SessionError> {
        let directory = PeerDirectory::new(config.scheme.kind(), config.peers)?;
        let rng = match config.rng_seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };

        info!(
            alias = %config.alias,
            scheme = %config.scheme.kind(),
            peers = directory.len(),
            local_addr = ?transport.local_addr().ok(),
            "session configured"
        );

        Ok(Self {
            alias: config.alias,
            clock: Arc::new(LogicalClock::new()),
            directory: Arc::new(directory),
            scheme: Arc::new(config.scheme),
            transport: Arc::new(transport),
            rng,
        })
    }

    /// Our display name
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Shared clock handle
    pub fn clock(&self) -> Arc<LogicalClock> {
        Arc::clone(&self.clock)
    }

    /// Shared directory handle
    pub fn directory(&self) -> Arc<PeerDirectory> {
        Arc::clone(&self.directory)
    }

    /// Shared scheme handle
    pub fn scheme(&self) -> Arc<ConfidentialityScheme> {
        Arc::clone(&self.scheme)
    }

    /// Address the transport is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Split into send and receive halves.
    pub fn split(self) -> (Sender<T>, Receiver<T>) {
        let receiver = Receiver::new(
            Arc::clone(&self.clock),
            Arc::clone(&self.scheme),
            Arc::clone(&self.transport),
        );
        let sender = Sender::with_rng(
            self.alias,
            self.clock,
            self.directory,
            self.scheme,
            self.transport,
            self.rng,
        );
        (sender, receiver)
    }

    /// Start the receive loop as a task and return the send half.
    ///
    /// Accepted messages are pushed to `events`. The task ends when `events`
    /// is closed or the transport fails.
    pub fn spawn(self, events: mpsc::Sender<Delivered>) -> (Sender<T>, JoinHandle<io::Result<()>>) {
        let (sender, receiver) = self.split();
        let handle = tokio::spawn(receiver.run(events));
        (sender, handle)
    }
}

#[cfg(test)]
mod tests {
    use murmur_proto::SchemeKind;

    use super::*;
    use crate::transport::UdpTransport;

    fn symmetric() -> ConfidentialityScheme {
        ConfidentialityScheme::from_passphrase("Sh4red.Secret").unwrap()
    }

    #[tokio::test]
    async fn rejects_invalid_directory() {
        let transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let peers = vec![
            PeerSpec::parse("b=127.0.0.1:1").unwrap(),
            PeerSpec::parse("b=127.0.0.1:2").unwrap(),
        ];

        let result = Session::new(transport, SessionConfig::new("a", symmetric(), peers));
        assert!(matches!(result, Err(SessionError::DuplicatePeer(_))));
    }

    #[tokio::test]
    async fn halves_share_one_clock() {
        let transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let config = SessionConfig::new("a", symmetric(), Vec::new()).with_rng_seed(1);
        let session = Session::new(transport, config).unwrap();
        assert_eq!(session.scheme().kind(), SchemeKind::SymmetricShared);

        let clock = session.clock();
        let (mut sender, _receiver) = session.split();

        sender.send("tick").await.unwrap();
        sender.send("tock").await.unwrap();
        assert_eq!(clock.current(), 2);
    }

    #[tokio::test]
    async fn two_sessions_over_loopback() {
        let alice_transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let bob_transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let bob_port = bob_transport.local_addr().unwrap().port();

        let alice_peers = vec![PeerSpec::parse(&format!("bob=127.0.0.1:{bob_port}")).unwrap()];
        let alice_config = SessionConfig::new("alice", symmetric(), alice_peers);
        let alice = Session::new(alice_transport, alice_config).unwrap();
        let bob_config = SessionConfig::new("bob", symmetric(), Vec::new());
        let bob = Session::new(bob_transport, bob_config).unwrap();

        let (events, mut inbox) = mpsc::channel(4);
        let (_bob_sender, bob_task) = bob.spawn(events);
        let (mut alice_sender, _alice_receiver) = alice.split();

        let report = alice_sender.send("hello bob").await.unwrap();
        assert_eq!(report.delivered.len(), 1);

        let delivered = inbox.recv().await.unwrap();
        assert_eq!(delivered.alias, "alice");
        assert_eq!(delivered.text, "hello bob");
        assert_eq!(delivered.clock, 2);

        drop(inbox);
        bob_task.abort();
    }
}
