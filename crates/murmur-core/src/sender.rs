//! Outbound fan-out.
//!
//! One operator message becomes one clock tick and one envelope per peer.
//! Every peer is attempted; a peer that cannot be reached is logged and
//! skipped. There is no retry and no acknowledgement.

use std::sync::Arc;

use murmur_crypto::ConfidentialityScheme;
use murmur_proto::{Envelope, Message};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    clock::LogicalClock,
    directory::{Endpoint, PeerDirectory},
    error::SessionError,
    transport::Transport,
};

/// Outcome of one fan-out.
#[derive(Debug)]
pub struct SendReport {
    /// Lamport timestamp carried by every envelope of this send
    pub clock: u64,
    /// Peers whose datagram was handed to the network
    pub delivered: Vec<Endpoint>,
    /// Peers whose transmission failed, each a [`SessionError::Transmission`]
    pub failed: Vec<SessionError>,
}

impl SendReport {
    /// True if no peer failed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Send half of a session.
pub struct Sender<T: Transport> {
    alias: String,
    clock: Arc<LogicalClock>,
    directory: Arc<PeerDirectory>,
    scheme: Arc<ConfidentialityScheme>,
    transport: Arc<T>,
    rng: ChaCha20Rng,
}

impl<T: Transport> Sender<T> {
    /// Create a sender seeded from OS entropy.
    pub fn new(
        alias: impl Into<String>,
        clock: Arc<LogicalClock>,
        directory: Arc<PeerDirectory>,
        scheme: Arc<ConfidentialityScheme>,
        transport: Arc<T>,
    ) -> Self {
        Self::with_rng(alias, clock, directory, scheme, transport, ChaCha20Rng::from_entropy())
    }

    /// Create a sender with a caller-supplied RNG, for deterministic tests.
    pub fn with_rng(
        alias: impl Into<String>,
        clock: Arc<LogicalClock>,
        directory: Arc<PeerDirectory>,
        scheme: Arc<ConfidentialityScheme>,
        transport: Arc<T>,
        rng: ChaCha20Rng,
    ) -> Self {
        Self { alias: alias.into(), clock, directory, scheme, transport, rng }
    }

    /// Our alias, stamped on every message
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Send `text` to every peer.
    ///
    /// Ticks the clock once, seals one payload per peer, then transmits. All
    /// sealing happens before the first transmission, so a message that is
    /// too large for any peer is sent to nobody.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Crypto`] with `PayloadTooLarge` if the message does
    ///   not fit the scheme
    /// - [`SessionError::Protocol`] if encoding fails
    ///
    /// Per-peer transmission failures are not errors; they are listed in
    /// [`SendReport::failed`].
    pub async fn send(&mut self, text: &str) -> Result<SendReport, SessionError> {
        let clock = self.clock.increment();
        let plaintext = Message::new(self.alias.clone(), text).to_cbor()?;

        let mut outbound = Vec::with_capacity(self.directory.len());
        for peer in self.directory.iter() {
            let payload = self.scheme.seal(&mut self.rng, &plaintext, peer.public_key())?;
            let datagram = Envelope::new(self.scheme.kind(), clock, payload).to_bytes()?;
            outbound.push((peer, datagram));
        }

        let mut report = SendReport { clock, delivered: Vec::new(), failed: Vec::new() };
        for (peer, datagram) in outbound {
            let endpoint = peer.endpoint();
            match self.transport.send_to(&datagram, endpoint).await {
                Ok(()) => {
                    debug!(
                        peer = peer.alias(),
                        %endpoint,
                        clock,
                        bytes = datagram.len(),
                        "envelope sent"
                    );
                    report.delivered.push(endpoint.clone());
                },
                Err(e) => {
                    warn!(peer = peer.alias(), %endpoint, clock, error = %e, "transmission failed");
                    report.failed.push(SessionError::Transmission {
                        endpoint: endpoint.clone(),
                        reason: e.to_string(),
                    });
                },
            }
        }

        Ok(report)
    }

    /// Send every line received on `input` until the channel closes.
    ///
    /// A failed send is logged and the loop moves on to the next line.
    pub async fn run(mut self, mut input: mpsc::Receiver<String>) {
        while let Some(text) = input.recv().await {
            if let Err(e) = self.send(&text).await {
                warn!(error = %e, "send failed");
            }
        }
        debug!(alias = %self.alias, "input closed, sender stopping");
    }
}
