//! Inbound pipeline.
//!
//! Each datagram goes through decode, scheme check, open, message decode, and
//! clock merge, in that order. A failure at any step drops that datagram
//! only; the loop keeps listening.

use std::{io, net::SocketAddr, sync::Arc};

use murmur_crypto::ConfidentialityScheme;
use murmur_proto::{Envelope, EnvelopeHeader, Message};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{clock::LogicalClock, error::ReceiveError, transport::Transport};

/// A message accepted by the receive pipeline, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    /// Sender's self-declared alias
    pub alias: String,
    /// Message text
    pub text: String,
    /// Our clock after merging the sender's timestamp
    pub clock: u64,
    /// Sender's timestamp from the envelope
    pub sent_at: u64,
    /// Datagram source address
    pub from: SocketAddr,
}

/// Receive half of a session.
pub struct Receiver<T: Transport> {
    clock: Arc<LogicalClock>,
    scheme: Arc<ConfidentialityScheme>,
    transport: Arc<T>,
}

impl<T: Transport> Receiver<T> {
    /// Create a receiver sharing `clock` with the send half
    pub fn new(
        clock: Arc<LogicalClock>,
        scheme: Arc<ConfidentialityScheme>,
        transport: Arc<T>,
    ) -> Self {
        Self { clock, scheme, transport }
    }

    /// Run one datagram through the pipeline.
    ///
    /// The clock is only touched once the message is known to be valid, so
    /// garbage on the wire cannot move it.
    pub fn handle_datagram(
        &self,
        datagram: &[u8],
        from: SocketAddr,
    ) -> Result<Delivered, ReceiveError> {
        let envelope = Envelope::decode(datagram).map_err(ReceiveError::Malformed)?;

        let expected = self.scheme.kind();
        if envelope.scheme != expected {
            return Err(ReceiveError::SchemeMismatch { expected, actual: envelope.scheme });
        }

        let plaintext = self.scheme.open(&envelope.payload).map_err(ReceiveError::Confidentiality)?;
        let message = Message::from_cbor(&plaintext).map_err(ReceiveError::InvalidMessage)?;

        let clock = self.clock.update(envelope.clock);

        Ok(Delivered {
            alias: message.alias,
            text: message.text,
            clock,
            sent_at: envelope.clock,
            from,
        })
    }

    /// Receive until the display side hangs up or the transport fails.
    ///
    /// Per-datagram failures are logged at `warn` with their stage and
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns the transport error if `recv_from` fails with anything other
    /// than a transient ICMP-induced reset.
    pub async fn run(self, events: mpsc::Sender<Delivered>) -> io::Result<()> {
        let mut buf = vec![0u8; EnvelopeHeader::MAX_DATAGRAM_SIZE];

        loop {
            let (len, from) = match self.transport.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) if is_transient(&e) => {
                    debug!(error = %e, "ignoring transient receive error");
                    continue;
                },
                Err(e) => return Err(e),
            };

            match self.handle_datagram(&buf[..len], from) {
                Ok(delivered) => {
                    debug!(
                        %from,
                        clock = delivered.clock,
                        sent_at = delivered.sent_at,
                        "message delivered"
                    );
                    if events.send(delivered).await.is_err() {
                        debug!("display closed, receiver stopping");
                        return Ok(());
                    }
                },
                Err(e) => {
                    warn!(%from, stage = e.stage(), error = %e, "dropping datagram");
                },
            }
        }
    }
}

/// UDP sockets surface ICMP port-unreachable from an earlier send as an
/// error on a later receive on some platforms.
fn is_transient(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset)
}
