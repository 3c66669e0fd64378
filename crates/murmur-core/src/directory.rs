//! Peer directory.
//!
//! Built once at session start from operator input and read-only afterwards.
//! Validation happens here so the send path never discovers a bad key or a
//! duplicate alias mid-conversation.

use std::{collections::HashSet, fmt, str::FromStr};

use murmur_crypto::PeerPublicKey;
use murmur_proto::SchemeKind;
use tracing::debug;

use crate::error::SessionError;

/// Network location of a peer.
///
/// Host is kept as text and resolved by the transport at send time, so both
/// IP literals and names (including simulated host names) work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint without validation
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// Host name or IP literal (IPv6 without brackets)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// UDP port
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = SessionError;

    /// Parse `host:port` or `[v6-address]:port`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| SessionError::InvalidEndpoint { input: input.to_string(), reason };

        let (host, port) = if let Some(rest) = input.strip_prefix('[') {
            let (host, port) =
                rest.split_once("]:").ok_or_else(|| invalid("expected [address]:port"))?;
            (host, port)
        } else {
            let (host, port) = input.rsplit_once(':').ok_or_else(|| invalid("expected host:port"))?;
            if host.contains(':') {
                return Err(invalid("IPv6 addresses must be written as [address]:port"));
            }
            (host, port)
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }

        let port: u16 = port.parse().map_err(|_| invalid("port must be a number from 1 to 65535"))?;
        if port == 0 {
            return Err(invalid("port must be a number from 1 to 65535"));
        }

        Ok(Self::new(host, port))
    }
}

/// Operator-supplied description of one peer, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSpec {
    /// Display name, unique within the directory
    pub alias: String,
    /// Where to send
    pub endpoint: Endpoint,
    /// PEM public key, required by the per-recipient scheme
    pub public_key_pem: Option<String>,
}

impl PeerSpec {
    /// Peer without key material
    pub fn new(alias: impl Into<String>, endpoint: Endpoint) -> Self {
        Self { alias: alias.into(), endpoint, public_key_pem: None }
    }

    /// Attach a PEM public key
    #[must_use]
    pub fn with_public_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.public_key_pem = Some(pem.into());
        self
    }

    /// Parse `alias=host:port`.
    pub fn parse(input: &str) -> Result<Self, SessionError> {
        let (alias, endpoint) = input.split_once('=').ok_or_else(|| SessionError::InvalidEndpoint {
            input: input.to_string(),
            reason: "expected alias=host:port",
        })?;

        let alias = alias.trim();
        if alias.is_empty() {
            return Err(SessionError::InvalidEndpoint {
                input: input.to_string(),
                reason: "empty alias",
            });
        }

        Ok(Self::new(alias, endpoint.trim().parse()?))
    }
}

/// A validated peer.
#[derive(Debug, Clone)]
pub struct Peer {
    alias: String,
    endpoint: Endpoint,
    public_key: Option<PeerPublicKey>,
}

impl Peer {
    /// Display name
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Where to send
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Parsed public key; always present under the per-recipient scheme
    pub fn public_key(&self) -> Option<&PeerPublicKey> {
        self.public_key.as_ref()
    }
}

/// The fixed set of peers a session sends to, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct PeerDirectory {
    peers: Vec<Peer>,
}

impl PeerDirectory {
    /// Validate peer specs for `scheme` and build the directory.
    ///
    /// # Errors
    ///
    /// - [`SessionError::DuplicatePeer`] if two specs share an alias
    /// - [`SessionError::InvalidKeyMaterial`] if the per-recipient scheme is
    ///   selected and a peer's key is missing or does not parse
    pub fn new(scheme: SchemeKind, specs: Vec<PeerSpec>) -> Result<Self, SessionError> {
        let mut seen = HashSet::new();
        let mut peers = Vec::with_capacity(specs.len());

        for spec in specs {
            if !seen.insert(spec.alias.clone()) {
                return Err(SessionError::DuplicatePeer(spec.alias));
            }

            let public_key = match (scheme.is_per_peer(), spec.public_key_pem) {
                (true, Some(pem)) => Some(PeerPublicKey::from_pem(&pem).map_err(|e| {
                    SessionError::InvalidKeyMaterial {
                        peer: spec.alias.clone(),
                        reason: e.to_string(),
                    }
                })?),
                (true, None) => {
                    return Err(SessionError::InvalidKeyMaterial {
                        peer: spec.alias,
                        reason: "no public key configured".to_string(),
                    });
                },
                (false, Some(_)) => {
                    debug!(
                        peer = %spec.alias,
                        scheme = %scheme,
                        "ignoring public key for non per-peer scheme"
                    );
                    None
                },
                (false, None) => None,
            };

            peers.push(Peer { alias: spec.alias, endpoint: spec.endpoint, public_key });
        }

        Ok(Self { peers })
    }

    /// Peers in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.iter()
    }

    /// Number of peers
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// True if there is nobody to send to
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Look up a peer by alias
    pub fn get(&self, alias: &str) -> Option<&Peer> {
        self.peers.iter().find(|peer| peer.alias == alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(input: &str) -> Result<Endpoint, SessionError> {
        input.parse()
    }

    #[test]
    fn parses_host_and_port() {
        let ep = endpoint("10.0.0.2:12345").unwrap();
        assert_eq!(ep.host(), "10.0.0.2");
        assert_eq!(ep.port(), 12345);

        let ep = endpoint("bob.local:9000").unwrap();
        assert_eq!(ep.host(), "bob.local");
    }

    #[test]
    fn parses_bracketed_ipv6() {
        let ep = endpoint("[::1]:9000").unwrap();
        assert_eq!(ep.host(), "::1");
        assert_eq!(ep.port(), 9000);
        assert_eq!(ep.to_string(), "[::1]:9000");
    }

    #[test]
    fn rejects_bad_endpoints() {
        for input in ["nohost", ":9000", "host:", "host:0", "host:70000", "::1:9000", "[::1]9000"] {
            assert!(
                matches!(endpoint(input), Err(SessionError::InvalidEndpoint { .. })),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn parses_peer_spec() {
        let spec = PeerSpec::parse("b=10.0.0.2:12345").unwrap();
        assert_eq!(spec.alias, "b");
        assert_eq!(spec.endpoint, Endpoint::new("10.0.0.2", 12345));
        assert_eq!(spec.public_key_pem, None);

        assert!(PeerSpec::parse("10.0.0.2:12345").is_err());
        assert!(PeerSpec::parse("=10.0.0.2:12345").is_err());
    }

    #[test]
    fn keeps_configuration_order() {
        let specs = vec![
            PeerSpec::parse("c=10.0.0.3:1").unwrap(),
            PeerSpec::parse("a=10.0.0.1:1").unwrap(),
            PeerSpec::parse("b=10.0.0.2:1").unwrap(),
        ];
        let directory = PeerDirectory::new(SchemeKind::Plaintext, specs).unwrap();

        let aliases: Vec<_> = directory.iter().map(Peer::alias).collect();
        assert_eq!(aliases, ["c", "a", "b"]);
        assert_eq!(directory.len(), 3);
        assert_eq!(directory.get("a").unwrap().endpoint().host(), "10.0.0.1");
        assert!(directory.get("z").is_none());
    }

    #[test]
    fn rejects_duplicate_alias() {
        let specs = vec![
            PeerSpec::parse("b=10.0.0.2:1").unwrap(),
            PeerSpec::parse("b=10.0.0.3:1").unwrap(),
        ];

        let result = PeerDirectory::new(SchemeKind::SymmetricShared, specs);
        assert!(matches!(result, Err(SessionError::DuplicatePeer(alias)) if alias == "b"));
    }

    #[test]
    fn per_peer_scheme_requires_keys() {
        let specs = vec![PeerSpec::parse("b=10.0.0.2:1").unwrap()];

        let result = PeerDirectory::new(SchemeKind::AsymmetricPerPeer, specs);
        assert!(
            matches!(result, Err(SessionError::InvalidKeyMaterial { peer, .. }) if peer == "b")
        );
    }

    #[test]
    fn per_peer_scheme_rejects_unparseable_key() {
        let specs = vec![PeerSpec::parse("c=10.0.0.3:1").unwrap().with_public_key_pem("not a key")];

        let result = PeerDirectory::new(SchemeKind::AsymmetricPerPeer, specs);
        assert!(
            matches!(result, Err(SessionError::InvalidKeyMaterial { peer, .. }) if peer == "c")
        );
    }

    #[test]
    fn other_schemes_ignore_keys() {
        let specs = vec![PeerSpec::parse("c=10.0.0.3:1").unwrap().with_public_key_pem("not a key")];

        let directory = PeerDirectory::new(SchemeKind::SymmetricShared, specs).unwrap();
        assert!(directory.get("c").unwrap().public_key().is_none());
    }

    #[test]
    fn empty_directory() {
        let directory = PeerDirectory::new(SchemeKind::Plaintext, Vec::new()).unwrap();
        assert!(directory.is_empty());
        assert_eq!(directory.iter().count(), 0);
    }
}
