//! Sessions over real loopback UDP sockets.

use std::time::Duration;

use murmur_core::{
    Endpoint, PeerSpec, Session, SessionConfig, SessionError, Transport, UdpTransport,
};
use murmur_crypto::ConfidentialityScheme;
use tokio::{sync::mpsc, time::timeout};

const PASSPHRASE: &str = "L00pback.Only";

fn symmetric() -> ConfidentialityScheme {
    ConfidentialityScheme::from_passphrase(PASSPHRASE).unwrap()
}

async fn bind() -> UdpTransport {
    UdpTransport::bind("127.0.0.1:0").await.unwrap()
}

#[tokio::test]
async fn three_peers_one_unresolvable() {
    let (b_transport, c_transport) = (bind().await, bind().await);
    let b_port = b_transport.local_addr().unwrap().port();
    let c_port = c_transport.local_addr().unwrap().port();

    let peers = vec![
        PeerSpec::new("b", Endpoint::new("127.0.0.1", b_port)),
        PeerSpec::new("ghost", Endpoint::new("ghost.invalid", 9)),
        PeerSpec::new("c", Endpoint::new("127.0.0.1", c_port)),
    ];
    let (mut a, _) =
        Session::new(bind().await, SessionConfig::new("a", symmetric(), peers)).unwrap().split();

    let (b_events, mut b_inbox) = mpsc::channel(4);
    let (c_events, mut c_inbox) = mpsc::channel(4);
    let b = Session::new(b_transport, SessionConfig::new("b", symmetric(), Vec::new())).unwrap();
    let (_b, _b_task) = b.spawn(b_events);
    let c = Session::new(c_transport, SessionConfig::new("c", symmetric(), Vec::new())).unwrap();
    let (_c, _c_task) = c.spawn(c_events);

    let report = a.send("is anyone there").await.unwrap();
    assert_eq!(report.clock, 1);
    assert_eq!(report.delivered.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        &report.failed[0],
        SessionError::Transmission { endpoint, .. } if endpoint.host() == "ghost.invalid"
    ));

    for inbox in [&mut b_inbox, &mut c_inbox] {
        let delivered = timeout(Duration::from_secs(5), inbox.recv()).await.unwrap().unwrap();
        assert_eq!(delivered.alias, "a");
        assert_eq!(delivered.text, "is anyone there");
        assert_eq!(delivered.clock, 2);
    }
}
