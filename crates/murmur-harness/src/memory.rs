//! In-process datagram network with fault injection.

use std::{
    collections::{HashMap, HashSet},
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use murmur_core::{Endpoint, Transport};
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tracing::trace;

type Datagram = (Vec<u8>, SocketAddr);

#[derive(Default)]
struct NetworkState {
    /// Bound sockets by (host name, port)
    sockets: HashMap<(String, u16), mpsc::UnboundedSender<Datagram>>,
    /// Simulated address of each host name
    addresses: HashMap<String, IpAddr>,
    /// Hosts whose sends fail locally, as if no route existed
    unreachable: HashSet<String>,
    /// Hosts whose next inbound datagram gets its last byte flipped
    corrupt_next: HashSet<String>,
    /// Every datagram accepted for delivery, in send order
    log: Vec<(Endpoint, Vec<u8>)>,
}

/// A shared in-memory network.
///
/// Hosts are addressed by name. Each host gets a distinct `10.0.0.x`
/// address so receivers see a realistic source. Datagrams to a name/port
/// nobody has bound are dropped silently, like UDP.
///
/// Cheap to clone; clones refer to the same network.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl MemoryNetwork {
    /// Create an empty network
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bind `port` on `host`, registering the host if needed.
    ///
    /// # Errors
    ///
    /// Returns `AddrInUse` if the port is already bound on that host.
    pub fn bind(&self, host: &str, port: u16) -> io::Result<MemoryTransport> {
        let mut state = self.state();

        let key = (host.to_string(), port);
        if state.sockets.contains_key(&key) {
            return Err(io::Error::new(
                io::ErrorKind::AddrInUse,
                format!("{host}:{port} already bound"),
            ));
        }

        let next = state.addresses.len() as u8 + 1;
        let ip = *state
            .addresses
            .entry(host.to_string())
            .or_insert(IpAddr::V4(Ipv4Addr::new(10, 0, 0, next)));

        let (tx, rx) = mpsc::unbounded_channel();
        state.sockets.insert(key, tx);

        Ok(MemoryTransport {
            network: self.clone(),
            host: host.to_string(),
            local_addr: SocketAddr::new(ip, port),
            inbox: AsyncMutex::new(rx),
        })
    }

    /// Make every send *to* `host` fail with `HostUnreachable`.
    pub fn set_unreachable(&self, host: &str, unreachable: bool) {
        let mut state = self.state();
        if unreachable {
            state.unreachable.insert(host.to_string());
        } else {
            state.unreachable.remove(host);
        }
    }

    /// Flip the last bit of the next datagram delivered to `host`.
    pub fn corrupt_next(&self, host: &str) {
        self.state().corrupt_next.insert(host.to_string());
    }

    /// Deliver raw bytes to a bound socket, bypassing any sender.
    ///
    /// Returns false if nothing is bound at `target`.
    pub fn inject(&self, target: &Endpoint, datagram: Vec<u8>, from: SocketAddr) -> bool {
        let state = self.state();
        match state.sockets.get(&(target.host().to_string(), target.port())) {
            Some(tx) => tx.send((datagram, from)).is_ok(),
            None => false,
        }
    }

    /// Every datagram accepted for delivery so far
    pub fn sent(&self) -> Vec<(Endpoint, Vec<u8>)> {
        self.state().log.clone()
    }

    fn deliver(
        &self,
        mut datagram: Vec<u8>,
        target: &Endpoint,
        from: SocketAddr,
    ) -> io::Result<()> {
        let mut state = self.state();

        if state.unreachable.contains(target.host()) {
            return Err(io::Error::new(
                io::ErrorKind::HostUnreachable,
                format!("no route to {}", target.host()),
            ));
        }

        if state.corrupt_next.remove(target.host()) {
            if let Some(last) = datagram.last_mut() {
                *last ^= 0x01;
            }
        }

        state.log.push((target.clone(), datagram.clone()));

        match state.sockets.get(&(target.host().to_string(), target.port())) {
            Some(tx) => {
                // A closed inbox is a socket that went away; UDP drops silently.
                let _ = tx.send((datagram, from));
            },
            None => trace!(%target, "no socket bound, datagram dropped"),
        }

        Ok(())
    }
}

/// One bound socket on a [`MemoryNetwork`].
pub struct MemoryTransport {
    network: MemoryNetwork,
    host: String,
    local_addr: SocketAddr,
    inbox: AsyncMutex<mpsc::UnboundedReceiver<Datagram>>,
}

impl MemoryTransport {
    /// Host name this socket is bound on
    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_to(&self, datagram: &[u8], target: &Endpoint) -> io::Result<()> {
        self.network.deliver(datagram.to_vec(), target, self.local_addr)
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let received = self.inbox.lock().await.recv().await;
        let (datagram, from) = received
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "network dropped"))?;

        let len = datagram.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram[..len]);
        Ok((len, from))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_between_hosts() {
        let network = MemoryNetwork::new();
        let a = network.bind("a", 9000).unwrap();
        let b = network.bind("b", 9000).unwrap();

        a.send_to(b"hi", &Endpoint::new("b", 9000)).await.unwrap();

        let mut buf = [0u8; 16];
        let (n, from) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hi");
        assert_eq!(from, a.local_addr().unwrap());
        assert_ne!(a.local_addr().unwrap().ip(), b.local_addr().unwrap().ip());
    }

    #[tokio::test]
    async fn unbound_target_drops_silently() {
        let network = MemoryNetwork::new();
        let a = network.bind("a", 9000).unwrap();

        assert!(a.send_to(b"void", &Endpoint::new("nobody", 9000)).await.is_ok());
        assert_eq!(network.sent().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_host_fails_send() {
        let network = MemoryNetwork::new();
        let a = network.bind("a", 9000).unwrap();
        let _b = network.bind("b", 9000).unwrap();
        network.set_unreachable("b", true);

        let err = a.send_to(b"x", &Endpoint::new("b", 9000)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::HostUnreachable);
        assert!(network.sent().is_empty());

        network.set_unreachable("b", false);
        assert!(a.send_to(b"x", &Endpoint::new("b", 9000)).await.is_ok());
    }

    #[tokio::test]
    async fn corrupts_only_next_datagram() {
        let network = MemoryNetwork::new();
        let a = network.bind("a", 9000).unwrap();
        let b = network.bind("b", 9000).unwrap();
        network.corrupt_next("b");

        a.send_to(&[0x00, 0x00], &Endpoint::new("b", 9000)).await.unwrap();
        a.send_to(&[0x00, 0x00], &Endpoint::new("b", 9000)).await.unwrap();

        let mut buf = [0u8; 4];
        let (n, _) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0x00, 0x01]);
        let (n, _) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0x00, 0x00]);
    }

    #[test]
    fn double_bind_fails() {
        let network = MemoryNetwork::new();
        let _a = network.bind("a", 9000).unwrap();
        assert_eq!(network.bind("a", 9000).err().map(|e| e.kind()), Some(io::ErrorKind::AddrInUse));
        assert!(network.bind("a", 9001).is_ok());
    }

    #[tokio::test]
    async fn inject_reaches_bound_socket() {
        let network = MemoryNetwork::new();
        let b = network.bind("b", 9000).unwrap();
        let from = SocketAddr::from(([192, 0, 2, 1], 4000));

        assert!(network.inject(&Endpoint::new("b", 9000), b"raw".to_vec(), from));
        assert!(!network.inject(&Endpoint::new("b", 9001), b"raw".to_vec(), from));

        let mut buf = [0u8; 8];
        assert_eq!(b.recv_from(&mut buf).await.unwrap(), (3, from));
    }
}
