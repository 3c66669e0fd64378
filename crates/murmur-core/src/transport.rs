//! Transport abstraction for connectionless datagram delivery.
//!
//! Production uses a tokio UDP socket, tests use turmoil's simulated UDP or
//! an in-memory network with fault injection.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use tokio::net::{ToSocketAddrs, UdpSocket};

use crate::directory::Endpoint;

/// Unreliable, unordered datagram transport.
///
/// Mirrors UDP: a send either hands the whole datagram to the network or
/// fails locally; there is no delivery acknowledgement. A successful
/// `send_to` says nothing about whether the peer received it.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send one datagram to `target`.
    ///
    /// Resolves the endpoint's host on every call.
    async fn send_to(&self, datagram: &[u8], target: &Endpoint) -> io::Result<()>;

    /// Wait for the next datagram.
    ///
    /// Returns the number of bytes written into `buf` and the sender's
    /// address. Datagrams longer than `buf` are truncated.
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Address this transport is bound to
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// Transport over a real UDP socket.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind a UDP socket.
    ///
    /// # Errors
    ///
    /// Returns error if the address is in use or cannot be resolved.
    pub async fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self { socket })
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send_to(&self, datagram: &[u8], target: &Endpoint) -> io::Result<()> {
        let sent = self.socket.send_to(datagram, (target.host(), target.port())).await?;
        if sent == datagram.len() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short send: {sent} of {} bytes", datagram.len()),
            ))
        }
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
