//! Turmoil-based Transport implementation using UDP sockets.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
};

use async_trait::async_trait;
use murmur_core::{Endpoint, Transport};
use turmoil::net::UdpSocket;

/// Simulation transport using turmoil's UDP.
///
/// Endpoints are resolved through turmoil's DNS, so peers are addressed by
/// the host names registered with the simulation. Sending to a name that was
/// never registered panics inside turmoil; register every host a test sends
/// to, even ones that never bind.
///
/// Must be used inside a turmoil simulation.
pub struct SimTransport {
    socket: UdpSocket,
}

impl SimTransport {
    /// Bind on all interfaces of the current simulated host.
    ///
    /// # Errors
    ///
    /// Returns error if the port is already bound on this host.
    pub async fn bind(port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port)).await?;
        Ok(Self { socket })
    }
}

#[async_trait]
impl Transport for SimTransport {
    async fn send_to(&self, datagram: &[u8], target: &Endpoint) -> io::Result<()> {
        self.socket.send_to(datagram, (target.host(), target.port())).await?;
        Ok(())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
