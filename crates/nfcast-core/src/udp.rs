//! Multicast datagram receiver for the NFCAST feed.
//!
//! The socket is configured with `socket2` (reuse-address, optional receive
//! buffer sizing, multicast join) and then handed to tokio for async
//! receives. Each receive yields exactly one complete datagram; UDP does the
//! framing; there is no accumulation.
//!
//! The receive call is bounded (default 1 s) so the enclosing run loop can
//! observe a shutdown request between attempts: a timeout is *not* an error,
//! it is a distinguished "no datagram" result.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::info;

use crate::config::MulticastConfig;
use crate::error::FeedError;

/// Receive buffer large enough for any UDP payload.
const MAX_UDP_PAYLOAD: usize = 65535;

/// Timeout-bounded multicast datagram source.
pub struct FeedReceiver {
    socket: UdpSocket,
    timeout: Duration,
    buf: Vec<u8>,
}

impl FeedReceiver {
    /// Bind the receive port, join the multicast group, and apply the
    /// requested kernel receive-buffer size.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(
        multicast: &MulticastConfig,
        buffer_size: Option<usize>,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let group: Ipv4Addr = multicast
            .ip
            .parse()
            .map_err(|_| FeedError::Config(format!("invalid multicast ip {:?}", multicast.ip)))?;
        if !group.is_multicast() {
            return Err(FeedError::Config(format!("{group} is not a multicast address")));
        }

        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        if let Some(size) = buffer_size {
            socket.set_recv_buffer_size(size)?;
        }
        socket.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, multicast.port).into())?;
        socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
        socket.set_nonblocking(true)?;

        let socket = UdpSocket::from_std(socket.into())?;
        info!("joined multicast group {group}:{}", multicast.port);

        Ok(Self { socket, timeout, buf: vec![0u8; MAX_UDP_PAYLOAD] })
    }

    /// Receive one datagram, bounded by the configured timeout.
    ///
    /// Returns `Ok(None)` on timeout (silent; the caller re-checks its
    /// shutdown flag and tries again). A socket-level error is fatal to the
    /// run loop and is surfaced as `Err`.
    ///
    /// The returned payload length is exactly what the OS delivered;
    /// unrecognized lengths pass through unchanged; rejection is the
    /// decoder's job.
    pub async fn next_datagram(&mut self) -> Result<Option<(Vec<u8>, SocketAddr)>, FeedError> {
        match tokio::time::timeout(self.timeout, self.socket.recv_from(&mut self.buf)).await {
            Err(_elapsed) => Ok(None),
            Ok(Ok((len, source))) => Ok(Some((self.buf[..len].to_vec(), source))),
            Ok(Err(e)) => Err(FeedError::Socket(e.to_string())),
        }
    }
}
