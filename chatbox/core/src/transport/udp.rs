//! UDP Send Primitive
//!
//! Fire-and-forget OSC over UDP. The socket is put in non-blocking mode, so a
//! full socket buffer surfaces as an error instead of stalling the caller.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use super::osc::OscMessage;
use super::traits::{SendPrimitive, TransportError};

/// Sends OSC messages to a single UDP target
#[derive(Debug)]
pub struct UdpSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSender {
    /// Resolve the target and bind an ephemeral local socket
    ///
    /// # Errors
    ///
    /// - `InvalidTarget` for an empty host or port 0
    /// - `Resolve` if the host does not resolve
    /// - `Io` if the local socket cannot be bound
    pub fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(TransportError::InvalidTarget("empty host".to_string()));
        }
        if port == 0 {
            return Err(TransportError::InvalidTarget(format!("{host}:0 has no port")));
        }

        let label = format!("{host}:{port}");
        let target = (host, port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                target: label.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| TransportError::InvalidTarget(format!("{label} has no addresses")))?;

        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_nonblocking(true)?;

        tracing::debug!(addr = %target, local = ?socket.local_addr().ok(), "UDP sender bound");

        Ok(Self { socket, target })
    }

    /// The resolved target address
    #[must_use]
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl SendPrimitive for UdpSender {
    fn send(&self, message: &OscMessage) -> Result<(), TransportError> {
        let packet = message.encode()?;
        let sent = self.socket.send_to(&packet, self.target)?;
        if sent != packet.len() {
            return Err(TransportError::SendFailed(format!(
                "short write: {sent} of {} bytes",
                packet.len()
            )));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("udp://{}", self.target)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::transport::osc::OscArg;

    #[test]
    fn test_rejects_empty_host() {
        let result = UdpSender::connect("  ", 9000);
        assert!(matches!(result, Err(TransportError::InvalidTarget(_))));
    }

    #[test]
    fn test_rejects_port_zero() {
        let result = UdpSender::connect("127.0.0.1", 0);
        assert!(matches!(result, Err(TransportError::InvalidTarget(_))));
    }

    #[test]
    fn test_sends_decodable_packet() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();

        let sender = UdpSender::connect("127.0.0.1", port).unwrap();
        assert_eq!(sender.describe(), format!("udp://127.0.0.1:{port}"));

        let msg = OscMessage::new("/chatbox/typing", vec![OscArg::Bool(true)]);
        sender.send(&msg).unwrap();

        let mut buf = [0u8; 1024];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(OscMessage::decode(&buf[..len]).unwrap(), msg);
    }
}
