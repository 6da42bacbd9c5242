use crate::errors::Result;
use crate::structs::*;

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

/// Something packets can be handed to. Delivery is never acknowledged.
pub trait PacketSink: std::marker::Send + std::marker::Sync {
    fn send(&self, packet: &EncodedPacket) -> Result<()>;
}

/// Sends each packet as a single UDP datagram to a fixed destination
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpSink {
    /// Bind an ephemeral local port
    pub fn new(destination: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        log::debug!(
            "UDP socket bound on {:?}, sending to {destination}",
            socket.local_addr()
        );
        Ok(UdpSink {
            socket,
            destination,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

impl PacketSink for UdpSink {
    fn send(&self, packet: &EncodedPacket) -> Result<()> {
        let n = self.socket.send_to(packet.as_bytes(), self.destination)?;
        if n != packet.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("only {n} of {} bytes sent", packet.len()),
            )
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use std::time::Duration;

    #[test]
    fn test_udp_sink_sends_one_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let sink = UdpSink::new(receiver.local_addr().unwrap()).unwrap();
        assert_eq!(sink.destination(), receiver.local_addr().unwrap());

        let packet = codec::encode(&[1.0; DEFAULT_VECTOR_WIDTH]);
        sink.send(&packet).unwrap();

        let mut buf = [0u8; 1024];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(n, 488);
        assert_eq!(&buf[..n], packet.as_bytes());
    }
}
