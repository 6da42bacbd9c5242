//! Receiving side, to check what the detector would get.

use crate::codec;
use crate::errors::{Error, Result};

use serde::Serialize;
use std::io::{self, Write};
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

// The cancellation flag is checked at least that often
const POLL_INTERVAL: Duration = Duration::from_millis(200);
const MAX_DATAGRAM_SIZE: usize = 65_536;

/// Summary of one decoded datagram, printed as a JSON line
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PacketSummary {
    pub from: SocketAddr,
    pub bytes: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub values: Vec<f32>,
}

impl PacketSummary {
    fn new(from: SocketAddr, bytes: usize, values: Vec<f32>) -> Self {
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mean = values.iter().sum::<f32>() / values.len() as f32;
        PacketSummary {
            from,
            bytes,
            min,
            max,
            mean,
            values,
        }
    }
}

pub struct Listener {
    socket: UdpSocket,
    vector_width: usize,
}

impl Listener {
    pub fn bind(addr: SocketAddr, vector_width: usize) -> Result<Self> {
        if vector_width == 0 {
            return Err(Error::config("the vector width must be positive"));
        }
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        log::info!("Listening on {}", socket.local_addr()?);
        Ok(Listener {
            socket,
            vector_width,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Decode datagrams and write a summary of the valid ones to `out`. Returns the number of
    /// valid packets, once `running` is cleared or `max_packets` is reached.
    pub fn run(
        &self,
        running: &AtomicBool,
        max_packets: Option<u64>,
        out: &mut impl Write,
    ) -> Result<u64> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let mut received: u64 = 0;
        while running.load(Ordering::Relaxed) && max_packets.map_or(true, |m| received < m) {
            let (n, from) = match self.socket.recv_from(&mut buf) {
                Ok(r) => r,
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    continue
                }
                Err(e) => return Err(e.into()),
            };
            match codec::decode_with_width(&buf[..n], self.vector_width) {
                Ok(values) => {
                    received += 1;
                    let summary = PacketSummary::new(from, n, values);
                    log::debug!(
                        "Packet from {from}: mean {:.3} in [{:.3}, {:.3}]",
                        summary.mean,
                        summary.min,
                        summary.max
                    );
                    let line = serde_json::to_string(&summary).map_err(io::Error::from)?;
                    writeln!(out, "{line}")?;
                }
                Err(e) => log::warn!("Dropping datagram from {from}: {e}"),
            }
        }
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::structs::*;
    use crate::transport::{PacketSink, UdpSink};

    #[test]
    fn test_listen_decodes_valid_packets() {
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), 4).unwrap();
        let sink = UdpSink::new(listener.local_addr().unwrap()).unwrap();

        // wrong width, then not a multiple of 4, then a valid one
        sink.send(&codec::encode(&[1.0; DEFAULT_VECTOR_WIDTH]))
            .unwrap();
        sink.send(&EncodedPacket::new(vec![0; 5])).unwrap();
        sink.send(&codec::encode(&[1.0, 2.0, 3.0, 6.0])).unwrap();

        let running = AtomicBool::new(true);
        let mut out = vec![];
        let received = listener.run(&running, Some(1), &mut out).unwrap();
        assert_eq!(received, 1);

        let output = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1);
        let json: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(json["bytes"], 16);
        assert_eq!(json["min"], 1.0);
        assert_eq!(json["max"], 6.0);
        assert_eq!(json["mean"], 3.0);
        assert_eq!(json["values"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_zero_width_rejected() {
        assert!(matches!(
            Listener::bind("127.0.0.1:0".parse().unwrap(), 0),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_listen_stops_when_cancelled() {
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), 4).unwrap();
        let running = AtomicBool::new(false);
        let mut out = vec![];
        assert_eq!(listener.run(&running, None, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }
}
