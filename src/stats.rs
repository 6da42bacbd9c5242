use crate::structs::*;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const REPORT_PERIOD_IN_SECS: u64 = 5;

/// Emission counters, shared by every scheduler of the process
pub struct Stats {
    pub start_time: Instant,
    pub normal_sent: AtomicU64,
    pub attack_sent: AtomicU64,
    pub failed_sends: AtomicU64,
    pub bytes_counter: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            start_time: Instant::now(),
            normal_sent: AtomicU64::new(0),
            attack_sent: AtomicU64::new(0),
            failed_sends: AtomicU64::new(0),
            bytes_counter: AtomicU64::new(0),
        }
    }
}

impl Stats {
    pub fn packet_sent(&self, class: TrafficClass, packet: &EncodedPacket) {
        match class {
            TrafficClass::Normal => self.normal_sent.fetch_add(1, Ordering::Relaxed),
            TrafficClass::Attack => self.attack_sent.fetch_add(1, Ordering::Relaxed),
        };
        self.bytes_counter
            .fetch_add(packet.len() as u64, Ordering::Relaxed);
    }

    pub fn send_failed(&self) {
        self.failed_sends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sent(&self, class: TrafficClass) -> u64 {
        match class {
            TrafficClass::Normal => self.normal_sent.load(Ordering::Relaxed),
            TrafficClass::Attack => self.attack_sent.load(Ordering::Relaxed),
        }
    }

    pub fn total_sent(&self) -> u64 {
        self.sent(TrafficClass::Normal) + self.sent(TrafficClass::Attack)
    }

    pub fn failed(&self) -> u64 {
        self.failed_sends.load(Ordering::Relaxed)
    }

    pub fn log_summary(&self) {
        let bc = self.bytes_counter.load(Ordering::Relaxed);
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let throughput = if elapsed > 0. {
            8. * (bc as f64) / elapsed / 1000.
        } else {
            0.
        };
        log::info!(
            "{} packets sent ({} normal, {} attack), {} failed ({:.2} kbps)",
            self.total_sent(),
            self.sent(TrafficClass::Normal),
            self.sent(TrafficClass::Attack),
            self.failed(),
            throughput
        );
    }
}

/// Periodically log the counters until `running` is cleared
pub fn run(stats: Arc<Stats>, running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        for _ in 0..REPORT_PERIOD_IN_SECS {
            thread::sleep(Duration::from_secs(1));
            if !running.load(Ordering::Relaxed) {
                break;
            }
        }
        if running.load(Ordering::Relaxed) {
            stats.log_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    #[test]
    fn test_counters() {
        let stats = Stats::default();
        let packet = codec::encode(&[0.; 10]);
        stats.packet_sent(TrafficClass::Normal, &packet);
        stats.packet_sent(TrafficClass::Normal, &packet);
        stats.packet_sent(TrafficClass::Attack, &packet);
        stats.send_failed();
        assert_eq!(stats.sent(TrafficClass::Normal), 2);
        assert_eq!(stats.sent(TrafficClass::Attack), 1);
        assert_eq!(stats.total_sent(), 3);
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.bytes_counter.load(Ordering::Relaxed), 120);
    }
}
