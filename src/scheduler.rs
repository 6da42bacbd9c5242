use crate::codec;
use crate::errors::{Error, Result};
use crate::features::FeatureGenerator;
use crate::stats::Stats;
use crate::structs::*;
use crate::transport::PacketSink;

use rand::distributions::{Uniform, WeightedIndex};
use rand::Rng;
use rand_distr::Distribution;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Bounds of the pause between two packets, both included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl Default for DelayRange {
    fn default() -> Self {
        DelayRange {
            min: Duration::from_millis(500),
            max: Duration::from_millis(2000),
        }
    }
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(Error::config(format!(
                "malformed delay range: {min:?} is greater than {max:?}"
            )));
        }
        Ok(DelayRange { min, max })
    }

    /// Build a range from seconds, as found in the configuration file
    pub fn from_secs_f64(min: f64, max: f64) -> Result<Self> {
        let to_duration = |secs: f64| {
            Duration::try_from_secs_f64(secs)
                .map_err(|e| Error::config(format!("malformed delay {secs}: {e}")))
        };
        DelayRange::new(to_duration(min)?, to_duration(max)?)
    }
}

/// How the continuous mode picks classes and spaces packets out
#[derive(Debug, Clone)]
pub struct EmissionPolicy {
    pub vector_width: usize,
    pub class_weights: Vec<(TrafficClass, u32)>,
    pub delay: DelayRange,
    /// Stop after that many packets. Run until cancelled otherwise.
    pub max_packets: Option<u64>,
}

impl Default for EmissionPolicy {
    fn default() -> Self {
        EmissionPolicy {
            vector_width: DEFAULT_VECTOR_WIDTH,
            class_weights: vec![(TrafficClass::Normal, 2), (TrafficClass::Attack, 1)],
            delay: DelayRange::default(),
            max_packets: None,
        }
    }
}

/// Parameters of the burst mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstPolicy {
    pub count: u64,
    pub interval: Duration,
}

impl Default for BurstPolicy {
    fn default() -> Self {
        BurstPolicy {
            count: 3,
            interval: Duration::from_millis(200),
        }
    }
}

/// Chooses, generates, encodes and sends packets. Each scheduler owns its random source.
pub struct Scheduler<G: FeatureGenerator, R: Rng> {
    policy: EmissionPolicy,
    generator: G,
    rng: R,
    class_distrib: WeightedIndex<u32>,
    delay_distrib: Uniform<Duration>,
}

impl<G: FeatureGenerator, R: Rng> Scheduler<G, R> {
    pub fn new(policy: EmissionPolicy, generator: G, rng: R) -> Result<Self> {
        if policy.vector_width == 0 {
            return Err(Error::config("the vector width must be positive"));
        }
        if policy.class_weights.is_empty() {
            return Err(Error::config("no traffic class to choose from"));
        }
        total_weight(policy.class_weights.iter().map(|(_, w)| *w))?;
        let class_distrib = WeightedIndex::new(policy.class_weights.iter().map(|(_, w)| *w))
            .map_err(|e| Error::config(format!("invalid class weights: {e}")))?;
        let delay = DelayRange::new(policy.delay.min, policy.delay.max)?;
        let delay_distrib = Uniform::new_inclusive(delay.min, delay.max);
        Ok(Scheduler {
            policy,
            generator,
            rng,
            class_distrib,
            delay_distrib,
        })
    }

    pub fn policy(&self) -> &EmissionPolicy {
        &self.policy
    }

    fn next_class(&mut self) -> TrafficClass {
        self.policy.class_weights[self.class_distrib.sample(&mut self.rng)].0
    }

    fn next_delay(&mut self) -> Duration {
        self.delay_distrib.sample(&mut self.rng)
    }

    /// Continuous mode: send packets of randomly chosen classes until `running` is cleared or
    /// `max_packets` is reached. Cancellation is checked before each generation, so at most one
    /// delay elapses between the request and the return.
    pub fn run(
        &mut self,
        sink: &impl PacketSink,
        running: &AtomicBool,
        stats: &Stats,
    ) -> Result<()> {
        log::trace!("Start continuous emission");
        let mut emitted: u64 = 0;
        loop {
            if !running.load(Ordering::Relaxed) {
                log::debug!("Emission cancelled after {emitted} packets");
                break;
            }
            if self.policy.max_packets.is_some_and(|max| emitted >= max) {
                break;
            }
            let class = self.next_class();
            let vector = self
                .generator
                .generate(&mut self.rng, class, self.policy.vector_width)?;
            let packet = codec::encode(&vector);
            send_one(sink, class, &packet, stats);
            emitted += 1;
            if self.policy.max_packets.is_some_and(|max| emitted >= max) {
                break;
            }
            thread::sleep(self.next_delay());
        }
        log::trace!("Continuous emission stops");
        Ok(())
    }

    /// Burst mode: generate a single vector and send the very same packet `count` times
    pub fn run_burst(
        &mut self,
        class: TrafficClass,
        burst: BurstPolicy,
        sink: &impl PacketSink,
        running: &AtomicBool,
        stats: &Stats,
    ) -> Result<()> {
        if burst.count == 0 {
            return Err(Error::config("the burst count must be positive"));
        }
        log::trace!("Start burst of {} {class} packets", burst.count);
        let vector = self
            .generator
            .generate(&mut self.rng, class, self.policy.vector_width)?;
        let packet = codec::encode(&vector);
        for i in 0..burst.count {
            if !running.load(Ordering::Relaxed) {
                log::debug!("Burst cancelled after {i} packets");
                break;
            }
            send_one(sink, class, &packet, stats);
            if i + 1 < burst.count {
                thread::sleep(burst.interval);
            }
        }
        log::trace!("Burst stops");
        Ok(())
    }
}

/// Sum of the class weights. Fails if it overflows.
pub fn total_weight(weights: impl IntoIterator<Item = u32>) -> Result<u32> {
    weights
        .into_iter()
        .try_fold(0u32, |acc, w| acc.checked_add(w))
        .ok_or_else(|| Error::config("the sum of the class weights overflows"))
}

/// Fire and forget: a failure is reported and the packet is dropped
fn send_one(sink: &impl PacketSink, class: TrafficClass, packet: &EncodedPacket, stats: &Stats) {
    match sink.send(packet) {
        Ok(()) => {
            stats.packet_sent(class, packet);
            match class {
                TrafficClass::Normal => log::info!("[>] Sent {class} packet"),
                TrafficClass::Attack => log::info!("[!!!] Sent {class} packet"),
            }
        }
        Err(e) => {
            stats.send_failed();
            log::error!("Failed to send {class} packet: {e}");
        }
    }
}
