use crate::errors::{Error, Result};
use crate::structs::*;

use rand::distributions::Uniform;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;

/// The statistical profile of a traffic class
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "distribution", rename_all = "lowercase")]
pub enum ClassProfile {
    Gaussian { mean: f32, std_dev: f32 },
    /// Both bounds are included
    Uniform { low: f32, high: f32 },
}

impl ClassProfile {
    pub fn default_for(class: TrafficClass) -> Self {
        match class {
            TrafficClass::Normal => ClassProfile::Gaussian {
                mean: 0.,
                std_dev: 1.,
            },
            TrafficClass::Attack => ClassProfile::Uniform {
                low: 5.,
                high: 15.,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            ClassProfile::Gaussian { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0. {
                    return Err(Error::config(format!(
                        "gaussian profile needs a finite mean and a positive standard deviation (got mean={mean}, std_dev={std_dev})"
                    )));
                }
            }
            ClassProfile::Uniform { low, high } => {
                if !low.is_finite() || !high.is_finite() || low > high || !(high - low).is_finite()
                {
                    return Err(Error::config(format!(
                        "uniform profile needs finite bounds with low <= high and a finite span (got [{low}, {high}])"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Sampler {
    Gaussian(Normal<f32>),
    Uniform(Uniform<f32>),
}

impl Sampler {
    fn new(profile: ClassProfile) -> Result<Self> {
        profile.validate()?;
        Ok(match profile {
            ClassProfile::Gaussian { mean, std_dev } => Sampler::Gaussian(
                Normal::new(mean, std_dev).map_err(|e| Error::config(e.to_string()))?,
            ),
            ClassProfile::Uniform { low, high } => {
                Sampler::Uniform(Uniform::new_inclusive(low, high))
            }
        })
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match self {
            Sampler::Gaussian(d) => d.sample(rng),
            Sampler::Uniform(d) => d.sample(rng),
        }
    }
}

/// Produces feature vectors for a traffic class. The random source is always provided by the
/// caller, so that each scheduler can own its own.
pub trait FeatureGenerator: Clone + std::marker::Send + 'static {
    fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        class: TrafficClass,
        width: usize,
    ) -> Result<FeatureVector>;
}

/// Draws every feature independently from the profile of the requested class
#[derive(Debug, Clone)]
pub struct ProfileGenerator {
    normal: Sampler,
    attack: Sampler,
}

impl Default for ProfileGenerator {
    fn default() -> Self {
        ProfileGenerator {
            normal: Sampler::Gaussian(Normal::new(0., 1.).unwrap()), // valid parameters
            attack: Sampler::Uniform(Uniform::new_inclusive(5., 15.)),
        }
    }
}

impl ProfileGenerator {
    pub fn new(normal: ClassProfile, attack: ClassProfile) -> Result<Self> {
        Ok(ProfileGenerator {
            normal: Sampler::new(normal)?,
            attack: Sampler::new(attack)?,
        })
    }
}

impl FeatureGenerator for ProfileGenerator {
    fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        class: TrafficClass,
        width: usize,
    ) -> Result<FeatureVector> {
        if width == 0 {
            return Err(Error::config("the vector width must be positive"));
        }
        let sampler = match class {
            TrafficClass::Normal => &self.normal,
            TrafficClass::Attack => &self.attack,
        };
        Ok((0..width).map(|_| sampler.sample(rng)).collect())
    }
}
