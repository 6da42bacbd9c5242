use crate::errors::{Error, Result};
use crate::features::{ClassProfile, ProfileGenerator};
use crate::scheduler::{total_weight, BurstPolicy, DelayRange, EmissionPolicy};
use crate::structs::*;

use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Everything that parameterizes a run. Built from the defaults, then from an optional TOML file,
/// then overridden by the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub destination: SocketAddr,
    pub vector_width: usize,
    pub normal_weight: u32,
    pub attack_weight: u32,
    pub delay: DelayRange,
    pub burst: BurstPolicy,
    pub normal_profile: ClassProfile,
    pub attack_profile: ClassProfile,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            destination: DEFAULT_DESTINATION,
            vector_width: DEFAULT_VECTOR_WIDTH,
            normal_weight: 2,
            attack_weight: 1,
            delay: DelayRange::default(),
            burst: BurstPolicy::default(),
            normal_profile: ClassProfile::default_for(TrafficClass::Normal),
            attack_profile: ClassProfile::default_for(TrafficClass::Attack),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ConfigurationToml {
    destination: Option<String>,
    vector_width: Option<usize>,
    weights: Option<WeightsToml>,
    delay: Option<RangeToml>,
    burst: Option<BurstToml>,
    profiles: Option<ProfilesToml>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct WeightsToml {
    normal: Option<u32>,
    attack: Option<u32>,
}

// in seconds
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RangeToml {
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct BurstToml {
    count: Option<u64>,
    interval: Option<f64>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ProfilesToml {
    normal: Option<ClassProfile>,
    attack: Option<ClassProfile>,
}

impl TryFrom<ConfigurationToml> for Configuration {
    type Error = Error;

    fn try_from(c: ConfigurationToml) -> Result<Self> {
        let mut config = Configuration::default();
        if let Some(d) = c.destination {
            config.destination = d
                .parse()
                .map_err(|e| Error::config(format!("cannot parse destination \"{d}\": {e}")))?;
        }
        if let Some(w) = c.vector_width {
            config.vector_width = w;
        }
        if let Some(w) = c.weights {
            config.normal_weight = w.normal.unwrap_or(config.normal_weight);
            config.attack_weight = w.attack.unwrap_or(config.attack_weight);
        }
        if let Some(d) = c.delay {
            config.delay = DelayRange::from_secs_f64(
                d.min.unwrap_or(config.delay.min.as_secs_f64()),
                d.max.unwrap_or(config.delay.max.as_secs_f64()),
            )?;
        }
        if let Some(b) = c.burst {
            config.burst.count = b.count.unwrap_or(config.burst.count);
            if let Some(i) = b.interval {
                config.burst.interval = Duration::try_from_secs_f64(i)
                    .map_err(|e| Error::config(format!("malformed burst interval {i}: {e}")))?;
            }
        }
        if let Some(p) = c.profiles {
            config.normal_profile = p.normal.unwrap_or(config.normal_profile);
            config.attack_profile = p.attack.unwrap_or(config.attack_profile);
        }
        config.validate()?;
        Ok(config)
    }
}

impl Configuration {
    /// Load a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let string = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
        import_config(&string)
    }

    /// Check the parameters that must hold for every mode
    pub fn validate(&self) -> Result<()> {
        if self.vector_width == 0 {
            return Err(Error::config("the vector width must be positive"));
        }
        if self.normal_weight == 0 && self.attack_weight == 0 {
            return Err(Error::config("at least one class weight must be positive"));
        }
        total_weight([self.normal_weight, self.attack_weight])?;
        DelayRange::new(self.delay.min, self.delay.max)?;
        if self.burst.count == 0 {
            return Err(Error::config("the burst count must be positive"));
        }
        self.normal_profile.validate()?;
        self.attack_profile.validate()?;
        Ok(())
    }

    /// Continuous mode policy
    pub fn emission_policy(&self, max_packets: Option<u64>) -> EmissionPolicy {
        EmissionPolicy {
            vector_width: self.vector_width,
            class_weights: vec![
                (TrafficClass::Normal, self.normal_weight),
                (TrafficClass::Attack, self.attack_weight),
            ],
            delay: self.delay,
            max_packets,
        }
    }

    pub fn generator(&self) -> Result<ProfileGenerator> {
        ProfileGenerator::new(self.normal_profile, self.attack_profile)
    }
}

/// Import a configuration from a TOML string. Missing keys keep their default value.
pub fn import_config(config_string: &str) -> Result<Configuration> {
    let toml: ConfigurationToml = toml::from_str(config_string)
        .map_err(|e| Error::config(format!("cannot parse the configuration file: {e}")))?;
    let config = Configuration::try_from(toml)?;
    log::trace!("Configuration: {config:?}");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};

    #[test]
    fn test_empty_config() {
        let config = import_config("").unwrap();
        assert_eq!(config, Configuration::default());
        assert_eq!(config.destination.to_string(), "192.168.4.1:3333");
        assert_eq!(config.vector_width, 122);
    }

    #[test]
    fn test_full_config() {
        let config = import_config(
            r#"
destination = "10.0.0.2:4444"
vector_width = 41

[weights]
normal = 9
attack = 1

[delay]
min = 0.1
max = 0.25

[burst]
count = 10
interval = 0.05

[profiles.normal]
distribution = "gaussian"
mean = 1.0
std_dev = 2.0

[profiles.attack]
distribution = "uniform"
low = 20.0
high = 30.0
"#,
        )
        .unwrap();
        assert_eq!(
            config.destination,
            SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 4444))
        );
        assert_eq!(config.vector_width, 41);
        assert_eq!((config.normal_weight, config.attack_weight), (9, 1));
        assert_eq!(config.delay.min, Duration::from_millis(100));
        assert_eq!(config.delay.max, Duration::from_millis(250));
        assert_eq!(config.burst.count, 10);
        assert_eq!(config.burst.interval, Duration::from_millis(50));
        assert_eq!(
            config.normal_profile,
            ClassProfile::Gaussian {
                mean: 1.,
                std_dev: 2.
            }
        );
        assert_eq!(
            config.attack_profile,
            ClassProfile::Uniform {
                low: 20.,
                high: 30.
            }
        );

        let policy = config.emission_policy(Some(5));
        assert_eq!(policy.vector_width, 41);
        assert_eq!(policy.max_packets, Some(5));
        assert_eq!(
            policy.class_weights,
            vec![(TrafficClass::Normal, 9), (TrafficClass::Attack, 1)]
        );
        assert!(config.generator().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config = import_config(
            r#"
[weights]
attack = 4
[delay]
max = 3.0
"#,
        )
        .unwrap();
        assert_eq!((config.normal_weight, config.attack_weight), (2, 4));
        assert_eq!(config.delay.min, Duration::from_millis(500));
        assert_eq!(config.delay.max, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_configs() {
        let invalid = [
            "vector_width = 0",
            "unknown_key = 1",
            "destination = \"not an address\"",
            "[weights]\nnormal = 0\nattack = 0",
            "[weights]\nnormal = 4294967295\nattack = 1",
            "[profiles.attack]\ndistribution = \"uniform\"\nlow = -3e38\nhigh = 3e38",
            "[delay]\nmin = 3.0\nmax = 1.0",
            "[delay]\nmin = -1.0",
            "[burst]\ncount = 0",
            "[profiles.attack]\ndistribution = \"uniform\"\nlow = 15.0\nhigh = 5.0",
            "[profiles.normal]\ndistribution = \"gaussian\"\nmean = 0.0\nstd_dev = -1.0",
            "[profiles.normal]\ndistribution = \"poisson\"\nlambda = 2.0",
        ];
        for s in invalid {
            assert!(
                matches!(import_config(s), Err(Error::InvalidConfiguration(_))),
                "accepted: {s}"
            );
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Configuration::from_file("/nonexistent/idsgen.toml"),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
