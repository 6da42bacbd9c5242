use serde::Deserialize;
use std::fmt::Display;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Number of features expected by the detector. A different width on either side silently
/// corrupts detection, so every entry point reads it from here or from the configuration.
pub const DEFAULT_VECTOR_WIDTH: usize = 122;

/// Default access point address of the detection device
pub const DEFAULT_DESTINATION: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(192, 168, 4, 1), 3333));

/// One observation, as consumed by the remote detector. Only the position of each value matters.
pub type FeatureVector = Vec<f32>;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrafficClass {
    Normal,
    Attack,
}

impl Display for TrafficClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrafficClass::Normal => write!(f, "NORMAL"),
            TrafficClass::Attack => write!(f, "ATTACK"),
        }
    }
}

impl TrafficClass {
    pub fn iter() -> [TrafficClass; 2] {
        [TrafficClass::Normal, TrafficClass::Attack]
    }
}

/// The wire representation of a feature vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPacket {
    data: Vec<u8>,
}

impl EncodedPacket {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        EncodedPacket { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
