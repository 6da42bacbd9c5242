//! Library for synthetic feature-vector traffic, used to exercise UDP intrusion-detection
//! endpoints with "normal" and "attack" observations.

/// Run parameters and their TOML representation
pub mod config;
/// Error types
pub mod errors;
/// Emission statistics
pub mod stats;

/// Structures used throughout the library
#[doc(hidden)]
pub mod structs;

#[doc(inline)]
pub use structs::*;

pub use errors::{Error, Result};

/// Binary wire format
pub mod codec;

/// Feature vector generation
pub mod features;

/// Class mixture and send timing
pub mod scheduler;

/// Packet sinks
pub mod transport;

/// Verification receiver
pub mod listen;
