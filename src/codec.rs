//! Fixed-layout wire codec.
//!
//! A packet is the concatenation of the feature values, each stored as an IEEE-754 `f32` in
//! little-endian order. There is no header, length prefix, padding or checksum: the element count
//! is implied by the datagram size.

use crate::errors::{Error, Result};
use crate::structs::*;

/// Size in bytes of one encoded feature
pub const FLOAT_SIZE: usize = 4;

/// Size in bytes of an encoded vector of `width` features
pub fn encoded_len(width: usize) -> usize {
    width * FLOAT_SIZE
}

/// Serialize a feature vector into its wire representation
pub fn encode(vector: &[f32]) -> EncodedPacket {
    let mut data = Vec::with_capacity(encoded_len(vector.len()));
    for v in vector {
        data.extend_from_slice(&v.to_le_bytes());
    }
    EncodedPacket::new(data)
}

/// Deserialize a wire buffer. Fails if its length is not a multiple of `FLOAT_SIZE`.
pub fn decode(bytes: &[u8]) -> Result<FeatureVector> {
    if bytes.len() % FLOAT_SIZE != 0 {
        return Err(Error::malformed(format!(
            "{} bytes is not a multiple of {FLOAT_SIZE}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(FLOAT_SIZE)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Same as `decode`, but also checks the number of features
pub fn decode_with_width(bytes: &[u8], width: usize) -> Result<FeatureVector> {
    let vector = decode(bytes)?;
    if vector.len() != width {
        return Err(Error::malformed(format!(
            "expected {width} features ({} bytes), got {} ({} bytes)",
            encoded_len(width),
            vector.len(),
            bytes.len()
        )));
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_length() {
        for n in [0, 1, 7, DEFAULT_VECTOR_WIDTH] {
            let v: Vec<f32> = (0..n).map(|i| i as f32 * 0.5).collect();
            assert_eq!(encode(&v).len(), 4 * n);
        }
        assert_eq!(encoded_len(DEFAULT_VECTOR_WIDTH), 488);
    }

    #[test]
    fn test_little_endian_layout() {
        let packet = encode(&[1.0, -2.0]);
        assert_eq!(
            packet.as_bytes(),
            &[0x00, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x00, 0xc0]
        );
    }

    #[test]
    fn test_round_trip_is_bit_exact() {
        let v = vec![
            0.0,
            -0.0,
            1.5,
            -3.25e-7,
            f32::MIN_POSITIVE / 2.0, // subnormal
            f32::MAX,
            f32::INFINITY,
            f32::NEG_INFINITY,
            14.999999,
        ];
        let decoded = decode(encode(&v).as_bytes()).unwrap();
        assert_eq!(decoded.len(), v.len());
        for (a, b) in v.iter().zip(decoded.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_nan_payload_preserved() {
        let nan = f32::from_bits(0x7fc0_1234);
        let decoded = decode(encode(&[nan]).as_bytes()).unwrap();
        assert_eq!(decoded[0].to_bits(), 0x7fc0_1234);
    }

    #[test]
    fn test_decode_malformed() {
        for len in [1, 3, 5, 489] {
            let buf = vec![0u8; len];
            assert!(matches!(decode(&buf), Err(Error::MalformedPacket(_))));
        }
        assert_eq!(decode(&[]).unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn test_decode_with_width() {
        let v = vec![1.0; 4];
        let packet = encode(&v);
        assert_eq!(decode_with_width(packet.as_bytes(), 4).unwrap(), v);
        assert!(matches!(
            decode_with_width(packet.as_bytes(), DEFAULT_VECTOR_WIDTH),
            Err(Error::MalformedPacket(_))
        ));
    }
}
