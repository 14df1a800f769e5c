// Compression-based complexity estimates

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

/// Inputs smaller than this are too short for a meaningful ratio
pub const MIN_SIZE_THRESHOLD: usize = 512;

fn zlib_len(data: &[u8], level: u32) -> usize {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
    if encoder.write_all(data).is_err() {
        return data.len();
    }
    encoder.finish().map(|out| out.len()).unwrap_or(data.len())
}

/// compressed / original at zlib level 9.
///
/// 0.0 for inputs under 512 bytes, 1.0 when compression inflates.
pub fn compression_ratio(content: &[u8]) -> f64 {
    if content.len() < MIN_SIZE_THRESHOLD {
        return 0.0;
    }
    let compressed = zlib_len(content, 9);
    if compressed >= content.len() {
        return 1.0;
    }
    compressed as f64 / content.len() as f64
}

/// Normalized compression distance at zlib level 6.
///
/// NCD(a,b) = (C(ab) - min(C(a),C(b))) / max(C(a),C(b)), clamped to [0,1].
/// Near 0 means near-identical content. Either side empty gives 1.0.
pub fn ncd(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 1.0;
    }
    let ca = zlib_len(a, 6);
    let cb = zlib_len(b, 6);
    let mut joined = Vec::with_capacity(a.len() + b.len());
    joined.extend_from_slice(a);
    joined.extend_from_slice(b);
    let cab = zlib_len(&joined, 6);

    let lo = ca.min(cb) as f64;
    let hi = ca.max(cb) as f64;
    if hi == 0.0 {
        return 1.0;
    }
    ((cab as f64 - lo) / hi).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_input_is_zero() {
        assert_eq!(compression_ratio(b"fn main() {}"), 0.0);
    }

    #[test]
    fn test_repetitive_input_compresses_well() {
        let repetitive = "let x = 1;\n".repeat(200);
        let ratio = compression_ratio(repetitive.as_bytes());
        assert!(ratio > 0.0 && ratio < 0.1, "ratio was {}", ratio);
    }

    #[test]
    fn test_ncd_identical_vs_unrelated() {
        let a = "def handle(request):\n    return respond(request.body)\n".repeat(20);
        let b: String = (0..1200u32)
            .map(|i| char::from(b'a' + ((i * 7919 + i / 3) % 26) as u8))
            .collect();
        assert!(ncd(a.as_bytes(), a.as_bytes()) < 0.2);
        assert!(ncd(a.as_bytes(), b.as_bytes()) > 0.5);
        assert_eq!(ncd(b"", a.as_bytes()), 1.0);
    }
}
