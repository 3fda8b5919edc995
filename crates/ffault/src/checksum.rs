//! Typed checksums for append handoff verification.

/// Checksum algorithm used for write handoff verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumKind {
    /// No checksum; verification is disabled.
    #[default]
    None,
    /// CRC32C (Castagnoli polynomial).
    Crc32c,
    /// 32-bit xxHash with seed 0.
    XxHash32,
}

/// Compute the checksum of `data` under `kind` as a little-endian fixed-32
/// digest. Returns an empty vector for [`ChecksumKind::None`].
pub fn typed_checksum(kind: ChecksumKind, data: &[u8]) -> Vec<u8> {
    match kind {
        ChecksumKind::None => Vec::new(),
        ChecksumKind::Crc32c => crc32c::crc32c(data).to_le_bytes().to_vec(),
        ChecksumKind::XxHash32 => xxhash_rust::xxh32::xxh32(data, 0).to_le_bytes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_empty() {
        assert!(typed_checksum(ChecksumKind::None, b"anything").is_empty());
    }

    #[test]
    fn crc32c_known_vector() {
        // Standard CRC32C check value for "123456789".
        assert_eq!(
            typed_checksum(ChecksumKind::Crc32c, b"123456789"),
            0xE306_9283_u32.to_le_bytes().to_vec()
        );
    }

    #[test]
    fn xxhash32_known_vector() {
        // XXH32 of the empty input with seed 0.
        assert_eq!(
            typed_checksum(ChecksumKind::XxHash32, b""),
            0x02CC_5D05_u32.to_le_bytes().to_vec()
        );
    }

    #[test]
    fn kinds_disagree_on_same_data() {
        let crc = typed_checksum(ChecksumKind::Crc32c, b"payload");
        let xxh = typed_checksum(ChecksumKind::XxHash32, b"payload");
        assert_eq!(crc.len(), 4);
        assert_eq!(xxh.len(), 4);
        assert_ne!(crc, xxh);
    }

    #[test]
    fn digest_is_deterministic() {
        for kind in [ChecksumKind::Crc32c, ChecksumKind::XxHash32] {
            assert_eq!(typed_checksum(kind, b"abc"), typed_checksum(kind, b"abc"));
            assert_ne!(typed_checksum(kind, b"abc"), typed_checksum(kind, b"abd"));
        }
    }
}
