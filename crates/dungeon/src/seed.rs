//! Seed derivation and share-code encoding.
//!
//! A single `primary` seed fans out into four independent streams
//! (`layout`, `rooms`, `connections`, `details`) via domain-separated
//! SplitMix64 mixing, so that each pass gets its own RNG stream derived
//! deterministically from one shareable number. All five values
//! (`primary` plus the four streams) live as 32-bit fields on
//! [`DungeonSeed`] so a share-code can carry them verbatim instead of
//! re-deriving them on decode — a seed built from independently-chosen
//! stream values round-trips through a share-code unchanged.

use crate::error::DungeonError;
use crate::prng::Rng;

const STREAM_LAYOUT: u64 = 0x4C41_594F_5554_0001; // "LAYOUT\x00\x01"-ish tag
const STREAM_ROOMS: u64 = 0x524F_4F4D_5300_0002;
const STREAM_CONNECTIONS: u64 = 0x434F_4E4E_4543_0003;
const STREAM_DETAILS: u64 = 0x4445_5441_494C_0004;

fn split_mix64_once(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

fn derive_stream_seed(primary: u32, domain_tag: u64) -> u32 {
    split_mix64_once((primary as u64) ^ domain_tag) as u32
}

fn parse_version(version: &str) -> (u8, u8, u8) {
    let mut parts = version.split('.');
    let major = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    (major, minor, patch)
}

fn format_version(major: u8, minor: u8, patch: u8) -> String {
    format!("{major}.{minor}.{patch}")
}

/// A generation run's full seed material: one primary value the caller
/// chose (or was assigned), the four derived per-pass streams, and the
/// generator version that produced them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DungeonSeed {
    pub primary: u32,
    pub layout: u32,
    pub rooms: u32,
    pub connections: u32,
    pub details: u32,
    pub version: String,
}

impl DungeonSeed {
    pub fn from_primary(primary: u32) -> Self {
        Self {
            primary,
            layout: derive_stream_seed(primary, STREAM_LAYOUT),
            rooms: derive_stream_seed(primary, STREAM_ROOMS),
            connections: derive_stream_seed(primary, STREAM_CONNECTIONS),
            details: derive_stream_seed(primary, STREAM_DETAILS),
            version: "1.0.0".to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn layout_rng(&self) -> Rng {
        Rng::new(self.layout as u64)
    }

    pub fn rooms_rng(&self) -> Rng {
        Rng::new(self.rooms as u64)
    }

    pub fn connections_rng(&self) -> Rng {
        Rng::new(self.connections as u64)
    }

    pub fn details_rng(&self) -> Rng {
        Rng::new(self.details as u64)
    }

    /// Encode as a share-code: base64url of
    /// `[primary, layout, rooms, connections, details]` (u32, LSB-first)
    /// followed by the version triple (one byte each for major/minor/patch),
    /// a `timestamp` (u64, LSB-first), and a trailing crc32 over everything
    /// before it. Every stream value is carried verbatim — decoding never
    /// re-derives them from `primary`.
    pub fn to_share_code(&self, timestamp: u64) -> String {
        let (major, minor, patch) = parse_version(&self.version);

        let mut payload = Vec::with_capacity(31);
        payload.extend_from_slice(&self.primary.to_le_bytes());
        payload.extend_from_slice(&self.layout.to_le_bytes());
        payload.extend_from_slice(&self.rooms.to_le_bytes());
        payload.extend_from_slice(&self.connections.to_le_bytes());
        payload.extend_from_slice(&self.details.to_le_bytes());
        payload.push(major);
        payload.push(minor);
        payload.push(patch);
        payload.extend_from_slice(&timestamp.to_le_bytes());

        let crc = crc32fast::hash(&payload);
        payload.extend_from_slice(&crc.to_le_bytes());

        base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, payload)
    }

    /// Decode a share-code produced by [`DungeonSeed::to_share_code`],
    /// verifying the embedded checksum before trusting the payload.
    pub fn from_share_code(code: &str) -> Result<(Self, u64), DungeonError> {
        let bytes = base64::Engine::decode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, code)
            .map_err(|_| DungeonError::SeedDecodeFailed)?;
        if bytes.len() != 35 {
            return Err(DungeonError::SeedDecodeFailed);
        }

        let (payload, crc_bytes) = bytes.split_at(31);
        let expected_crc = u32::from_le_bytes(crc_bytes.try_into().unwrap());
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(DungeonError::SeedDecodeFailed);
        }

        let primary = u32::from_le_bytes(payload[0..4].try_into().unwrap());
        let layout = u32::from_le_bytes(payload[4..8].try_into().unwrap());
        let rooms = u32::from_le_bytes(payload[8..12].try_into().unwrap());
        let connections = u32::from_le_bytes(payload[12..16].try_into().unwrap());
        let details = u32::from_le_bytes(payload[16..20].try_into().unwrap());
        let (major, minor, patch) = (payload[20], payload[21], payload[22]);
        let timestamp = u64::from_le_bytes(payload[23..31].try_into().unwrap());

        let seed = Self {
            primary,
            layout,
            rooms,
            connections,
            details,
            version: format_version(major, minor, patch),
        };
        Ok((seed, timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_streams_are_pairwise_distinct() {
        let seed = DungeonSeed::from_primary(12345);
        let streams = [seed.primary, seed.layout, seed.rooms, seed.connections, seed.details];
        for i in 0..streams.len() {
            for j in (i + 1)..streams.len() {
                assert_ne!(streams[i], streams[j]);
            }
        }
    }

    #[test]
    fn same_primary_derives_same_streams() {
        let a = DungeonSeed::from_primary(777);
        let b = DungeonSeed::from_primary(777);
        assert_eq!(a, b);
    }

    #[test]
    fn share_code_round_trips() {
        let seed = DungeonSeed::from_primary(999_888_777);
        let code = seed.to_share_code(1_700_000_000);
        let (decoded, timestamp) = DungeonSeed::from_share_code(&code).unwrap();
        assert_eq!(decoded, seed);
        assert_eq!(timestamp, 1_700_000_000);
    }

    #[test]
    fn share_code_round_trips_independent_streams() {
        let seed = DungeonSeed {
            primary: 1,
            layout: 11,
            rooms: 13,
            connections: 17,
            details: 19,
            version: "1.0.0".to_string(),
        };
        let code = seed.to_share_code(42);
        let (decoded, timestamp) = DungeonSeed::from_share_code(&code).unwrap();
        assert_eq!(decoded, seed);
        assert_eq!(timestamp, 42);
    }

    #[test]
    fn corrupted_share_code_is_rejected() {
        let seed = DungeonSeed::from_primary(42);
        let mut code = seed.to_share_code(0);
        code.replace_range(0..1, if code.starts_with('A') { "B" } else { "A" });
        assert!(matches!(
            DungeonSeed::from_share_code(&code),
            Err(DungeonError::SeedDecodeFailed)
        ));
    }

    #[test]
    fn garbage_input_is_rejected_not_panicking() {
        assert!(DungeonSeed::from_share_code("not valid base64url!!!").is_err());
        assert!(DungeonSeed::from_share_code("").is_err());
    }
}
