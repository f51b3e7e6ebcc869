//! Derived numeric device identity.
//!
//! Readings carry a numeric `device_id` alongside the string point id for
//! display and legacy compatibility. The id is a pure function of the point
//! id: FNV-1a (64-bit) reduced into 18 decimal digits. The constants and the
//! reduction are frozen; changing either would silently re-key every
//! historical reading. Collisions are tolerated because nothing routes or
//! authorizes on this value.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Upper bound (exclusive) of the identity range: 10^18.
pub const DEVICE_ID_RANGE: u64 = 1_000_000_000_000_000_000;

/// Maps a point id to its stable numeric device identity.
pub fn device_identity(point_id: &str) -> i64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in point_id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    // 10^18 < i64::MAX, so the cast never wraps.
    (hash % DEVICE_ID_RANGE) as i64
}
