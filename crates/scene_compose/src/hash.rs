//! Deterministic, allocation-free hashing used in place of a shared random generator.
//!
//! Every pseudo-random decision in a composition pass (member ordering, tie-break jitter,
//! post-fix choice) is derived from a key hashed through FNV-1a followed by a 32-bit
//! finalizer. Identical keys always produce identical values.

const FNV_OFFSET: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Streaming FNV-1a hasher with an fmix32 finalizer.
///
/// ```
/// use scene_compose::hash::KeyHasher;
///
/// let a = KeyHasher::new().str("jitter").u32(7).finish();
/// let b = KeyHasher::new().str("jitter").u32(7).finish();
/// assert_eq!(a, b);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct KeyHasher {
    state: u32,
}

impl KeyHasher {
    pub const fn new() -> Self {
        Self { state: FNV_OFFSET }
    }

    #[inline]
    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        for &b in bytes {
            self.state ^= b as u32;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
        self
    }

    #[inline]
    pub fn str(self, s: &str) -> Self {
        // Separator keeps ("ab", "c") and ("a", "bc") apart.
        self.bytes(s.as_bytes()).bytes(&[0xFF])
    }

    #[inline]
    pub fn u32(self, v: u32) -> Self {
        self.bytes(&v.to_le_bytes())
    }

    #[inline]
    pub fn usize(self, v: usize) -> Self {
        self.bytes(&(v as u64).to_le_bytes())
    }

    #[inline]
    pub fn finish(self) -> u32 {
        fmix32(self.state)
    }

    /// Finishes the hash and maps it to `[0, 1)`.
    #[inline]
    pub fn rand01(self) -> f32 {
        to_unit(self.finish())
    }

    /// Finishes the hash and maps it to an angle in `[0, TAU)`.
    #[inline]
    pub fn phase(self) -> f32 {
        self.rand01() * std::f32::consts::TAU
    }
}

impl Default for KeyHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a byte slice to a well-mixed `u32`.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u32 {
    KeyHasher::new().bytes(bytes).finish()
}

/// Uniform-looking value in `[0, 1)` for a `(tag, id, salt)` key.
#[inline]
pub fn rand01(tag: &str, id: u32, salt: u32) -> f32 {
    KeyHasher::new().str(tag).u32(id).u32(salt).rand01()
}

/// Angle in `[0, TAU)` for a `(tag, id, salt)` key.
#[inline]
pub fn phase(tag: &str, id: u32, salt: u32) -> f32 {
    KeyHasher::new().str(tag).u32(id).u32(salt).phase()
}

#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^ (h >> 16)
}

#[inline]
fn to_unit(h: u32) -> f32 {
    // 24 mantissa bits so the result never rounds up to 1.0.
    (h >> 8) as f32 / (1u32 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_value() {
        assert_eq!(rand01("tag", 3, 9), rand01("tag", 3, 9));
        assert_eq!(phase("p", 1, 0), phase("p", 1, 0));
        assert_eq!(hash_bytes(b"sun"), hash_bytes(b"sun"));
    }

    #[test]
    fn different_keys_diverge() {
        assert_ne!(rand01("tag", 3, 9), rand01("tag", 4, 9));
        assert_ne!(rand01("tag", 3, 9), rand01("tag", 3, 10));
        assert_ne!(
            KeyHasher::new().str("ab").str("c").finish(),
            KeyHasher::new().str("a").str("bc").finish()
        );
    }

    #[test]
    fn unit_values_stay_in_range() {
        for id in 0..2048 {
            let v = rand01("range", id, 17);
            assert!((0.0..1.0).contains(&v), "rand01 out of range: {v}");
            let p = phase("range", id, 17);
            assert!((0.0..std::f32::consts::TAU).contains(&p));
        }
        assert!(to_unit(u32::MAX) < 1.0);
        assert_eq!(to_unit(0), 0.0);
    }

    #[test]
    fn values_spread_across_unit_interval() {
        let mut buckets = [0usize; 4];
        for id in 0..4000 {
            let v = rand01("spread", id, 0);
            buckets[(v * 4.0) as usize] += 1;
        }
        for count in buckets {
            assert!(count > 800, "bucket underfilled: {buckets:?}");
        }
    }
}
