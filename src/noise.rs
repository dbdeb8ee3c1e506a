//! Deterministic noise for per-character effects.
//!
//! - [`noise`] is a pure integer hash of `(index, seed)` mapped to `[0, 1)`.
//! - [`sub_seed`] derives an independent seed per [`NoiseChannel`] so effects
//!   never share a random stream.
//! - [`XorShift64`] produces the base seeds re-rolled on every glitch cycle.

/// Pseudo-random scalar in `[0, 1)` from an index and a seed.
///
/// Pure function: identical inputs always yield identical output, so a
/// character queried twice in one frame never flickers.
#[inline]
pub fn noise(index: u32, seed: u32) -> f32 {
    let mut n = index
        .wrapping_mul(374_761_393)
        .wrapping_add(seed.wrapping_mul(668_265_263));
    n = (n ^ (n >> 13)).wrapping_mul(1_274_126_177);
    // 24 bits fit the f32 mantissa exactly, so the result stays below 1.0.
    ((n ^ (n >> 16)) & 0x00FF_FFFF) as f32 / 16_777_216.0
}

/// Independent random streams consumed by the glitch effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoiseChannel {
    SliceZone,
    SliceDirection,
    BlockX,
    BlockY,
    JitterX,
    JitterY,
    JitterModulation,
    Duplicate,
    DuplicateX,
    DuplicateY,
    Corruption,
}

impl NoiseChannel {
    fn tag(self) -> u32 {
        match self {
            Self::SliceZone => 1,
            Self::SliceDirection => 2,
            Self::BlockX => 3,
            Self::BlockY => 4,
            Self::JitterX => 5,
            Self::JitterY => 6,
            Self::JitterModulation => 7,
            Self::Duplicate => 8,
            Self::DuplicateX => 9,
            Self::DuplicateY => 10,
            Self::Corruption => 11,
        }
    }
}

/// Seed for one effect channel, derived by hashing the channel tag into the
/// cycle's base seed (murmur3 finalizer).
#[inline]
pub fn sub_seed(channel: NoiseChannel, base: u32) -> u32 {
    let mut h = base ^ channel.tag().wrapping_mul(0x9E37_79B9);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^= h >> 16;
    h
}

/// Noise draw on a specific channel.
#[inline]
pub fn channel_noise(channel: NoiseChannel, index: u32, base_seed: u32) -> f32 {
    noise(index, sub_seed(channel, base_seed))
}

/// Tiny deterministic PRNG (xorshift64*).
#[derive(Debug, Clone, Copy)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// `seed = 0` is remapped to a non-zero internal state so the generator
    /// cannot lock into an all-zero sequence.
    pub const fn from_seed(seed: u64) -> Self {
        let mixed = seed ^ 0x9E37_79B9_7F4A_7C15;
        let state = if mixed == 0 {
            0xA076_1D64_78BD_642F
        } else {
            mixed
        };
        Self { state }
    }

    #[inline(always)]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    #[inline(always)]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }
}
