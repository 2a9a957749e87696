use std::fmt;
use std::num::Wrapping;
use std::str::FromStr;
use std::sync::Arc;

// Linear congruential generator parameters
const MUL: u64 = 6364136223846793005; // Knuth section 3.3.4 (p.108)
const INC: u64 = 1442695040888963407;

#[derive(Clone, PartialEq)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Seeds the generator from an arbitrary byte string. The empty string is
    /// a valid seed and is what the default configuration uses.
    pub fn from_seed(seed: &[u8]) -> Rng {
        let lower = murmur2(seed, 1690382925).swap_bytes();
        let upper = murmur2(seed, 72970470).swap_bytes();
        let state = u64::from(lower) | (u64::from(upper) << 32);
        Rng { state }
    }

    /// Picks a random value uniformly distributed between `0.0` (inclusive) and `1.0` (exclusive).
    pub fn rnd(&mut self) -> f64 {
        let old_state = self.state;
        // Advance internal state.
        self.state = old_state.wrapping_mul(MUL).wrapping_add(INC);
        // Calculate output function (XSH RR) using the old state.
        // This is a PCG-XSH-RR generator (O'Neill 2014, section 6.3.1), with 3
        // bits dropped during the xorshift.
        let xorshifted = ((((old_state >> 18) & !(3 << 30)) ^ old_state) >> 27) as u32;
        let fac = xorshifted.rotate_right((old_state >> 59) as u32);
        2.0f64.powi(-32) * f64::from(fac)
    }

    /// Draws a biased sample in `[0, 1]` from a parametric distribution:
    /// averages `n` uniform deviates (so larger `n` concentrates the result
    /// around `0.5`; `n == 1` is uniform), then applies `bias`.
    ///
    /// A sample count of zero is coerced to one rather than dividing by zero.
    pub fn parametric(&mut self, n: u32, bias: &Bias) -> f64 {
        let n = n.max(1);
        let mut sum = 0.0;
        for _ in 0..n {
            sum += self.rnd();
        }
        bias.apply(sum / f64::from(n))
    }
}

/// Skew applied to a parametric sample's average.
///
/// The numeric form raises the average to the power `1.2^bias`, pulling
/// results toward 0 for positive bias and toward 1 for negative bias. The
/// callable form replaces the exponentiation step entirely.
#[derive(Clone)]
pub enum Bias {
    Exponent(f64),
    Custom(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl Bias {
    pub fn apply(&self, average: f64) -> f64 {
        match self {
            Bias::Exponent(bias) => average.powf(1.2f64.powf(*bias)),
            Bias::Custom(f) => f(average),
        }
    }
}

impl Default for Bias {
    fn default() -> Self {
        Bias::Exponent(0.0)
    }
}

impl From<f64> for Bias {
    fn from(bias: f64) -> Self {
        Bias::Exponent(bias)
    }
}

impl fmt::Debug for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::Exponent(b) => f.debug_tuple("Exponent").field(b).finish(),
            Bias::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Shape of the noise distribution, expressed as the number of uniform
/// deviates averaged per sample.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Distribution {
    Uniform,
    Triangular,
    Bell,
    Samples(u32),
}

impl Distribution {
    pub fn samples(self) -> u32 {
        match self {
            Distribution::Uniform => 1,
            Distribution::Triangular => 2,
            Distribution::Bell => 5,
            // Zero samples would be a division by zero downstream.
            Distribution::Samples(n) => n.max(1),
        }
    }
}

impl Default for Distribution {
    fn default() -> Self {
        Distribution::Bell
    }
}

impl From<u32> for Distribution {
    fn from(n: u32) -> Self {
        Distribution::Samples(n)
    }
}

impl FromStr for Distribution {
    type Err = std::convert::Infallible;

    /// Parses a named preset. Numeric strings are coerced via
    /// absolute-integer parsing; anything else falls back to `Bell`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "uniform" => Distribution::Uniform,
            "triangular" => Distribution::Triangular,
            "bell" => Distribution::Bell,
            other => match other.parse::<i64>() {
                Ok(n) => Distribution::Samples(n.unsigned_abs().min(u64::from(u32::MAX)) as u32),
                Err(_) => Distribution::Bell,
            },
        })
    }
}

fn murmur2(bytes: &[u8], seed: u32) -> u32 {
    const K: usize = 16;
    const MASK: Wrapping<u32> = Wrapping(0xffff);
    const MASK_BYTE: Wrapping<u32> = Wrapping(0xff);
    const M: Wrapping<u32> = Wrapping(0x5bd1e995);

    let mut l: usize = bytes.len();
    let mut h = Wrapping(seed ^ (l as u32));
    let mut i = 0;

    let byte32 = |i: usize| Wrapping(u32::from(bytes[i]));

    while l >= 4 {
        let mut k = (byte32(i) & MASK_BYTE)
            | ((byte32(i + 1) & MASK_BYTE) << 8)
            | ((byte32(i + 2) & MASK_BYTE) << 16)
            | ((byte32(i + 3) & MASK_BYTE) << 24);
        i += 4;
        k = (k & MASK) * M + ((((k >> K) * M) & MASK) << K);
        k ^= k >> 24;
        k = (k & MASK) * M + ((((k >> K) * M) & MASK) << K);
        h = ((h & MASK) * M + ((((h >> K) * M) & MASK) << K)) ^ k;
        l -= 4;
    }
    if l >= 3 {
        h ^= (byte32(i + 2) & MASK_BYTE) << K;
    }
    if l >= 2 {
        h ^= (byte32(i + 1) & MASK_BYTE) << 8;
    }
    if l >= 1 {
        h ^= byte32(i) & MASK_BYTE;
        h = (h & MASK) * M + ((((h >> K) * M) & MASK) << K);
    }

    h ^= h >> 13;
    h = (h & MASK) * M + ((((h >> K) * M) & MASK) << K);
    h ^= h >> 15;

    h.0
}
