use crate::lcg::{self, Residue, LIMBS, ONE};
use crate::{DEFAULT_SKIP, PRIMITIVE_OFFSET, PRIMITIVE_POWER, RANLUX_A};
#[cfg(feature = "serde")] use serde::{Deserialize, Serialize};

// RANLUX++ features
// -576-bit LCG state, equivalent to the RANLUX subtract-with-borrow generator
// -configurable decimation: each draw advances the recurrence by a**p
// -each state yields 24 single precision or 11 double precision numbers
// -seeds select starting points at least 2**96 draws apart
// -jump ahead in O(log n) multiplications
// -full period m - 1 available with a primitive multiplier

/// Number of single precision numbers extracted from one state.
pub const FLOAT_BATCH: usize = 24;

/// Number of double precision numbers extracted from one state.
pub const DOUBLE_BATCH: usize = 11;

/// RANLUX++ RNG for simulation. Not suitable for cryptography.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, PartialEq)]
pub struct Ranluxpp {
    /// LCG state.
    x: Residue,
    /// LCG multiplier, the base multiplier raised to the skip exponent.
    a: Residue,
    /// Single precision numbers from the latest state.
    floats: [f32; FLOAT_BATCH],
    /// Double precision numbers from the latest state.
    doubles: [f64; DOUBLE_BATCH],
    /// Limbs of the latest state.
    words: [u64; LIMBS],
    /// Number of floats consumed.
    fpos: usize,
    /// Number of doubles consumed.
    dpos: usize,
    /// Number of words consumed.
    wpos: usize,
}

// As recommended, this Debug implementation does not expose internal state.
impl core::fmt::Debug for Ranluxpp {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Ranluxpp {{}}")
    }
}

/// Reads up to 64 bits of the state starting from the given bit offset.
#[inline] fn field(x: &Residue, offset: usize, mask: u64) -> u64 {
    let limb = offset >> 6;
    let shift = offset & 63;
    let mut bits = x[limb] >> shift;
    if shift != 0 && limb + 1 < LIMBS {
        bits |= x[limb + 1] << (64 - shift);
    }
    bits & mask
}

/// Unpacks the state into 24-bit fields, ascending in significance,
/// and scales them into single precision numbers in [0, 1).
#[inline] fn unpack_floats(x: &Residue, out: &mut [f32]) {
    const SCALE: f32 = 1.0 / 16777216.0;
    debug_assert_eq!(out.len(), FLOAT_BATCH);
    for (j, f) in out.iter_mut().enumerate() {
        // 24-bit integers convert exactly.
        *f = SCALE * field(x, 24 * j, 0xffffff) as f32;
    }
}

/// Unpacks the state into 52-bit fields, ascending in significance.
/// The top 4 bits are unused. Each field becomes the mantissa of a number in [1, 2),
/// which is then shifted down to [0, 1). All 52 mantissa bits are random.
#[inline] fn unpack_doubles(x: &Residue, out: &mut [f64]) {
    const EXPONENT: u64 = 0x3ff0000000000000;
    const MANTISSA: u64 = 0x000fffffffffffff;
    debug_assert_eq!(out.len(), DOUBLE_BATCH);
    for (j, d) in out.iter_mut().enumerate() {
        *d = f64::from_bits(EXPONENT | field(x, 52 * j, MANTISSA)) - 1.0;
    }
}

/// Serves a read request from the buffered batch first, then from fresh batches.
/// The concatenated output does not depend on how reads are split.
fn read_batched<T: Copy, const B: usize>(
    dest: &mut [T],
    buffer: &mut [T; B],
    pos: &mut usize,
    mut refill: impl FnMut(&mut [T]),
) {
    let rest = (B - *pos).min(dest.len());
    let (head, tail) = dest.split_at_mut(rest);
    head.copy_from_slice(&buffer[*pos .. *pos + rest]);
    *pos += rest;

    // Whole batches go straight into the destination.
    let mut chunks = tail.chunks_exact_mut(B);
    for chunk in &mut chunks {
        refill(chunk);
    }

    let remainder = chunks.into_remainder();
    if !remainder.is_empty() {
        refill(&mut buffer[..]);
        let n = remainder.len();
        remainder.copy_from_slice(&buffer[.. n]);
        *pos = n;
    }
}

impl Ranluxpp {

    /// Creates a new RANLUX++ RNG.
    /// Each draw advances the underlying RANLUX recurrence by `skip` steps.
    /// Distinct seeds start at least 2**96 draws apart.
    pub fn new(seed: u64, skip: u64) -> Self {
        let mut rnd = Ranluxpp {
            x: ONE,
            a: lcg::pow_mod(&RANLUX_A, skip),
            floats: [0.0; FLOAT_BATCH],
            doubles: [0.0; DOUBLE_BATCH],
            words: [0; LIMBS],
            fpos: FLOAT_BATCH,
            dpos: DOUBLE_BATCH,
            wpos: LIMBS,
        };
        rnd.set_seed(seed);
        rnd
    }

    /// Creates a new RANLUX++ RNG with the default skip exponent.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(seed, DEFAULT_SKIP)
    }

    /// Reseeds with the current multiplier. Buffered numbers are discarded.
    pub fn set_seed(&mut self, seed: u64) {
        // Skip 2**96 * seed draws from the origin.
        let mut a = self.a;
        a = lcg::pow_mod(&a, 1 << 48);
        a = lcg::pow_mod(&a, 1 << 48);
        a = lcg::pow_mod(&a, seed);
        self.x = ONE;
        lcg::mul_mod(&mut self.x, &a);
        self.invalidate();
    }

    /// Marks all buffered numbers as consumed.
    #[inline] fn invalidate(&mut self) {
        self.fpos = FLOAT_BATCH;
        self.dpos = DOUBLE_BATCH;
        self.wpos = LIMBS;
    }

    /// Advances to the next state. Buffered numbers are not touched.
    #[inline]
    pub fn step(&mut self) {
        lcg::mul_mod(&mut self.x, &self.a);
    }

    /// Fills `dest` with single precision numbers in [0, 1).
    pub fn read_floats(&mut self, dest: &mut [f32]) {
        let Ranluxpp { x, a, floats, fpos, .. } = self;
        read_batched(dest, floats, fpos, |out| {
            lcg::mul_mod(x, a);
            unpack_floats(x, out);
        });
    }

    /// Fills `dest` with double precision numbers in [0, 1).
    pub fn read_doubles(&mut self, dest: &mut [f64]) {
        let Ranluxpp { x, a, doubles, dpos, .. } = self;
        read_batched(dest, doubles, dpos, |out| {
            lcg::mul_mod(x, a);
            unpack_doubles(x, out);
        });
    }

    /// Generates the next single precision number in [0, 1).
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        if self.fpos >= FLOAT_BATCH {
            self.step();
            unpack_floats(&self.x, &mut self.floats);
            self.fpos = 0;
        }
        self.fpos += 1;
        self.floats[self.fpos - 1]
    }

    /// Generates the next double precision number in [0, 1).
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        if self.dpos >= DOUBLE_BATCH {
            self.step();
            unpack_doubles(&self.x, &mut self.doubles);
            self.dpos = 0;
        }
        self.dpos += 1;
        self.doubles[self.dpos - 1]
    }

    /// Generates the next 64-bit random number, one limb of the state at a time.
    #[inline]
    pub fn next(&mut self) -> u64 {
        if self.wpos >= LIMBS {
            self.step();
            self.words = self.x;
            self.wpos = 0;
        }
        self.wpos += 1;
        self.words[self.wpos - 1]
    }

    /// Jumps forward by `steps` steps of the base RANLUX recurrence,
    /// which equals `steps` draws when the skip exponent is 1.
    /// Buffered numbers belong to the old position and are discarded.
    pub fn jump(&mut self, steps: u64) {
        lcg::mul_mod(&mut self.x, &lcg::pow_mod(&RANLUX_A, steps));
        self.invalidate();
    }

    /// Sets the skip exponent for future draws. Position is not changed.
    pub fn set_skip(&mut self, skip: u64) {
        self.a = lcg::pow_mod(&RANLUX_A, skip);
    }

    /// Switches to the primitive multiplier a**2048 + 13,
    /// which gives the full period m - 1. Position is not changed.
    pub fn select_primitive_multiplier(&mut self) {
        self.a = lcg::pow_mod(&RANLUX_A, PRIMITIVE_POWER);
        lcg::add_mod_small(&mut self.a, PRIMITIVE_OFFSET);
    }
}

use super::{RngCore, Error, SeedableRng};

impl RngCore for Ranluxpp {
    fn next_u32(&mut self) -> u32 {
        self.next() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let bytes = dest.len();
        let mut i = 0;
        while i < bytes {
            let x = self.next();
            let j = bytes.min(i + 8);
            // Always use Little-Endian.
            dest[i .. j].copy_from_slice(&x.to_le_bytes()[0 .. (j - i)]);
            i = j;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Ranluxpp {
    type Seed = [u8; 8];

    /// Creates a new RANLUX++ RNG from a seed with the default skip exponent.
    fn from_seed(seed: Self::Seed) -> Self {
        // Always use Little-Endian.
        Ranluxpp::with_seed(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Ranluxpp::with_seed(state)
    }
}
