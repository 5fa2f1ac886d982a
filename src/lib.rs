#![no_std]

pub mod lcg;
pub mod ranluxpp;

pub use lcg::{Residue, LIMBS, MODULUS};
pub use ranluxpp::*;
pub use rand_core::*;

// RANLUX++ by Alexei Sibidanov, A revision of the subtract-with-borrow
// random number generators, Computer Physics Communications 221 (2017).
// The RANLUX subtract-with-borrow recurrence with base 2**24 and lags (24, 10)
// is equivalent to an LCG with modulus m = 2**576 - 2**240 + 1.

/// LCG multiplier equivalent to one step of the RANLUX subtract-with-borrow generator.
pub const RANLUX_A: Residue = [
    0x0000000000000001, 0x0000000000000000, 0x0000000000000000,
    0xffff000001000000, 0xffffffffffffffff, 0xffffffffffffffff,
    0xffffffffffffffff, 0xffffffffffffffff, 0xfffffeffffffffff,
];

/// Default skip exponent: each draw advances the underlying recurrence by 2048 steps,
/// which is well beyond the highest RANLUX luxury level (p = 389).
pub const DEFAULT_SKIP: u64 = 2048;

/// The multiplier a**PRIMITIVE_POWER + PRIMITIVE_OFFSET is a primitive element modulo m.
pub const PRIMITIVE_POWER: u64 = 2048;
pub const PRIMITIVE_OFFSET: u64 = 13;
