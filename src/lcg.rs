use wrapping_arithmetic::wrappit;

// This module contains the residue arithmetic behind the
// RANLUX++ LCG, which iterates x <- x * A mod m with m = 2**576 - 2**240 + 1.

/// Number of 64-bit limbs in a residue.
pub const LIMBS: usize = 9;

/// A 576-bit integer, least significant limb first.
/// Residues handled here always satisfy 0 <= x < m.
pub type Residue = [u64; LIMBS];

/// The modulus m = 2**576 - 2**240 + 1.
pub const MODULUS: Residue = [
    0x0000000000000001, 0x0000000000000000, 0x0000000000000000,
    0xffff000000000000, 0xffffffffffffffff, 0xffffffffffffffff,
    0xffffffffffffffff, 0xffffffffffffffff, 0xffffffffffffffff,
];

/// The multiplicative identity.
pub const ONE: Residue = [1, 0, 0, 0, 0, 0, 0, 0, 0];

// Double width product plus one spare limb that absorbs carries while folding.
const WIDE: usize = 2 * LIMBS + 1;

/// Add with carry. Returns (sum, carry).
#[wrappit] #[inline]
fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let t = (a as u128) + (b as u128) + (carry as u128);
    (t as u64, (t >> 64) as u64)
}

/// Subtract with borrow. Returns (difference, borrow).
#[wrappit] #[inline]
fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let t = (a as u128) - (b as u128) - (borrow as u128);
    (t as u64, (t >> 127) as u64)
}

/// Compares the low 9 limbs of x against the modulus.
#[inline]
fn below_modulus(x: &[u64]) -> bool {
    for k in (0 .. LIMBS).rev() {
        if x[k] != MODULUS[k] {
            return x[k] < MODULUS[k];
        }
    }
    false
}

/// Returns whether x is a fully reduced residue, that is, x < m.
pub fn is_reduced(x: &Residue) -> bool {
    below_modulus(x)
}

/// Subtracts m from the low 9 limbs in place. The caller guarantees the true value is in [m, 2m).
#[inline]
fn subtract_modulus(x: &mut [u64]) {
    let mut borrow = 0;
    for k in 0 .. LIMBS {
        let (d, b) = sbb(x[k], MODULUS[k], borrow);
        x[k] = d;
        borrow = b;
    }
}

/// Reduces a double width value modulo m.
/// Uses 2**576 = 2**240 - 1 (mod m) to fold the high limbs down
/// until they vanish, then finishes with at most one subtraction.
fn reduce(t: &mut [u64; WIDE]) {
    while t[LIMBS ..].iter().any(|&w| w != 0) {
        let mut hi = [0u64; WIDE - LIMBS];
        hi.copy_from_slice(&t[LIMBS ..]);
        t[LIMBS ..].fill(0);

        // hi * 2**240 is hi shifted by 3 limbs and 48 bits.
        let mut shifted = [0u64; WIDE];
        for (k, &h) in hi.iter().enumerate() {
            if k + 3 < WIDE { shifted[k + 3] |= h << 48; }
            if k + 4 < WIDE { shifted[k + 4] |= h >> 16; }
        }

        let mut carry = 0;
        for k in 0 .. WIDE {
            let (s, c) = adc(t[k], shifted[k], carry);
            t[k] = s;
            carry = c;
        }

        // lo + hi * 2**240 >= hi, so this never borrows out of the top limb.
        let mut borrow = 0;
        for k in 0 .. WIDE {
            let h = if k < hi.len() { hi[k] } else { 0 };
            let (d, b) = sbb(t[k], h, borrow);
            t[k] = d;
            borrow = b;
        }
    }
    // Now t < 2**576 < 2m.
    if !below_modulus(&t[.. LIMBS]) {
        subtract_modulus(&mut t[.. LIMBS]);
    }
}

/// Modular multiplication x <- x * a mod m.
/// Both operands must be reduced; the result is reduced.
pub fn mul_mod(x: &mut Residue, a: &Residue) {
    debug_assert!(is_reduced(x) && is_reduced(a));
    let mut t = [0u64; WIDE];
    for i in 0 .. LIMBS {
        let mut carry = 0u64;
        for j in 0 .. LIMBS {
            // Cannot overflow: (2**64 - 1)**2 + 2 * (2**64 - 1) = 2**128 - 1.
            let p = (x[i] as u128) * (a[j] as u128) + (t[i + j] as u128) + (carry as u128);
            t[i + j] = p as u64;
            carry = (p >> 64) as u64;
        }
        t[i + LIMBS] = carry;
    }
    reduce(&mut t);
    x.copy_from_slice(&t[.. LIMBS]);
}

/// Modular squaring x <- x * x mod m.
#[inline]
pub fn square_mod(x: &mut Residue) {
    let y = *x;
    mul_mod(x, &y);
}

/// Returns base**n mod m, computed by left-to-right binary exponentiation.
/// n = 0 returns one.
pub fn pow_mod(base: &Residue, n: u64) -> Residue {
    if n == 0 {
        return ONE;
    }
    let mut result = *base;
    let top = 63 - n.leading_zeros();
    for bit in (0 .. top).rev() {
        square_mod(&mut result);
        if (n >> bit) & 1 == 1 {
            mul_mod(&mut result, base);
        }
    }
    result
}

/// Modular addition of a small constant, x <- x + c mod m.
pub fn add_mod_small(x: &mut Residue, c: u64) {
    debug_assert!(is_reduced(x));
    let mut carry = c;
    for limb in x.iter_mut() {
        let (s, k) = adc(*limb, 0, carry);
        *limb = s;
        carry = k;
    }
    // x + c < m + 2**64 < 2m. A carry out of the top limb is absorbed by the final borrow.
    if carry != 0 || !below_modulus(x) {
        subtract_modulus(x);
    }
}

#[cfg(test)] mod tests {
    use super::*;

    const LCG_M128_1: u128 = 0xde92a69f6e2f9f25fd0d90f576075fbd;

    /// The RANLUX multiplier raised to the power 2048.
    const A_2048: Residue = [
        0xed7faa90747aaad9, 0x4cec2c78af55c101, 0xe64dcb31c48228ec,
        0x6d8a15a13bee7cb0, 0x20b2ca60cb78c509, 0x256c3d3c662ea36c,
        0xff74e54107684ed2, 0x492edfcc0cc8e753, 0xb48c187cf5b22097,
    ];

    fn minus_one() -> Residue {
        let mut x = MODULUS;
        x[0] -= 1;
        x
    }

    #[test] pub fn fold_constants() {
        // 2**576 = 2**240 - 1 (mod m).
        let two = [2, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(pow_mod(&two, 576), [u64::MAX, u64::MAX, u64::MAX, 0xffffffffffff, 0, 0, 0, 0, 0]);
        // (m - 1)**2 = 1 (mod m).
        let mut x = minus_one();
        square_mod(&mut x);
        assert_eq!(ONE, x);
        assert!(!is_reduced(&MODULUS));
        assert!(is_reduced(&minus_one()));
    }

    #[test] pub fn ranlux_power() {
        assert_eq!(A_2048, pow_mod(&crate::RANLUX_A, 2048));
        assert_eq!(crate::RANLUX_A, pow_mod(&crate::RANLUX_A, 1));
        assert_eq!(ONE, pow_mod(&crate::RANLUX_A, 0));
        assert_eq!(ONE, pow_mod(&[0; LIMBS], 0));
    }

    #[test] pub fn small_addition() {
        let mut x = minus_one();
        add_mod_small(&mut x, 1);
        assert_eq!([0; LIMBS], x);
        let mut x = minus_one();
        add_mod_small(&mut x, 13);
        assert_eq!([12, 0, 0, 0, 0, 0, 0, 0, 0], x);
        let mut x = [u64::MAX, 0, 0, 0, 0, 0, 0, 0, 0];
        add_mod_small(&mut x, 2);
        assert_eq!([1, 1, 0, 0, 0, 0, 0, 0, 0], x);
    }

    #[test] pub fn run_tests() {

        let mut r: u128 = 0;
        let mut rnd = || -> u64 { r = r.wrapping_mul(LCG_M128_1).wrapping_add(0xffff); (r >> 64) as u64 };

        for _ in 0 .. 1<<8 {
            let mut x = [0u64; LIMBS];
            let mut y = [0u64; LIMBS];
            let mut z = [0u64; LIMBS];
            for k in 0 .. LIMBS {
                x[k] = rnd();
                y[k] = rnd();
                z[k] = rnd();
            }
            // Keep the values below m.
            x[8] &= !(1 << 63);
            y[8] &= !(1 << 63);
            z[8] &= !(1 << 63);
            if rnd() & 3 == 0 { z = minus_one(); }

            let mut xy = x;
            mul_mod(&mut xy, &y);
            let mut yx = y;
            mul_mod(&mut yx, &x);
            assert_eq!(xy, yx);
            assert!(is_reduced(&xy));

            let mut xy_z = xy;
            mul_mod(&mut xy_z, &z);
            let mut yz = y;
            mul_mod(&mut yz, &z);
            let mut x_yz = x;
            mul_mod(&mut x_yz, &yz);
            assert_eq!(xy_z, x_yz);

            let mut x1 = x;
            mul_mod(&mut x1, &ONE);
            assert_eq!(x, x1);
            mul_mod(&mut x1, &[0; LIMBS]);
            assert_eq!([0; LIMBS], x1);

            // x * (m - 1) + x = 0 (mod m), checked as x * (m - 1) = m - x.
            let mut neg = x;
            mul_mod(&mut neg, &minus_one());
            let mut sum = neg;
            let mut carry = 0;
            for k in 0 .. LIMBS {
                let (s, c) = adc(sum[k], x[k], carry);
                sum[k] = s;
                carry = c;
            }
            assert_eq!(0, carry);
            assert!(sum == MODULUS || (x == [0; LIMBS] && sum == [0; LIMBS]));

            let i = rnd() >> 40;
            let j = rnd() >> 40;
            let mut xi_xj = pow_mod(&x, i);
            mul_mod(&mut xi_xj, &pow_mod(&x, j));
            assert_eq!(pow_mod(&x, i + j), xi_xj);
            assert_eq!(pow_mod(&pow_mod(&x, i), j), pow_mod(&x, i * j));
        }
    }
}
