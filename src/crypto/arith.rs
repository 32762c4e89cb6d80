//! Modular arithmetic over arbitrary-precision integers.
//!
//! See the [crypto module] documentation since this is a private module anyways.
//!
//! [crypto module]: crate::crypto

use num::{
    bigint::BigUint,
    traits::identities::{One, Zero},
    Integer,
};

/// Computes `base^exponent mod modulus` by repeated squaring.
///
/// Takes O(log `exponent`) multiplications, each reduced modulo `modulus` to
/// bound intermediate magnitude. All values are exact integers of arbitrary
/// bit length; the modulus may be a several-hundred-digit prime.
///
/// Edge cases follow the mathematical definition: `exponent == 0` yields
/// `1 mod modulus`, and a modulus of one yields zero (hence `0^0 mod 1 == 0`).
///
/// # Panics
/// Panics if `modulus` is zero.
pub fn modpow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    if modulus.is_one() {
        return BigUint::zero();
    }
    let mut result = BigUint::one();
    let mut base = base % modulus;
    let mut exponent = exponent.clone();
    while !exponent.is_zero() {
        if exponent.is_odd() {
            result = (result * &base) % modulus;
        }
        base = (&base * &base) % modulus;
        exponent >>= 1;
    }
    result
}

/// The Miller-Rabin witnesses used by [`is_probable_prime`].
///
/// Fixed small-prime bases keep the test deterministic for a given input.
const WITNESSES: [u8; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Tests `n` for primality with the Miller-Rabin test over fixed witnesses.
///
/// A `false` return is definitive; a `true` return means `n` is prime except
/// for a negligible error probability at the bit lengths used by the
/// protocol's domain parameters.
pub fn is_probable_prime(n: &BigUint) -> bool {
    let one = BigUint::one();
    let two = &one + &one;
    if *n < two {
        return false;
    }
    if n.is_even() {
        return *n == two;
    }
    // write n - 1 as d * 2^s with d odd
    let n_minus_one = n - &one;
    // UNWRAP_SAFE: n >= 3 here, so n - 1 is non-zero
    let s = n_minus_one.trailing_zeros().unwrap();
    let d = &n_minus_one >> s;

    'witness: for base in WITNESSES.iter() {
        let base = BigUint::from(*base);
        if &base % n == BigUint::zero() {
            continue;
        }
        let mut x = modpow(&base, &d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
