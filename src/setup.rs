//! The trusted-setup boundary of the protocol.
//!
//! The trusted setup delivers the validated [`RoundParameters`] (sourced from
//! a precomputed domain parameter table, out of scope here), issues
//! collision-free client identifiers through [`ActiveIdSet`], deals the share
//! points of each client's round secrets to its neighbors and, optionally,
//! generates [`PedersenParameters`] for verifiable aggregation.
//!
//! [`RoundParameters`]: crate::common::RoundParameters
//! [`ActiveIdSet`]: crate::common::ActiveIdSet

use num::{
    bigint::BigUint,
    traits::identities::{One, Zero},
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    crypto::{generate_integer, is_probable_prime, modpow},
    sharing::{Polynomial, SharePoint, SharingError},
};

/// Deals the share points of one round secret.
///
/// Builds a share polynomial of degree `order` whose constant term is the
/// secret and evaluates it at `num_points` distinct sample positions. The
/// points are handed to the client's neighbors during setup; any `order + 1`
/// of them recover the secret, fewer reveal nothing.
///
/// # Errors
/// Fails if `coeff_limit` is zero or `num_points < order + 1`.
pub fn deal_secret<R: RngCore>(
    secret: &BigUint,
    order: usize,
    coeff_limit: u64,
    num_points: usize,
    prng: &mut R,
) -> Result<Vec<SharePoint>, SharingError> {
    Polynomial::with_secret(secret, order, coeff_limit, prng)?.sample_points(num_points, prng)
}

/// Generates a prime of the given bit length.
///
/// Draws odd candidates with the most significant bit forced until one
/// passes the Miller-Rabin test. `bits` must be at least 2.
pub fn generate_prime<R: RngCore>(prng: &mut R, bits: u64) -> BigUint {
    debug_assert!(bits >= 2);
    loop {
        // force the MSB so the bit length is exact, and the LSB so the
        // candidate is odd
        let candidate = generate_integer(prng, &(BigUint::one() << bits))
            | (BigUint::one() << (bits - 1))
            | BigUint::one();
        if is_probable_prime(&candidate) {
            return candidate;
        }
    }
}

/// Finds the smallest primitive root modulo the prime `p`.
///
/// Factors `p - 1` by trial division, so this is intended for the moderate
/// bit lengths of commitment parameters, not for the round modulus.
///
/// Returns `None` if `p` is not prime.
pub fn find_primitive_root(p: &BigUint) -> Option<BigUint> {
    let one = BigUint::one();
    let two = &one + &one;
    if *p == two {
        return Some(one);
    }
    if !is_probable_prime(p) {
        return None;
    }
    let phi = p - &one;
    let factors = prime_factors(phi.clone());
    let mut candidate = two;
    while candidate < *p {
        if factors
            .iter()
            .all(|factor| !modpow(&candidate, &(&phi / factor), p).is_one())
        {
            return Some(candidate);
        }
        candidate += &one;
    }
    None
}

/// The distinct prime factors of `n`, by trial division.
fn prime_factors(mut n: BigUint) -> Vec<BigUint> {
    let mut factors = Vec::new();
    let mut divisor = BigUint::from(2_u8);
    while &divisor * &divisor <= n {
        if (&n % &divisor).is_zero() {
            factors.push(divisor.clone());
            while (&n % &divisor).is_zero() {
                n /= &divisor;
            }
        }
        divisor += BigUint::one();
    }
    if n > BigUint::one() {
        factors.push(n);
    }
    factors
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Parameters for Pedersen commitments over the aggregate.
///
/// A commitment to `value` with blinding exponent `r` is
/// `(h^value * k^r) mod p`. Distributed by the trusted setup alongside the
/// round parameters when verifiable aggregation is requested.
pub struct PedersenParameters {
    /// The commitment modulus, a prime.
    p: BigUint,
    /// A primitive root modulo `p`.
    h: BigUint,
    /// The blinding base, drawn from `[1, 2^10)`.
    k: BigUint,
}

impl PedersenParameters {
    /// Generates fresh commitment parameters with a prime modulus of the
    /// given bit length.
    pub fn generate<R: RngCore>(prng: &mut R, bits: u64) -> Self {
        let p = generate_prime(prng, bits);
        // PANIC_SAFE: p is prime, so a primitive root exists
        let h = find_primitive_root(&p).unwrap();
        let k = generate_integer(prng, &((BigUint::one() << 10) - BigUint::one())) + BigUint::one();
        Self { p, h, k }
    }

    /// Creates commitment parameters from known values.
    pub fn from_parts(p: BigUint, h: BigUint, k: BigUint) -> Self {
        Self { p, h, k }
    }

    /// Commits to `value` with the blinding exponent `blinding`.
    pub fn commit(&self, value: &BigUint, blinding: &BigUint) -> BigUint {
        (modpow(&self.h, value, &self.p) * modpow(&self.k, blinding, &self.p)) % &self.p
    }

    /// Gets the commitment modulus.
    pub fn modulus(&self) -> &BigUint {
        &self.p
    }

    /// Gets the primitive root.
    pub fn root(&self) -> &BigUint {
        &self.h
    }

    /// Gets the blinding base.
    pub fn blinding_base(&self) -> &BigUint {
        &self.k
    }
}
