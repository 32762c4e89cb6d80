//! Round parameters and client identities.
//!
//! A round is one execution of the aggregation protocol with fresh parameters
//! and secrets. The [`RoundParameters`] are distributed by the trusted setup,
//! shared read-only by all parties and immutable for the round. Client
//! identifiers are issued through an explicit [`ActiveIdSet`] so that no two
//! concurrently active clients can collide within a round.

use std::collections::HashSet;

use derive_more::{Display, From, Into};
use num::{
    bigint::BigUint,
    traits::identities::One,
    Integer,
};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{is_probable_prime, modpow};

/// The number of bits of the client identifier space.
///
/// Identifiers are drawn from `[0, 2^ID_BITS)`, matching the secret width
/// used elsewhere in the round.
pub const ID_BITS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
/// Errors related to malformed round parameters.
///
/// Malformed parameters are rejected at construction time, never silently
/// tolerated.
pub enum ParameterError {
    #[error("the modulus is not prime")]
    CompositeModulus,

    #[error("the generator lies outside the multiplicative group of the modulus")]
    GeneratorOutOfRange,

    #[error("the generator is a quadratic residue and cannot generate the full group")]
    GeneratorResidue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The Diffie-Hellman domain parameters of one round.
///
/// Sourced externally by the trusted setup (typically from a precomputed
/// table of safe parameters) and handed to every client and the aggregator.
/// No party may mutate them mid-round.
pub struct RoundParameters {
    /// The prime modulus of the round.
    q: BigUint,
    /// The generator of the multiplicative group modulo `q`.
    g: BigUint,
    /// The round index.
    round: u64,
}

impl RoundParameters {
    /// Creates validated round parameters.
    ///
    /// # Errors
    /// Fails in one of the following cases:
    /// - The modulus `q` does not pass the Miller-Rabin primality test.
    /// - The generator `g` lies outside `[2, q - 2]`.
    /// - The generator is a quadratic residue modulo an odd prime `q`,
    ///   i.e. `g^((q-1)/2) mod q == 1`. This is a necessary condition for a
    ///   primitive root; a full order check would require factoring `q - 1`.
    pub fn new(q: BigUint, g: BigUint, round: u64) -> Result<Self, ParameterError> {
        if !is_probable_prime(&q) {
            return Err(ParameterError::CompositeModulus);
        }
        let one = BigUint::one();
        let two = &one + &one;
        if g < two || g > &q - &two {
            return Err(ParameterError::GeneratorOutOfRange);
        }
        if q.is_odd() && modpow(&g, &((&q - &one) / &two), &q).is_one() {
            return Err(ParameterError::GeneratorResidue);
        }
        Ok(Self { q, g, round })
    }

    /// Creates round parameters without validating them.
    ///
    /// Intended for parameters that were already validated by the trusted
    /// setup, where re-running the primality test on a several-hundred-digit
    /// modulus is wasted work.
    pub fn new_unchecked(q: BigUint, g: BigUint, round: u64) -> Self {
        Self { q, g, round }
    }

    /// Gets the prime modulus of the round.
    pub fn modulus(&self) -> &BigUint {
        &self.q
    }

    /// Gets the group generator of the round.
    pub fn generator(&self) -> &BigUint {
        &self.g
    }

    /// Gets the round index.
    pub fn round(&self) -> u64 {
        self.round
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
/// A unique client identifier, assigned once per round by the trusted setup.
///
/// The asymmetric sign rule of the masking engine orders clients by their
/// identifiers, so no two concurrently active clients may share one.
pub struct ClientId(u32);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// The set of client identifiers active in the current round.
///
/// Issuance goes through this explicit value instead of a hidden global
/// registry: callers pass the set in, it comes back updated.
pub struct ActiveIdSet(HashSet<ClientId>);

impl ActiveIdSet {
    /// Creates an empty set of active identifiers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh identifier, drawn uniformly from `[0, 2^ID_BITS)` and
    /// guaranteed not to collide with any identifier already active.
    ///
    /// Returns `None` if the identifier space is exhausted.
    pub fn issue<R: RngCore>(&mut self, prng: &mut R) -> Option<ClientId> {
        if self.0.len() >= 1 << ID_BITS {
            return None;
        }
        loop {
            let id = ClientId(prng.gen_range(0..1 << ID_BITS));
            if self.0.insert(id) {
                return Some(id);
            }
        }
    }

    /// Releases an identifier at the end of its round.
    ///
    /// Returns whether the identifier was active.
    pub fn release(&mut self, id: ClientId) -> bool {
        self.0.remove(&id)
    }

    /// Checks whether the identifier is active.
    pub fn contains(&self, id: ClientId) -> bool {
        self.0.contains(&id)
    }

    /// Gets the number of active identifiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks whether no identifier is active.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
