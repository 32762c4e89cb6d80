//! The pairwise masking engine.
//!
//! See the [mask module] documentation since this is a private module anyways.
//!
//! [mask module]: crate::mask

use derive_more::{AsRef, From, Into};
use num::{
    bigint::{BigInt, BigUint},
    Integer,
};
use serde::{Deserialize, Serialize};

use crate::{
    common::{ClientId, RoundParameters},
    mask::secret::{PublicValue, SecretPair},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One entry of a client's neighbor list.
///
/// The canonical neighbor representation at the masking boundary: an ordered
/// sequence of these entries, in arbitrary order. The protocol does not
/// depend on the order because the sign of each shared mask is derived from
/// the identifier pair, not from the list position.
pub struct NeighborEntry {
    /// The neighbor's identifier.
    pub id: ClientId,
    /// The neighbor's public value.
    pub public: PublicValue,
}

impl NeighborEntry {
    /// Creates a neighbor entry.
    pub fn new(id: ClientId, public: PublicValue) -> Self {
        Self { id, public }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, AsRef, From, Into, Serialize, Deserialize)]
/// A client's masked contribution for one round, an integer in `[0, q)`.
///
/// Produced once per client per round and consumed exactly once by the
/// aggregator.
pub struct MaskedContribution(BigUint);

/// The asymmetric sign a client applies toward one neighbor.
///
/// Returns `-1` if `own_id > neighbor_id` and `+1` otherwise. For any pair of
/// distinct clients the two signs are opposite, which is the load-bearing
/// invariant behind mask cancellation: both clients add the numerically
/// identical product of their public values, once positive and once negative.
pub fn pair_sign(own_id: ClientId, neighbor_id: ClientId) -> i8 {
    if own_id > neighbor_id {
        -1
    } else {
        1
    }
}

/// The masking engine run once per client per round.
///
/// Owns the round secrets and consumes them when masking, so a secret pair
/// cannot be reused across rounds.
pub struct Masker<'a> {
    params: &'a RoundParameters,
    own_id: ClientId,
    secrets: SecretPair,
}

impl<'a> Masker<'a> {
    /// Creates a masker for one client.
    pub fn new(params: &'a RoundParameters, own_id: ClientId, secrets: SecretPair) -> Self {
        Self {
            params,
            own_id,
            secrets,
        }
    }

    /// Derives the public value to distribute to the neighbors.
    pub fn public_value(&self) -> PublicValue {
        self.secrets.public_value(self.params)
    }

    /// Masks the local model value against the given neighbor list.
    ///
    /// For every neighbor, the shared mask `own_public * neighbor_public` is
    /// added with the sign from [`pair_sign`] and the running value is
    /// reduced into `[0, q)`; finally the self secret is added and reduced
    /// once more. Consumes the masker, destroying the round secrets.
    ///
    /// The neighbor list must mirror the aggregator's membership view; a
    /// non-mutual neighbor relationship cannot be detected here and breaks
    /// cancellation at aggregation time.
    pub fn mask(self, local_value: &BigUint, neighbors: &[NeighborEntry]) -> MaskedContribution {
        let modulus = BigInt::from(self.params.modulus().clone());
        let own_public = BigInt::from(BigUint::from(self.public_value()));
        let mut masked = BigInt::from(local_value.clone());
        for neighbor in neighbors {
            let shared = &own_public * BigInt::from(neighbor.public.as_ref().clone());
            masked = if pair_sign(self.own_id, neighbor.id) < 0 {
                masked - shared
            } else {
                masked + shared
            }
            .mod_floor(&modulus);
        }
        masked = (masked + BigInt::from(self.secrets.self_secret().clone())).mod_floor(&modulus);
        // PANIC_SAFE: mod_floor by a positive modulus is non-negative
        MaskedContribution(masked.to_biguint().unwrap())
    }
}
