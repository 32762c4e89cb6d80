//! Round-scoped client secrets and their public counterparts.
//!
//! See the [mask module] documentation since this is a private module anyways.
//!
//! [mask module]: crate::mask

use derive_more::{AsRef, From, Into};
use num::bigint::BigUint;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    common::RoundParameters,
    crypto::{generate_secret, modpow},
};

/// The default width of a round secret in bits.
///
/// Secrets are drawn uniformly from `[0, 2^SECRET_BITS)`.
pub const SECRET_BITS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
/// The secret pair owned exclusively by one client for one round.
///
/// Deliberately not serializable: the secrets themselves are never
/// transmitted, only the derived [`PublicValue`] and the share points dealt
/// during setup leave the client.
pub struct SecretPair {
    /// The pairwise secret, the private exponent behind the public value.
    pairwise: BigUint,
    /// The self secret that blinds the client's own contribution.
    self_secret: BigUint,
}

impl SecretPair {
    /// Draws a fresh secret pair, both halves uniform over `[0, 2^exp)`.
    ///
    /// Must be called once per round; an aborted round discards the pair and
    /// a retry draws a new one.
    pub fn generate<R: RngCore>(prng: &mut R, exp: u32) -> Self {
        Self {
            pairwise: generate_secret(prng, exp),
            self_secret: generate_secret(prng, exp),
        }
    }

    /// Creates a secret pair from known values.
    pub fn from_parts(pairwise: BigUint, self_secret: BigUint) -> Self {
        Self {
            pairwise,
            self_secret,
        }
    }

    /// Gets the pairwise secret.
    pub fn pairwise(&self) -> &BigUint {
        &self.pairwise
    }

    /// Gets the self secret.
    pub fn self_secret(&self) -> &BigUint {
        &self.self_secret
    }

    /// Derives the public value `g^pairwise mod q` shared with neighbors.
    ///
    /// Under the hardness of the discrete logarithm this reveals nothing
    /// about the pairwise secret.
    pub fn public_value(&self, params: &RoundParameters) -> PublicValue {
        PublicValue(modpow(
            params.generator(),
            self.pairwise(),
            params.modulus(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, AsRef, From, Into, Serialize, Deserialize)]
/// A client's public value `g^pairwise mod q`.
pub struct PublicValue(BigUint);
