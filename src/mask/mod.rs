//! Pairwise masking of local model values.
//!
//! # Round secrets
//! At round start every client draws a fresh [`SecretPair`]: a *pairwise
//! secret* from which its Diffie-Hellman style [`PublicValue`] is derived,
//! and a *self secret* that blinds its individual contribution. Both are
//! round-scoped; the pair is consumed by the masking step and never reused.
//!
//! # Masking
//! A [`Masker`] combines the local value with one shared mask per neighbor.
//! For every neighbor the mask is the product of the two public values, added
//! with a sign determined by the identifier order of the pair: the client
//! with the smaller identifier adds the mask, the other subtracts it. Since
//! both clients compute the numerically identical product, the two halves
//! cancel exactly when all contributions are summed — provided every
//! neighbor relationship is mutual and both sides agree on the public
//! values. The masking engine cannot verify that symmetry locally; an
//! asymmetric neighbor list surfaces only as failed cancellation at
//! aggregation time, so the distributing collaborator must guarantee it.
//!
//! Masking is purely data-parallel: a masker owns all its inputs and shares
//! no mutable state with other clients, so any number of clients may mask
//! concurrently once the round's membership is known.
//!
//! # Examples
//! ```
//! # use num::bigint::BigUint;
//! # use rand::SeedableRng;
//! # use rand_chacha::ChaCha20Rng;
//! # use secagg_core::{common::RoundParameters, mask::{Masker, SecretPair}};
//! let params = RoundParameters::new(BigUint::from(23_u8), BigUint::from(5_u8), 0).unwrap();
//! let mut prng = ChaCha20Rng::from_seed([0_u8; 32]);
//! let secrets = SecretPair::generate(&mut prng, 10);
//! let masker = Masker::new(&params, 1.into(), secrets);
//! // a client without neighbors blinds its value with the self secret only
//! let masked = masker.mask(&BigUint::from(7_u8), &[]);
//! ```

pub(crate) mod masking;
pub(crate) mod secret;

pub use self::{
    masking::{pair_sign, MaskedContribution, Masker, NeighborEntry},
    secret::{PublicValue, SecretPair, SECRET_BITS},
};
