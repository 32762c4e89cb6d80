//! # Secure aggregation primitives for federated learning
//!
//! Many clients each hold a private model update; a central aggregator must
//! learn only the *sum* of the updates, never any individual one, and the
//! result must survive clients dropping out mid-round. This crate implements
//! the cryptographic core of such a round:
//!
//! - [`crypto`]: exact modular arithmetic over arbitrary-precision integers
//!   and uniform big-integer generation from a seeded PRNG.
//! - [`sharing`]: a polynomial secret-sharing engine. A secret is encoded as
//!   evaluation points of an integer polynomial of bounded degree; any
//!   `order + 1` distinct points determine the polynomial (and hence the
//!   secret) via exact Lagrange interpolation, fewer reveal nothing.
//! - [`mask`]: the pairwise masking engine run once per client. Every pair of
//!   clients derives a shared mask from their Diffie-Hellman style public
//!   values; an asymmetric sign rule guarantees that the two halves of each
//!   pair cancel exactly when all contributions are summed.
//! - [`aggregation`]: the aggregator state machine. It collects one masked
//!   contribution per reporting client and, when clients drop out,
//!   reconstructs their round secrets from the shares held by survivors so
//!   that the orphaned mask halves can be cancelled as well.
//! - [`setup`]: the trusted-setup boundary. Prime and primitive-root
//!   generation, share dealing and optional Pedersen commitment parameters
//!   for verifiable aggregation.
//!
//! All secret material is round-scoped: generated at round start, consumed
//! exactly once and never reused. Reusing a secret across rounds breaks the
//! zero-knowledge property of the mask.
//!
//! The crate performs no network transport and persists no state across
//! rounds; it only computes masks, aggregates and reconstructs, given
//! whatever membership and share information it is handed.

pub mod aggregation;
pub mod common;
pub mod crypto;
pub mod mask;
pub mod setup;
pub mod sharing;

pub use self::{
    aggregation::{RoundAggregation, RoundOutcome, RoundStatus},
    common::{ActiveIdSet, ClientId, RoundParameters},
    mask::{MaskedContribution, Masker, NeighborEntry, PublicValue, SecretPair},
    sharing::{Polynomial, SharePoint},
};
