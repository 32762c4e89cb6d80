//! Dropout-tolerant aggregation of masked contributions.
//!
//! # Round life cycle
//! A [`RoundAggregation`] starts in the `Collecting` phase and accumulates
//! one [`MaskedContribution`] per reporting client against the expected
//! membership handed over by the trusted setup. When the caller decides the
//! round deadline has elapsed it calls [`close`]: if every expected client
//! reported, the round resolves directly to the sum of the masked
//! contributions, in which the pairwise masks have already telescoped away.
//!
//! If some clients dropped out, the round enters the `Reconstructing` phase.
//! Every survivor still carries one uncancelled mask half per dropped
//! neighbor, so the aggregator reconstructs each dropped client's round
//! secrets from the share points held by survivors and adds back the mask
//! halves the dropped client would have contributed. Reconstruction needs at
//! least `order + 1` share points per secret; with fewer, or with tampered
//! shares, the round ends `Unrecoverable` and is not retried — a retry is a
//! fresh round with fresh secrets.
//!
//! [`close`]: RoundAggregation::close

use std::collections::BTreeMap;

use num::{
    bigint::{BigInt, BigUint},
    traits::identities::Zero,
    Integer,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    common::{ClientId, RoundParameters},
    crypto::modpow,
    mask::{pair_sign, MaskedContribution, PublicValue},
    sharing::{reconstruct, SharePoint, SharingError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// The phases of one aggregation round.
pub enum Phase {
    /// Accumulating masked contributions from reporting clients.
    Collecting,
    /// Recovering the round secrets of dropped clients from shares.
    Reconstructing,
    /// The aggregate is final.
    Resolved,
    /// Reconstruction failed; the round cannot produce an aggregate.
    Unrecoverable,
}

#[derive(Debug, Error, PartialEq, Eq)]
/// Errors related to collecting and resolving an aggregation round.
pub enum AggregationError {
    #[error("client {0} is not part of this round's membership")]
    UnknownClient(ClientId),

    #[error("client {0} already submitted a contribution this round")]
    DuplicateContribution(ClientId),

    #[error("the contribution of client {0} lies outside the group of the modulus")]
    ContributionOutOfRange(ClientId),

    #[error("no secret shares were supplied for dropped client {0}")]
    MissingShares(ClientId),

    #[error("reconstruction for dropped client {client} failed: {source}")]
    Reconstruction {
        client: ClientId,
        source: SharingError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The share points surviving neighbors hold of one dropped client's secrets.
///
/// Both round secrets are shared as integer polynomials whose constant term
/// is the secret; at least `order + 1` points of each are needed.
pub struct DroppedClientShares {
    /// The dropped client.
    pub client: ClientId,
    /// Share points of the pairwise secret.
    pub pairwise: Vec<SharePoint>,
    /// Share points of the self secret.
    pub self_secret: Vec<SharePoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The round secrets recovered for one dropped client.
pub struct RecoveredSecrets {
    /// The dropped client.
    pub client: ClientId,
    /// The reconstructed pairwise secret.
    pub pairwise: BigUint,
    /// The reconstructed self secret.
    pub self_secret: BigUint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// The status flag reported alongside the aggregator output.
pub enum RoundStatus {
    Resolved,
    Unrecoverable,
}

#[derive(Debug)]
/// The outcome of a closed aggregation round.
pub enum RoundOutcome {
    /// The unmasked aggregate is valid: all pairwise masks, live or
    /// reconstructed, have cancelled.
    Resolved {
        /// The aggregate, equal to the sum of all reporting clients'
        /// self-blinded values modulo `q`.
        aggregate: BigUint,
        /// The secrets recovered for dropped clients, empty if none dropped.
        recovered: Vec<RecoveredSecrets>,
    },
    /// The masking effect of at least one dropped client could not be
    /// removed. Reported, not retried.
    Unrecoverable {
        /// The clients that failed to report.
        dropped: Vec<ClientId>,
        /// The failure that made the round unrecoverable.
        reason: AggregationError,
    },
}

impl RoundOutcome {
    /// Gets the status flag of the outcome.
    pub fn status(&self) -> RoundStatus {
        match self {
            RoundOutcome::Resolved { .. } => RoundStatus::Resolved,
            RoundOutcome::Unrecoverable { .. } => RoundStatus::Unrecoverable,
        }
    }
}

#[derive(Debug)]
/// The aggregator for one round of masked contributions.
pub struct RoundAggregation {
    params: RoundParameters,
    /// The order of the share polynomials; reconstruction needs `order + 1`
    /// points.
    order: usize,
    /// The expected membership: every client of the round and its public
    /// value.
    membership: BTreeMap<ClientId, PublicValue>,
    contributions: BTreeMap<ClientId, BigUint>,
    phase: Phase,
}

impl RoundAggregation {
    /// Creates the aggregation for one round.
    ///
    /// The `membership` is the aggregator's global view of the round: every
    /// expected client with the public value it distributed during setup.
    /// Each client's neighbor list must mirror this view, or mask
    /// cancellation fails silently at aggregation time.
    pub fn new(
        params: RoundParameters,
        order: usize,
        membership: BTreeMap<ClientId, PublicValue>,
    ) -> Self {
        info!(
            round = params.round(),
            expected = membership.len(),
            "starting aggregation round"
        );
        Self {
            params,
            order,
            membership,
            contributions: BTreeMap::new(),
            phase: Phase::Collecting,
        }
    }

    /// Gets the current phase of the round.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Gets the clients that are expected but have not reported yet.
    pub fn pending(&self) -> Vec<ClientId> {
        self.membership
            .keys()
            .filter(|id| !self.contributions.contains_key(id))
            .copied()
            .collect()
    }

    /// Accumulates the masked contribution of one reporting client.
    ///
    /// # Errors
    /// Fails if the client is not part of the round's membership, already
    /// reported, or submitted a value outside `[0, q)`.
    pub fn collect(
        &mut self,
        id: ClientId,
        contribution: MaskedContribution,
    ) -> Result<(), AggregationError> {
        if !self.membership.contains_key(&id) {
            return Err(AggregationError::UnknownClient(id));
        }
        if self.contributions.contains_key(&id) {
            return Err(AggregationError::DuplicateContribution(id));
        }
        let value = BigUint::from(contribution);
        if &value >= self.params.modulus() {
            return Err(AggregationError::ContributionOutOfRange(id));
        }
        debug!(client = %id, "masked contribution collected");
        self.contributions.insert(id, value);
        Ok(())
    }

    /// Closes the round once the caller's deadline elapsed, resolving the
    /// aggregate.
    ///
    /// If every expected client reported, the pairwise masks have already
    /// cancelled and the round resolves without reconstruction. Otherwise
    /// `dropped_shares` must supply, for each missing client, at least
    /// `order + 1` share points of both of its round secrets; the secrets
    /// are reconstructed and the missing mask halves added back. Any
    /// reconstruction failure ends the round `Unrecoverable`.
    pub fn close(mut self, dropped_shares: &[DroppedClientShares]) -> RoundOutcome {
        let missing = self.pending();
        let mut aggregate = self
            .contributions
            .values()
            .fold(BigUint::zero(), |acc, value| {
                (acc + value) % self.params.modulus()
            });

        if missing.is_empty() {
            self.phase = Phase::Resolved;
            info!(round = self.params.round(), "all expected clients reported");
            return RoundOutcome::Resolved {
                aggregate,
                recovered: Vec::new(),
            };
        }

        self.phase = Phase::Reconstructing;
        warn!(
            round = self.params.round(),
            dropped = missing.len(),
            "clients dropped out, reconstructing their secrets"
        );

        let mut recovered = Vec::with_capacity(missing.len());
        for client in &missing {
            let secrets = match self.recover_secrets(*client, dropped_shares) {
                Ok(secrets) => secrets,
                Err(reason) => {
                    self.phase = Phase::Unrecoverable;
                    error!(client = %client, %reason, "round is unrecoverable");
                    return RoundOutcome::Unrecoverable {
                        dropped: missing.clone(),
                        reason,
                    };
                }
            };
            aggregate = self.cancel_missing_masks(aggregate, &secrets);
            recovered.push(secrets);
        }

        self.phase = Phase::Resolved;
        info!(
            round = self.params.round(),
            recovered = recovered.len(),
            "aggregate resolved after reconstruction"
        );
        RoundOutcome::Resolved {
            aggregate,
            recovered,
        }
    }

    /// Aborts the round before it is resolved, discarding all round state.
    ///
    /// A retried round re-runs secret generation fully; nothing of this
    /// round may be reused.
    pub fn abort(self) {
        info!(round = self.params.round(), "aggregation round aborted");
    }

    /// Reconstructs both round secrets of one dropped client from the
    /// supplied shares.
    fn recover_secrets(
        &self,
        client: ClientId,
        dropped_shares: &[DroppedClientShares],
    ) -> Result<RecoveredSecrets, AggregationError> {
        let shares = dropped_shares
            .iter()
            .find(|shares| shares.client == client)
            .ok_or(AggregationError::MissingShares(client))?;
        let pairwise = self.recover_secret(client, &shares.pairwise)?;
        let self_secret = self.recover_secret(client, &shares.self_secret)?;

        // The reconstructed pairwise secret must reproduce the public value
        // recorded during setup; a mismatch means the shares were tampered
        // with or belong to a different secret.
        let expected = BigUint::from(
            // PANIC_SAFE: recover_secrets is only called for members
            self.membership.get(&client).unwrap().clone(),
        );
        if modpow(self.params.generator(), &pairwise, self.params.modulus()) != expected {
            return Err(AggregationError::Reconstruction {
                client,
                source: SharingError::InconsistentShares,
            });
        }
        Ok(RecoveredSecrets {
            client,
            pairwise,
            self_secret,
        })
    }

    /// Reconstructs one secret, the constant term of its share polynomial.
    fn recover_secret(
        &self,
        client: ClientId,
        points: &[SharePoint],
    ) -> Result<BigUint, AggregationError> {
        let polynomial = reconstruct(self.order, points)
            .map_err(|source| AggregationError::Reconstruction { client, source })?;
        // secrets are non-negative; a negative constant term cannot have
        // been dealt by the setup
        polynomial
            .constant_term()
            .to_biguint()
            .ok_or(AggregationError::Reconstruction {
                client,
                source: SharingError::InconsistentShares,
            })
    }

    /// Adds back the mask halves the dropped client would have contributed
    /// toward every survivor, so the survivors' orphaned halves cancel.
    fn cancel_missing_masks(&self, aggregate: BigUint, secrets: &RecoveredSecrets) -> BigUint {
        let modulus = BigInt::from(self.params.modulus().clone());
        let dropped_public = BigInt::from(modpow(
            self.params.generator(),
            &secrets.pairwise,
            self.params.modulus(),
        ));
        let mut compensated = BigInt::from(aggregate);
        for (id, public) in &self.membership {
            if !self.contributions.contains_key(id) {
                continue;
            }
            let shared = &dropped_public * BigInt::from(BigUint::from(public.clone()));
            compensated += BigInt::from(pair_sign(secrets.client, *id)) * shared;
        }
        // PANIC_SAFE: mod_floor by a positive modulus is non-negative
        compensated.mod_floor(&modulus).to_biguint().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::{
        mask::{Masker, NeighborEntry, SecretPair},
        sharing::Polynomial,
    };

    const ORDER: usize = 2;

    fn params() -> RoundParameters {
        RoundParameters::new_unchecked(BigUint::from(1_000_000_007_u64), BigUint::from(5_u8), 3)
    }

    struct TestRound {
        params: RoundParameters,
        ids: Vec<ClientId>,
        values: Vec<u64>,
        self_secrets: Vec<u64>,
        pairwise: Vec<u64>,
        membership: BTreeMap<ClientId, PublicValue>,
        masked: Vec<MaskedContribution>,
    }

    /// The concrete 4-client round from the protocol's cancellation property.
    fn test_round() -> TestRound {
        let params = params();
        let ids: Vec<ClientId> = [1_u32, 2, 3, 4].iter().map(|id| ClientId::from(*id)).collect();
        let values = vec![100_u64, 200, 300, 400];
        let self_secrets = vec![10_u64, 20, 30, 40];
        let pairwise = vec![3_u64, 5, 7, 11];

        let secrets: Vec<SecretPair> = pairwise
            .iter()
            .zip(self_secrets.iter())
            .map(|(ps, ss)| SecretPair::from_parts(BigUint::from(*ps), BigUint::from(*ss)))
            .collect();
        let membership: BTreeMap<ClientId, PublicValue> = ids
            .iter()
            .zip(secrets.iter())
            .map(|(id, pair)| (*id, pair.public_value(&params)))
            .collect();

        let masked: Vec<MaskedContribution> = ids
            .iter()
            .zip(secrets.into_iter())
            .zip(values.iter())
            .map(|((id, pair), value)| {
                let neighbors: Vec<NeighborEntry> = membership
                    .iter()
                    .filter(|(other, _)| *other != id)
                    .map(|(other, public)| NeighborEntry::new(*other, public.clone()))
                    .collect();
                Masker::new(&params, *id, pair).mask(&BigUint::from(*value), &neighbors)
            })
            .collect();

        TestRound {
            params,
            ids,
            values,
            self_secrets,
            pairwise,
            membership,
            masked,
        }
    }

    fn shares_for(
        round: &TestRound,
        index: usize,
        num_points: usize,
        prng: &mut ChaCha20Rng,
    ) -> DroppedClientShares {
        let pairwise = Polynomial::with_secret(&BigUint::from(round.pairwise[index]), ORDER, 10, prng)
            .unwrap()
            .sample_points(num_points, prng)
            .unwrap();
        let self_secret =
            Polynomial::with_secret(&BigUint::from(round.self_secrets[index]), ORDER, 10, prng)
                .unwrap()
                .sample_points(num_points, prng)
                .unwrap();
        DroppedClientShares {
            client: round.ids[index],
            pairwise,
            self_secret,
        }
    }

    #[test]
    fn test_no_dropout_equals_direct_masked_sum() {
        let round = test_round();
        let mut aggregation =
            RoundAggregation::new(round.params.clone(), ORDER, round.membership.clone());
        assert_eq!(aggregation.phase(), Phase::Collecting);

        let mut direct_sum = BigUint::zero();
        for (id, masked) in round.ids.iter().zip(round.masked.iter()) {
            direct_sum = (direct_sum + BigUint::from(masked.clone())) % round.params.modulus();
            aggregation.collect(*id, masked.clone()).unwrap();
        }
        assert!(aggregation.pending().is_empty());

        match aggregation.close(&[]) {
            RoundOutcome::Resolved {
                aggregate,
                recovered,
            } => {
                // reconstruction was never entered
                assert!(recovered.is_empty());
                assert_eq!(aggregate, direct_sum);
                let plain_sum = round
                    .values
                    .iter()
                    .zip(round.self_secrets.iter())
                    .fold(BigUint::zero(), |acc, (value, secret)| {
                        (acc + BigUint::from(value + secret)) % round.params.modulus()
                    });
                assert_eq!(aggregate, plain_sum);
            }
            outcome => panic!("round did not resolve: {:?}", outcome),
        }
    }

    #[test]
    fn test_collect_rejects_unknown_client() {
        let round = test_round();
        let mut aggregation =
            RoundAggregation::new(round.params.clone(), ORDER, round.membership.clone());
        assert_eq!(
            aggregation
                .collect(ClientId::from(99), round.masked[0].clone())
                .unwrap_err(),
            AggregationError::UnknownClient(ClientId::from(99)),
        );
    }

    #[test]
    fn test_collect_rejects_duplicate() {
        let round = test_round();
        let mut aggregation =
            RoundAggregation::new(round.params.clone(), ORDER, round.membership.clone());
        aggregation
            .collect(round.ids[0], round.masked[0].clone())
            .unwrap();
        assert_eq!(
            aggregation
                .collect(round.ids[0], round.masked[0].clone())
                .unwrap_err(),
            AggregationError::DuplicateContribution(round.ids[0]),
        );
    }

    #[test]
    fn test_collect_rejects_out_of_range() {
        let round = test_round();
        let mut aggregation =
            RoundAggregation::new(round.params.clone(), ORDER, round.membership.clone());
        let oversized = MaskedContribution::from(round.params.modulus().clone());
        assert_eq!(
            aggregation.collect(round.ids[0], oversized).unwrap_err(),
            AggregationError::ContributionOutOfRange(round.ids[0]),
        );
    }

    #[test]
    fn test_dropout_recovery() {
        let round = test_round();
        let mut prng = ChaCha20Rng::from_seed([0_u8; 32]);
        let mut aggregation =
            RoundAggregation::new(round.params.clone(), ORDER, round.membership.clone());

        // client 4 drops out
        for i in 0..3 {
            aggregation
                .collect(round.ids[i], round.masked[i].clone())
                .unwrap();
        }
        assert_eq!(aggregation.pending(), vec![round.ids[3]]);

        let shares = shares_for(&round, 3, 5, &mut prng);
        match aggregation.close(&[shares]) {
            RoundOutcome::Resolved {
                aggregate,
                recovered,
            } => {
                // the survivors' sum with the dropped client's masks cancelled
                let plain_sum = (0..3).fold(BigUint::zero(), |acc, i| {
                    (acc + BigUint::from(round.values[i] + round.self_secrets[i]))
                        % round.params.modulus()
                });
                assert_eq!(aggregate, plain_sum);
                assert_eq!(
                    recovered,
                    vec![RecoveredSecrets {
                        client: round.ids[3],
                        pairwise: BigUint::from(round.pairwise[3]),
                        self_secret: BigUint::from(round.self_secrets[3]),
                    }],
                );
            }
            outcome => panic!("round did not resolve: {:?}", outcome),
        }
    }

    #[test]
    fn test_dropout_without_shares_is_unrecoverable() {
        let round = test_round();
        let mut aggregation =
            RoundAggregation::new(round.params.clone(), ORDER, round.membership.clone());
        for i in 0..3 {
            aggregation
                .collect(round.ids[i], round.masked[i].clone())
                .unwrap();
        }
        match aggregation.close(&[]) {
            RoundOutcome::Unrecoverable { dropped, reason } => {
                assert_eq!(dropped, vec![round.ids[3]]);
                assert_eq!(reason, AggregationError::MissingShares(round.ids[3]));
            }
            outcome => panic!("round unexpectedly resolved: {:?}", outcome),
        }
    }

    #[test]
    fn test_dropout_with_insufficient_shares_is_unrecoverable() {
        let round = test_round();
        let mut prng = ChaCha20Rng::from_seed([1_u8; 32]);
        let mut aggregation =
            RoundAggregation::new(round.params.clone(), ORDER, round.membership.clone());
        for i in 0..3 {
            aggregation
                .collect(round.ids[i], round.masked[i].clone())
                .unwrap();
        }
        let mut shares = shares_for(&round, 3, 5, &mut prng);
        shares.pairwise.truncate(ORDER);
        match aggregation.close(&[shares]) {
            RoundOutcome::Unrecoverable { reason, .. } => {
                assert_eq!(
                    reason,
                    AggregationError::Reconstruction {
                        client: round.ids[3],
                        source: SharingError::InsufficientShares {
                            required: ORDER + 1,
                            supplied: ORDER,
                        },
                    },
                );
            }
            outcome => panic!("round unexpectedly resolved: {:?}", outcome),
        }
    }

    #[test]
    fn test_dropout_with_foreign_shares_is_unrecoverable() {
        let round = test_round();
        let mut prng = ChaCha20Rng::from_seed([2_u8; 32]);
        let mut aggregation =
            RoundAggregation::new(round.params.clone(), ORDER, round.membership.clone());
        for i in 0..3 {
            aggregation
                .collect(round.ids[i], round.masked[i].clone())
                .unwrap();
        }
        // shares of a different secret than the one behind the recorded
        // public value
        let mut shares = shares_for(&round, 3, 5, &mut prng);
        shares.pairwise = Polynomial::with_secret(&BigUint::from(999_u16), ORDER, 10, &mut prng)
            .unwrap()
            .sample_points(5, &mut prng)
            .unwrap();
        match aggregation.close(&[shares]) {
            RoundOutcome::Unrecoverable { reason, .. } => {
                assert_eq!(
                    reason,
                    AggregationError::Reconstruction {
                        client: round.ids[3],
                        source: SharingError::InconsistentShares,
                    },
                );
            }
            outcome => panic!("round unexpectedly resolved: {:?}", outcome),
        }
    }

    #[test]
    fn test_outcome_status_flags() {
        let resolved = RoundOutcome::Resolved {
            aggregate: BigUint::zero(),
            recovered: Vec::new(),
        };
        assert_eq!(resolved.status(), RoundStatus::Resolved);
        let unrecoverable = RoundOutcome::Unrecoverable {
            dropped: vec![ClientId::from(1)],
            reason: AggregationError::MissingShares(ClientId::from(1)),
        };
        assert_eq!(unrecoverable.status(), RoundStatus::Unrecoverable);
    }
}
