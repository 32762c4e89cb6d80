//! Polynomial secret sharing over the integers.
//!
//! # Share polynomials
//! A secret is encoded as a [`Polynomial`] of fixed order `d` with integer
//! coefficients, evaluated at `n >= d + 1` distinct integer sample positions.
//! Any `d + 1` of the resulting [`SharePoint`]s uniquely determine the
//! polynomial via exact Lagrange interpolation, so a threshold of share
//! holders can recover the secret; fewer than `d + 1` points leak nothing
//! about it.
//!
//! # Reconstruction
//! [`reconstruct`] interpolates over exact rationals and rounds the
//! coefficients to the nearest integer. Since the protocol only ever shares
//! integer-coefficient polynomials, a non-zero rounding residual cannot be a
//! numerical artifact: it signals tampered or mismatched shares and fails the
//! reconstruction attempt. Supplying more than `d + 1` points is allowed; the
//! surplus points are checked against the interpolated polynomial for
//! consistency.
//!
//! # Examples
//! ```
//! # use rand::SeedableRng;
//! # use rand_chacha::ChaCha20Rng;
//! # use secagg_core::sharing::{reconstruct, Polynomial};
//! let mut prng = ChaCha20Rng::from_seed([0_u8; 32]);
//! let (polynomial, points) = Polynomial::generate(2, 100, 5, &mut prng).unwrap();
//! let recovered = reconstruct(2, &points).unwrap();
//! assert_eq!(recovered, polynomial);
//! ```

pub(crate) mod polynomial;
pub(crate) mod reconstruct;

use thiserror::Error;

pub use self::{
    polynomial::{Polynomial, SharePoint},
    reconstruct::reconstruct,
};

#[derive(Debug, Error, PartialEq, Eq)]
/// Errors related to the generation and reconstruction of share polynomials.
pub enum SharingError {
    #[error("reconstruction needs at least {required} distinct points, got {supplied}")]
    InsufficientShares { required: usize, supplied: usize },

    #[error("share points contain a duplicated sample position")]
    DuplicatePoint,

    #[error("share points are inconsistent with a single polynomial of the expected order")]
    InconsistentShares,

    #[error("a polynomial of order {order} needs at least {order} + 1 sample points, got {supplied}")]
    PointCountMismatch { order: usize, supplied: usize },

    #[error("the coefficient limit must be positive")]
    EmptyCoefficientRange,

    #[error("a polynomial needs at least one coefficient")]
    NoCoefficients,
}
