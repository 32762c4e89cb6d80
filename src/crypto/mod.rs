//! Exact arbitrary-precision arithmetic and randomness for the protocol.
//!
//! Every other component builds on these two primitives: [`modpow`] performs
//! constant-structure fast exponentiation modulo a large prime, and
//! [`generate_integer`] draws uniform big integers from an explicit PRNG so
//! that all randomized operations are reproducible under a fixed seed.
//!
//! # Examples
//! ```
//! # use num::bigint::BigUint;
//! # use secagg_core::crypto::modpow;
//! let result = modpow(
//!     &BigUint::from(2_u8),
//!     &BigUint::from(1000_u16),
//!     &BigUint::from(13_u8),
//! );
//! assert_eq!(result, BigUint::from(3_u8));
//! ```

pub(crate) mod arith;
pub(crate) mod prng;

pub use self::{
    arith::{is_probable_prime, modpow},
    prng::{generate_integer, generate_secret},
};
