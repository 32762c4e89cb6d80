//! Uniform big-integer generation from an explicit PRNG.
//!
//! See the [crypto module] documentation since this is a private module anyways.
//!
//! [crypto module]: crate::crypto

use num::{
    bigint::BigUint,
    traits::identities::{One, Zero},
};
use rand::RngCore;

/// Generates a pseudo-random integer uniform over `[0, max_int)`.
///
/// Draws by rejection sampling over the byte length of `max_int`, so the
/// distribution is exactly uniform. The PRNG is passed in explicitly; with a
/// seeded `ChaCha20Rng` the draw is reproducible.
pub fn generate_integer<R: RngCore>(prng: &mut R, max_int: &BigUint) -> BigUint {
    if max_int.is_zero() {
        return BigUint::zero();
    }
    let mut bytes = max_int.to_bytes_le();
    let mut rand_int = max_int.clone();
    while &rand_int >= max_int {
        prng.fill_bytes(&mut bytes);
        rand_int = BigUint::from_bytes_le(&bytes);
    }
    rand_int
}

/// Generates a round secret uniform over `[0, 2^exp)`.
///
/// Both halves of a client's secret pair are drawn this way at round start.
pub fn generate_secret<R: RngCore>(prng: &mut R, exp: u32) -> BigUint {
    generate_integer(prng, &(BigUint::one() << exp))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    #[test]
    fn test_generate_integer_bounds() {
        let mut prng = ChaCha20Rng::from_seed([0_u8; 32]);
        let max_int = BigUint::from(1_000_000_007_u64);
        for _ in 0..100 {
            assert!(generate_integer(&mut prng, &max_int) < max_int);
        }
    }

    #[test]
    fn test_generate_integer_zero_bound() {
        let mut prng = ChaCha20Rng::from_seed([0_u8; 32]);
        assert_eq!(
            generate_integer(&mut prng, &BigUint::zero()),
            BigUint::zero()
        );
    }

    #[test]
    fn test_generate_integer_deterministic() {
        let max_int = BigUint::one() << 256;
        let mut first = ChaCha20Rng::from_seed([7_u8; 32]);
        let mut second = ChaCha20Rng::from_seed([7_u8; 32]);
        for _ in 0..10 {
            assert_eq!(
                generate_integer(&mut first, &max_int),
                generate_integer(&mut second, &max_int),
            );
        }
    }

    #[test]
    fn test_generate_secret_bounds() {
        let mut prng = ChaCha20Rng::from_seed([1_u8; 32]);
        let limit = BigUint::one() << 10;
        for _ in 0..100 {
            assert!(generate_secret(&mut prng, 10) < limit);
        }
    }
}
