//! Integer share polynomials: generation, evaluation and sampling.
//!
//! See the [sharing module] documentation since this is a private module anyways.
//!
//! [sharing module]: crate::sharing

use num::{
    bigint::{BigInt, BigUint},
    traits::identities::{One, Zero},
};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{crypto::generate_integer, sharing::SharingError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One evaluation point `(x, y)` of a share polynomial.
///
/// A share holder keeps the points it was issued during setup and surrenders
/// them to the aggregator when a dropped client's secret must be recovered.
pub struct SharePoint {
    /// The sample position.
    pub x: BigInt,
    /// The polynomial value at the sample position.
    pub y: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A polynomial over the integers, represented by its coefficients in order
/// of decreasing degree.
///
/// The constant term carries the shared secret when the polynomial is dealt
/// via [`Polynomial::with_secret`].
pub struct Polynomial {
    coeffs: Vec<BigInt>,
}

impl Polynomial {
    /// Creates a polynomial from its coefficients, highest degree first.
    ///
    /// # Errors
    /// Fails if no coefficients are given.
    pub fn from_coefficients(coeffs: Vec<BigInt>) -> Result<Self, SharingError> {
        if coeffs.is_empty() {
            return Err(SharingError::NoCoefficients);
        }
        Ok(Self { coeffs })
    }

    /// Generates a random polynomial of degree exactly `order` together with
    /// `num_points` evaluation points.
    ///
    /// The coefficients are drawn uniformly from `[-coeff_limit, coeff_limit)`
    /// and the leading coefficient is forced non-zero so the degree is exact.
    /// The sample positions are drawn without replacement from a symmetric
    /// integer range around zero sized to `num_points`.
    ///
    /// # Errors
    /// Fails if `coeff_limit` is zero or if `num_points < order + 1`, which
    /// would not admit exact reconstruction.
    pub fn generate<R: RngCore>(
        order: usize,
        coeff_limit: u64,
        num_points: usize,
        prng: &mut R,
    ) -> Result<(Self, Vec<SharePoint>), SharingError> {
        if coeff_limit == 0 {
            return Err(SharingError::EmptyCoefficientRange);
        }
        let mut coeffs = Vec::with_capacity(order + 1);
        for _ in 0..order + 1 {
            coeffs.push(draw_coefficient(coeff_limit, prng));
        }
        if coeffs[0].is_zero() {
            coeffs[0] = BigInt::one();
        }
        let polynomial = Self { coeffs };
        let points = polynomial.sample_points(num_points, prng)?;
        Ok((polynomial, points))
    }

    /// Builds a share polynomial of degree exactly `order` whose constant
    /// term is `secret`, with all other coefficients drawn uniformly from
    /// `[-coeff_limit, coeff_limit)`.
    ///
    /// # Errors
    /// Fails if `coeff_limit` is zero.
    pub fn with_secret<R: RngCore>(
        secret: &BigUint,
        order: usize,
        coeff_limit: u64,
        prng: &mut R,
    ) -> Result<Self, SharingError> {
        if coeff_limit == 0 {
            return Err(SharingError::EmptyCoefficientRange);
        }
        let mut coeffs = Vec::with_capacity(order + 1);
        for _ in 0..order {
            coeffs.push(draw_coefficient(coeff_limit, prng));
        }
        if order > 0 && coeffs[0].is_zero() {
            coeffs[0] = BigInt::one();
        }
        coeffs.push(BigInt::from(secret.clone()));
        Ok(Self { coeffs })
    }

    /// Evaluates the polynomial at `num_points` distinct sample positions
    /// drawn without replacement from a symmetric range around zero.
    ///
    /// # Errors
    /// Fails if `num_points` is smaller than `order + 1`.
    pub fn sample_points<R: RngCore>(
        &self,
        num_points: usize,
        prng: &mut R,
    ) -> Result<Vec<SharePoint>, SharingError> {
        if num_points < self.order() + 1 {
            return Err(SharingError::PointCountMismatch {
                order: self.order(),
                supplied: num_points,
            });
        }
        // candidate positions [-(n/2) - 1, n/2] (floor division), n + 2 in total
        let n = num_points as i64;
        let mut candidates: Vec<i64> = ((-n).div_euclid(2) - 1..=n.div_euclid(2)).collect();
        // partial Fisher-Yates: the first num_points entries end up being a
        // uniform draw without replacement
        for i in 0..num_points {
            let j = prng.gen_range(i..candidates.len());
            candidates.swap(i, j);
        }
        Ok(candidates
            .into_iter()
            .take(num_points)
            .map(|pos| {
                let x = BigInt::from(pos);
                let y = self.evaluate(&x);
                SharePoint { x, y }
            })
            .collect())
    }

    /// Evaluates the polynomial at `x` via Horner's scheme.
    pub fn evaluate(&self, x: &BigInt) -> BigInt {
        self.coeffs
            .iter()
            .fold(BigInt::zero(), |acc, coeff| acc * x + coeff)
    }

    /// Gets the order of the polynomial, i.e. the number of coefficients
    /// minus one.
    pub fn order(&self) -> usize {
        self.coeffs.len() - 1
    }

    /// Gets the coefficients in order of decreasing degree.
    pub fn coefficients(&self) -> &[BigInt] {
        &self.coeffs
    }

    /// Gets the constant term, which carries the secret for polynomials
    /// dealt via [`Polynomial::with_secret`].
    pub fn constant_term(&self) -> &BigInt {
        // PANIC_SAFE: construction guarantees at least one coefficient
        self.coeffs.last().unwrap()
    }

    /// Checks that the polynomial passes through every given point exactly.
    ///
    /// This is an exact equality check without tolerance, as required over
    /// the integer domain.
    pub fn matches_samples(&self, points: &[SharePoint]) -> bool {
        points.iter().all(|point| self.evaluate(&point.x) == point.y)
    }

    /// Checks that the polynomial has exactly the given coefficients.
    pub fn matches_coefficients(&self, coeffs: &[BigInt]) -> bool {
        self.coeffs == coeffs
    }
}

/// Draws one coefficient uniformly from `[-limit, limit)`.
fn draw_coefficient<R: RngCore>(limit: u64, prng: &mut R) -> BigInt {
    let span = BigUint::from(limit) << 1;
    BigInt::from(generate_integer(prng, &span)) - BigInt::from(limit)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    #[test]
    fn test_generate_degree_is_exact() {
        let mut prng = ChaCha20Rng::from_seed([0_u8; 32]);
        for order in 0..6 {
            let (polynomial, _) = Polynomial::generate(order, 3, order + 1, &mut prng).unwrap();
            assert_eq!(polynomial.order(), order);
            assert!(!polynomial.coefficients()[0].is_zero());
        }
    }

    #[test]
    fn test_generate_coefficients_within_limit() {
        let mut prng = ChaCha20Rng::from_seed([1_u8; 32]);
        let limit = BigInt::from(5);
        let (polynomial, _) = Polynomial::generate(7, 5, 8, &mut prng).unwrap();
        for coeff in polynomial.coefficients() {
            assert!(coeff >= &-&limit && coeff <= &limit);
        }
    }

    #[test]
    fn test_generate_rejects_zero_limit() {
        let mut prng = ChaCha20Rng::from_seed([0_u8; 32]);
        assert_eq!(
            Polynomial::generate(2, 0, 3, &mut prng).unwrap_err(),
            SharingError::EmptyCoefficientRange,
        );
    }

    #[test]
    fn test_generate_rejects_too_few_points() {
        let mut prng = ChaCha20Rng::from_seed([0_u8; 32]);
        assert_eq!(
            Polynomial::generate(3, 5, 3, &mut prng).unwrap_err(),
            SharingError::PointCountMismatch {
                order: 3,
                supplied: 3,
            },
        );
    }

    #[test]
    fn test_sample_points_distinct_and_on_curve() {
        let mut prng = ChaCha20Rng::from_seed([2_u8; 32]);
        let (polynomial, points) = Polynomial::generate(4, 10, 12, &mut prng).unwrap();
        assert_eq!(points.len(), 12);
        let positions: HashSet<_> = points.iter().map(|point| point.x.clone()).collect();
        assert_eq!(positions.len(), 12);
        assert!(polynomial.matches_samples(&points));
    }

    #[test]
    fn test_sample_positions_symmetric_range() {
        let mut prng = ChaCha20Rng::from_seed([3_u8; 32]);
        let num_points = 6_usize;
        let (_, points) = Polynomial::generate(2, 10, num_points, &mut prng).unwrap();
        let lower = BigInt::from(-(num_points as i64) / 2 - 1);
        let upper = BigInt::from(num_points as i64 / 2);
        for point in &points {
            assert!(point.x >= lower && point.x <= upper);
        }
    }

    #[test]
    fn test_with_secret_constant_term() {
        let mut prng = ChaCha20Rng::from_seed([4_u8; 32]);
        let secret = BigUint::from(731_u16);
        let polynomial = Polynomial::with_secret(&secret, 3, 10, &mut prng).unwrap();
        assert_eq!(polynomial.order(), 3);
        assert_eq!(polynomial.constant_term(), &BigInt::from(731));
        assert_eq!(polynomial.evaluate(&BigInt::zero()), BigInt::from(731));
    }

    #[test]
    fn test_evaluate_horner() {
        // 2x^2 - 3x + 1
        let polynomial = Polynomial::from_coefficients(vec![
            BigInt::from(2),
            BigInt::from(-3),
            BigInt::from(1),
        ])
        .unwrap();
        assert_eq!(polynomial.evaluate(&BigInt::from(0)), BigInt::from(1));
        assert_eq!(polynomial.evaluate(&BigInt::from(1)), BigInt::from(0));
        assert_eq!(polynomial.evaluate(&BigInt::from(-2)), BigInt::from(15));
    }

    #[test]
    fn test_from_coefficients_rejects_empty() {
        assert_eq!(
            Polynomial::from_coefficients(vec![]).unwrap_err(),
            SharingError::NoCoefficients,
        );
    }

    #[test]
    fn test_generation_deterministic_under_fixed_seed() {
        let mut first = ChaCha20Rng::from_seed([9_u8; 32]);
        let mut second = ChaCha20Rng::from_seed([9_u8; 32]);
        assert_eq!(
            Polynomial::generate(5, 100, 8, &mut first).unwrap(),
            Polynomial::generate(5, 100, 8, &mut second).unwrap(),
        );
    }
}
