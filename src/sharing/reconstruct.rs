//! Exact Lagrange reconstruction of share polynomials.
//!
//! See the [sharing module] documentation since this is a private module anyways.
//!
//! [sharing module]: crate::sharing

use std::collections::HashSet;

use num::{
    bigint::BigInt,
    rational::Ratio,
    traits::identities::{One, Zero},
};

use crate::sharing::{Polynomial, SharePoint, SharingError};

/// Reconstructs the unique polynomial of degree at most `order` through the
/// given share points.
///
/// Interpolation runs over exact rationals, so there is no numerical
/// tolerance anywhere: the resulting coefficients are rounded to the nearest
/// integer and any non-zero residual means the points were not produced by a
/// single integer polynomial of the expected order. When more than
/// `order + 1` points are supplied, the surplus points are checked against
/// the interpolated polynomial, which makes over-determined reconstruction
/// detect degree mismatches as well.
///
/// # Errors
/// - [`SharingError::InsufficientShares`] if fewer than `order + 1` points
///   are supplied. An under-determined system must never silently return a
///   wrong polynomial.
/// - [`SharingError::DuplicatePoint`] if two points share a sample position.
/// - [`SharingError::InconsistentShares`] if the points are mutually
///   inconsistent with any degree-`order` integer polynomial. This signals
///   tampering or mismatched shares, not a numerical approximation.
pub fn reconstruct(order: usize, points: &[SharePoint]) -> Result<Polynomial, SharingError> {
    let mut positions = HashSet::new();
    for point in points {
        if !positions.insert(&point.x) {
            return Err(SharingError::DuplicatePoint);
        }
    }
    if points.len() < order + 1 {
        return Err(SharingError::InsufficientShares {
            required: order + 1,
            supplied: points.len(),
        });
    }

    let basis_points = &points[..order + 1];
    // coefficients in order of increasing degree, accumulated over the
    // scaled Lagrange basis polynomials
    let mut accumulated = vec![Ratio::<BigInt>::zero(); order + 1];
    for (i, point_i) in basis_points.iter().enumerate() {
        let mut basis = vec![Ratio::<BigInt>::one()];
        let mut denominator = Ratio::<BigInt>::one();
        for (j, point_j) in basis_points.iter().enumerate() {
            if i == j {
                continue;
            }
            let x_j = Ratio::from_integer(point_j.x.clone());
            // multiply the basis polynomial by (x - x_j)
            let mut next = vec![Ratio::<BigInt>::zero(); basis.len() + 1];
            for (k, coeff) in basis.iter().enumerate() {
                next[k] = &next[k] - &(coeff * &x_j);
                next[k + 1] = &next[k + 1] + coeff;
            }
            basis = next;
            denominator = denominator * (Ratio::from_integer(point_i.x.clone()) - x_j);
        }
        let scale = Ratio::from_integer(point_i.y.clone()) / denominator;
        for (k, coeff) in basis.iter().enumerate() {
            accumulated[k] = &accumulated[k] + &(coeff * &scale);
        }
    }

    // round to the nearest integer; arithmetic was exact, so a residual can
    // only mean the points do not lie on one integer polynomial
    let mut coeffs = Vec::with_capacity(order + 1);
    for coeff in accumulated.into_iter().rev() {
        let rounded = coeff.round();
        if coeff != rounded {
            return Err(SharingError::InconsistentShares);
        }
        coeffs.push(rounded.to_integer());
    }
    let polynomial = Polynomial::from_coefficients(coeffs)?;

    if !polynomial.matches_samples(&points[order + 1..]) {
        return Err(SharingError::InconsistentShares);
    }
    Ok(polynomial)
}
