//! Weighted lottery sampler.
//!
//! Draws a uniform value in `[0, total)` and walks the candidates in their
//! given order, subtracting each weight until the remaining value falls inside
//! the current candidate. Equivalent to inverse-CDF sampling without a
//! prefix-sum array, so the caller's ordering is significant.

use crate::error::{ErrorKind, GachaError, GachaResult};
use rand::{CryptoRng, Rng};

/// Anything that can take part in a weighted draw.
pub trait Weighted {
    fn weight(&self) -> i64;
}

/// Select exactly one candidate.
///
/// The source must be cryptographically strong: a predictable draw is an
/// economic exploit.
pub fn draw<'a, T, R>(candidates: &'a [T], rng: &mut R) -> GachaResult<&'a T>
where
    T: Weighted,
    R: Rng + CryptoRng + ?Sized,
{
    let total = total_weight(candidates)?;
    let value = rng.gen_range(0..total);
    select(candidates, value)
}

/// Sum of all weights, validating each one.
pub fn total_weight<T: Weighted>(candidates: &[T]) -> GachaResult<i64> {
    if candidates.is_empty() {
        return Err(GachaError::with_message(
            ErrorKind::InvalidWeightConfig,
            "no candidates to draw from",
        ));
    }

    let mut total: i64 = 0;
    for candidate in candidates {
        let weight = candidate.weight();
        if weight <= 0 {
            return Err(GachaError::with_message(
                ErrorKind::InvalidWeightConfig,
                format!("candidate weight must be positive, got {}", weight),
            ));
        }
        total = total.checked_add(weight).ok_or_else(|| {
            GachaError::with_message(ErrorKind::InvalidWeightConfig, "total weight overflows")
        })?;
    }

    if total == 0 {
        return Err(GachaError::with_message(
            ErrorKind::InvalidWeightConfig,
            "total weight is zero",
        ));
    }
    Ok(total)
}

/// Map a value in `[0, total)` to its candidate slot.
fn select<T: Weighted>(candidates: &[T], mut value: i64) -> GachaResult<&T> {
    for candidate in candidates {
        let weight = candidate.weight();
        if value < weight {
            return Ok(candidate);
        }
        value -= weight;
    }
    Err(GachaError::unexpected(
        "lottery walk exhausted all candidates",
    ))
}
