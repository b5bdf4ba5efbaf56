use thiserror::Error;

use crate::error::ApiError;

/// Largest integer a JSON client can round-trip through an IEEE double.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

#[derive(Debug, Error, PartialEq)]
pub enum MathError {
    #[error("Numbers array cannot be empty")]
    Empty,

    #[error("LCM would exceed safe integer range")]
    Overflow,

    #[error("Number would exceed safe integer range")]
    UnsafeInteger,
}

impl From<MathError> for ApiError {
    fn from(err: MathError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple of all `numbers`; any zero makes the result zero.
/// Results above `MAX_SAFE_INTEGER` are rejected like `increment` does.
pub fn lcm(numbers: &[u64]) -> Result<u64, MathError> {
    let (&first, rest) = numbers.split_first().ok_or(MathError::Empty)?;

    let result = rest.iter().try_fold(first, |acc, &n| {
        if acc == 0 || n == 0 {
            return Ok(0);
        }
        (acc / gcd(acc, n)).checked_mul(n).ok_or(MathError::Overflow)
    })?;

    if result > MAX_SAFE_INTEGER as u64 {
        return Err(MathError::Overflow);
    }
    Ok(result)
}

pub fn increment(number: i64) -> Result<i64, MathError> {
    number
        .checked_add(1)
        .filter(|next| (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(next))
        .ok_or(MathError::UnsafeInteger)
}
