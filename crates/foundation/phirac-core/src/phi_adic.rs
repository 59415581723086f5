//! PhiAdicNumber - exact fractions in base φ
//!
//! A value in [0,1) written as `Σ dᵢ · φ^-(i+1)` with `dᵢ ∈ {0,1}`:
//!
//! ```text
//! 0.1001φ  =  φ⁻¹ + φ⁻⁴  ≈ 0.7639
//!   │  │
//!   │  └── digit 3 → φ⁻⁴
//!   └───── digit 0 → φ⁻¹
//! ```
//!
//! Canonical form forbids two adjacent 1s. Because `φ⁻ⁿ + φ⁻⁽ⁿ⁺¹⁾ = φ⁻⁽ⁿ⁻¹⁾`,
//! any adjacency can be carried upward, and the canonical string of a value
//! is unique. For canonical strings, lexicographic order equals numeric
//! order, so comparison never needs floating point.

use crate::{Error, Result};
use std::cmp::Ordering;
use std::f64::consts::TAU;
use std::fmt;

/// The golden ratio
pub const PHI: f64 = 1.618_033_988_749_895;

/// 1/φ = φ - 1
pub const PHI_INV: f64 = 0.618_033_988_749_895;

/// Digit budget used by `from_float` when the caller has no preference
pub const DEFAULT_FLOAT_DIGITS: usize = 64;

/// Restore the non-adjacency invariant after a digit was pushed.
///
/// Assumes `digits[..len-1]` is canonical and the last digit is 0 or 1.
/// Each `…011` becomes `…100`; the carry walks upward until it lands next
/// to a zero. A carry out of digit 0 would make the value ≥ 1.
pub fn canonicalize_tail(digits: &mut [u8]) -> Result<()> {
    let Some(mut i) = digits.len().checked_sub(1) else {
        return Ok(());
    };
    if digits[i] != 1 {
        return Ok(());
    }

    // Find where the carry stops before touching anything, so an overflow
    // leaves the buffer as it was
    let mut stop = i;
    while stop > 0 && digits[stop - 1] == 1 {
        if stop == 1 {
            return Err(Error::RangeError(
                "carry past the radix point: value would reach 1".into(),
            ));
        }
        stop -= 2;
    }

    while i > stop {
        digits[i] = 0;
        digits[i - 1] = 0;
        // digits[i - 2] is 0 because the prefix was canonical
        digits[i - 2] = 1;
        i -= 2;
    }
    Ok(())
}

/// Exact base-φ fraction in [0,1)
///
/// The buffer may carry trailing zeros while it grows; equality, ordering
/// and `digits()` only look at the significant part.
#[derive(Debug, Clone, Default)]
pub struct PhiAdicNumber {
    digits: Vec<u8>,
}

impl PhiAdicNumber {
    /// Zero
    pub fn new() -> Self {
        Self { digits: Vec::new() }
    }

    /// Empty number with room for `n` digits
    pub fn with_capacity(n: usize) -> Self {
        Self {
            digits: Vec::with_capacity(n),
        }
    }

    /// Build from a digit string that must already be canonical
    pub fn from_digits(digits: Vec<u8>) -> Result<Self> {
        if let Some(pos) = digits.iter().position(|&d| d > 1) {
            return Err(Error::RangeError(format!(
                "digit {} at position {} is not 0 or 1",
                digits[pos], pos
            )));
        }
        if let Some(pos) = digits.windows(2).position(|w| w[0] == 1 && w[1] == 1) {
            return Err(Error::RangeError(format!(
                "adjacent nonzero digits at positions {} and {}",
                pos,
                pos + 1
            )));
        }
        Ok(Self { digits })
    }

    /// Greedy expansion of `x` truncated to `max_digits` digits
    pub fn from_float(x: f64, max_digits: usize) -> Result<Self> {
        if !(0.0..1.0).contains(&x) {
            return Err(Error::RangeError(format!("{} is outside [0, 1)", x)));
        }

        let mut number = Self::with_capacity(max_digits);
        let mut remaining = x;
        let mut weight = PHI_INV;
        let mut previous = 0u8;

        for _ in 0..max_digits {
            if remaining <= 0.0 {
                break;
            }
            let digit = if previous == 0 && remaining >= weight { 1 } else { 0 };
            if digit == 1 {
                remaining -= weight;
            }
            number.append_digit(digit)?;
            previous = digit;
            weight *= PHI_INV;
        }

        number.trim();
        Ok(number)
    }

    /// Grow by one less-significant digit, carrying if it creates `11`
    pub fn append_digit(&mut self, digit: u8) -> Result<()> {
        if digit > 1 {
            return Err(Error::RangeError(format!("digit {} is not 0 or 1", digit)));
        }
        self.digits.push(digit);
        if let Err(e) = canonicalize_tail(&mut self.digits) {
            self.digits.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Significant digits (no trailing zeros)
    pub fn digits(&self) -> &[u8] {
        let end = self
            .digits
            .iter()
            .rposition(|&d| d != 0)
            .map_or(0, |p| p + 1);
        &self.digits[..end]
    }

    /// Number of significant digits
    pub fn len(&self) -> usize {
        self.digits().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_zero(&self) -> bool {
        self.is_empty()
    }

    /// Drop trailing zeros from the buffer
    pub fn trim(&mut self) {
        let len = self.len();
        self.digits.truncate(len);
    }

    /// Finished, trimmed form
    pub fn finalize(mut self) -> Self {
        self.trim();
        self.digits.shrink_to_fit();
        self
    }

    /// Lossy value for diagnostics
    pub fn to_float(&self) -> f64 {
        let mut value = 0.0;
        let mut weight = PHI_INV;
        for &d in self.digits() {
            if d == 1 {
                value += weight;
            }
            weight *= PHI_INV;
        }
        value
    }

    /// Lossy angle in radians, in [0, 2π)
    pub fn to_radians(&self) -> f64 {
        self.to_float() * TAU
    }

    /// Map this fraction linearly into `[low, high)`
    pub fn scale_and_shift(&self, low: f64, high: f64) -> Result<f64> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(Error::RangeError(format!(
                "[{}, {}) is not a proper interval",
                low, high
            )));
        }
        Ok(low + self.to_float() * (high - low))
    }

    /// Exact sum, failing with `RangeError` when it reaches 1
    ///
    /// Digits are added position-wise and then normalized with
    /// `0200 → 1001` (2φ⁻ⁿ = φ⁻⁽ⁿ⁻¹⁾ + φ⁻⁽ⁿ⁺²⁾) and `011 → 100`.
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        let (a, b) = (self.digits(), other.digits());
        let mut d = vec![0u8; a.len().max(b.len())];
        for (i, x) in a.iter().enumerate() {
            d[i] += x;
        }
        for (i, x) in b.iter().enumerate() {
            d[i] += x;
        }

        let overflow = || Error::RangeError("sum is not below 1".into());
        loop {
            let mut changed = false;
            for i in 0..d.len() {
                if d[i] >= 2 {
                    if i == 0 {
                        return Err(overflow());
                    }
                    if i + 2 >= d.len() {
                        d.resize(i + 3, 0);
                    }
                    d[i] -= 2;
                    d[i - 1] += 1;
                    d[i + 2] += 1;
                    changed = true;
                } else if d[i] == 1 && d.get(i + 1).is_some_and(|&n| n >= 1) {
                    if i == 0 {
                        return Err(overflow());
                    }
                    d[i] -= 1;
                    d[i + 1] -= 1;
                    d[i - 1] += 1;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Ok(Self { digits: d }.finalize())
    }

    /// Exact digit-wise comparison
    pub fn compare(&self, other: &Self) -> Ordering {
        let a = self.digits();
        let b = other.digits();
        for i in 0..a.len().max(b.len()) {
            let da = a.get(i).copied().unwrap_or(0);
            let db = b.get(i).copied().unwrap_or(0);
            match da.cmp(&db) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialEq for PhiAdicNumber {
    fn eq(&self, other: &Self) -> bool {
        self.digits() == other.digits()
    }
}

impl Eq for PhiAdicNumber {}

impl PartialOrd for PhiAdicNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PhiAdicNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for PhiAdicNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0.")?;
        if self.is_zero() {
            write!(f, "0")?;
        }
        for d in self.digits() {
            write!(f, "{}", d)?;
        }
        write!(f, "φ")
    }
}
