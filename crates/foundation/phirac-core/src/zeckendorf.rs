//! Zeckendorf ranks of canonical digit windows
//!
//! A window of `k` canonical phi-adic digits (no two adjacent 1s) is one of
//! `F(k+2)` strings. Listed lexicographically they are also listed in
//! increasing phi-adic value, so each window has an integer rank:
//!
//! ```text
//! k = 3:   000 001 010 100 101
//! rank:     0   1   2   3   4      weights (top → bottom) F(4) F(3) F(2) = 3 2 1
//! ```
//!
//! The coder keeps its live interval in rank space. Appending a `0` digit to
//! every string of a rank interval maps `Σ F(eᵢ)` to `Σ F(eᵢ + 1)`.

/// Largest Fibonacci index that fits in u64
pub const MAX_FIB_INDEX: usize = 93;

/// Fibonacci numbers with F(0) = 0, F(1) = F(2) = 1
pub const FIB: [u64; MAX_FIB_INDEX + 1] = build_fib();

const fn build_fib() -> [u64; MAX_FIB_INDEX + 1] {
    let mut table = [0u64; MAX_FIB_INDEX + 1];
    table[1] = 1;
    let mut i = 2;
    while i <= MAX_FIB_INDEX {
        table[i] = table[i - 1] + table[i - 2];
        i += 1;
    }
    table
}

/// Longest window whose ranks (and one extension) stay inside u64
pub const MAX_WINDOW_DIGITS: usize = MAX_FIB_INDEX - 4;

/// Number of canonical strings of `k` digits
#[inline]
pub fn window_size(k: usize) -> u64 {
    FIB[k + 2]
}

/// Rank of a canonical digit window (index 0 is the most significant digit)
pub fn rank(digits: &[u8]) -> u64 {
    let k = digits.len();
    debug_assert!(k <= MAX_WINDOW_DIGITS);
    digits
        .iter()
        .enumerate()
        .filter(|(_, d)| **d != 0)
        .map(|(i, _)| FIB[k + 1 - i])
        .sum()
}

/// Canonical `k`-digit window with the given rank
pub fn unrank(mut rank: u64, k: usize) -> Vec<u8> {
    debug_assert!(rank < window_size(k));
    let mut digits = vec![0u8; k];
    let mut i = 0;
    while i < k {
        let weight = FIB[k + 1 - i];
        if rank >= weight {
            digits[i] = 1;
            rank -= weight;
            // The following digit is forced to zero
            i += 2;
        } else {
            i += 1;
        }
    }
    digits
}

/// Rank after appending a `0` digit to the window
///
/// Also maps the one-past-the-end rank `F(k+2)` to `F(k+3)`, so exclusive
/// interval bounds extend correctly.
pub fn shift(mut rank: u64) -> u64 {
    let mut out = 0u64;
    let mut i = MAX_FIB_INDEX - 2;
    while rank > 0 && i >= 2 {
        if FIB[i] <= rank {
            rank -= FIB[i];
            out += FIB[i + 1];
            i = i.saturating_sub(2);
        } else {
            i -= 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_strings(k: usize) -> Vec<Vec<u8>> {
        (0u32..(1 << k))
            .map(|bits| (0..k).map(|i| ((bits >> (k - 1 - i)) & 1) as u8).collect::<Vec<u8>>())
            .filter(|d| !d.windows(2).any(|w| w[0] == 1 && w[1] == 1))
            .collect()
    }

    #[test]
    fn test_fib_table() {
        assert_eq!(FIB[10], 55);
        assert_eq!(FIB[88], 1_100_087_778_366_101_931);
        assert_eq!(FIB[93], 12_200_160_415_121_876_738);
    }

    #[test]
    fn test_window_size_counts_canonical_strings() {
        for k in 1..12 {
            assert_eq!(canonical_strings(k).len() as u64, window_size(k));
        }
    }

    #[test]
    fn test_rank_matches_lexicographic_order() {
        // canonical_strings enumerates in lexicographic order
        let strings = canonical_strings(10);
        for (expected, s) in strings.iter().enumerate() {
            assert_eq!(rank(s), expected as u64);
            assert_eq!(&unrank(expected as u64, 10), s);
        }
    }

    #[test]
    fn test_shift_appends_zero() {
        for s in canonical_strings(9) {
            let mut extended = s.clone();
            extended.push(0);
            assert_eq!(shift(rank(&s)), rank(&extended));
        }
    }

    #[test]
    fn test_shift_end_sentinel() {
        for k in 1..80 {
            assert_eq!(shift(window_size(k)), window_size(k + 1));
        }
        assert_eq!(shift(0), 0);
    }

    #[test]
    fn test_wide_window_roundtrip() {
        let k = 86;
        let r = window_size(k) - 12_345;
        assert_eq!(rank(&unrank(r, k)), r);
    }
}
