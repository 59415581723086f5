//! ArcTable - the circle carved into one arc per symbol
//!
//! ```text
//!            0 ──── A ────┐
//!           ╱              ╲        A: [0,   π)
//!          │                │       B: [π,  3π/2)
//!           ╲   C       B  ╱        C: [3π/2, 2π)
//!            └────────────┘
//! ```
//!
//! Cumulative probabilities are quantized to integers over
//! [`PROBABILITY_TOTAL`] so that encoder and decoder narrow the coding
//! interval with identical integer arithmetic. The f64 angles are derived
//! from the same integers and exist for lookup by angle and for display.

use crate::{Error, ProbabilityModel, Result, Symbol};
use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;

/// Precision of the quantized cumulative distribution
pub const PROBABILITY_BITS: u32 = 24;

/// Full circle in quantized units
pub const PROBABILITY_TOTAL: u64 = 1 << PROBABILITY_BITS;

/// One symbol's share of the circle, `[cum_low, cum_high)` in quantized units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arc<S> {
    pub symbol: S,
    pub cum_low: u32,
    pub cum_high: u32,
}

impl<S> Arc<S> {
    /// Quantized width, always at least 1
    pub fn frequency(&self) -> u32 {
        self.cum_high - self.cum_low
    }

    pub fn start_angle(&self) -> f64 {
        TAU * self.cum_low as f64 / PROBABILITY_TOTAL as f64
    }

    pub fn end_angle(&self) -> f64 {
        TAU * self.cum_high as f64 / PROBABILITY_TOTAL as f64
    }
}

/// Ordered, contiguous arcs covering [0, 2π)
#[derive(Debug, Clone)]
pub struct ArcTable<S: Symbol> {
    arcs: Vec<Arc<S>>,
    index: HashMap<S, usize>,
}

impl<S: Symbol> ArcTable<S> {
    /// Lay out arcs in the model's own order
    pub fn build(model: &ProbabilityModel<S>) -> Result<Self> {
        let entries: Vec<(S, f64)> = model.iter().map(|(s, p)| (s.clone(), p)).collect();
        Self::from_entries(entries)
    }

    /// Lay out arcs in a caller-supplied order
    ///
    /// `order` must name every model symbol exactly once. Decoding with a
    /// table built in a different order than the one used for encoding does
    /// not fail reliably; it usually yields different symbols.
    pub fn build_ordered(model: &ProbabilityModel<S>, order: &[S]) -> Result<Self> {
        if order.len() != model.len() {
            return Err(Error::ModelError(format!(
                "order names {} symbols, model has {}",
                order.len(),
                model.len()
            )));
        }

        let mut seen = HashSet::with_capacity(order.len());
        let mut entries = Vec::with_capacity(order.len());
        for symbol in order {
            if !seen.insert(symbol) {
                return Err(Error::ModelError(format!(
                    "symbol {:?} appears twice in order",
                    symbol
                )));
            }
            let p = model.probability(symbol).ok_or_else(|| {
                Error::ModelError(format!("ordered symbol {:?} is not in the model", symbol))
            })?;
            entries.push((symbol.clone(), p));
        }
        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<(S, f64)>) -> Result<Self> {
        let probabilities: Vec<f64> = entries.iter().map(|(_, p)| *p).collect();
        let bounds = quantize(&probabilities)?;

        let mut arcs = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for (i, (symbol, _)) in entries.into_iter().enumerate() {
            index.insert(symbol.clone(), i);
            arcs.push(Arc {
                symbol,
                cum_low: bounds[i],
                cum_high: bounds[i + 1],
            });
        }
        Ok(Self { arcs, index })
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    pub fn arcs(&self) -> &[Arc<S>] {
        &self.arcs
    }

    pub fn arc(&self, i: usize) -> Option<&Arc<S>> {
        self.arcs.get(i)
    }

    /// Position of a symbol in table order
    pub fn index_of(&self, symbol: &S) -> Result<usize> {
        self.index
            .get(symbol)
            .copied()
            .ok_or_else(|| Error::UnknownSymbolError(format!("{:?}", symbol)))
    }

    /// Start and end angle of a symbol's arc
    pub fn arc_of(&self, symbol: &S) -> Result<(f64, f64)> {
        let arc = &self.arcs[self.index_of(symbol)?];
        Ok((arc.start_angle(), arc.end_angle()))
    }

    /// Symbol whose arc contains `angle`
    pub fn locate(&self, angle: f64) -> Result<&S> {
        if self.arcs.is_empty() {
            return Err(Error::EmptyAlphabetError);
        }
        if !(0.0..TAU).contains(&angle) {
            return Err(Error::RangeError(format!("angle {} is outside [0, 2π)", angle)));
        }
        let position = angle / TAU * PROBABILITY_TOTAL as f64;
        let i = self
            .arcs
            .partition_point(|a| (a.cum_high as f64) <= position)
            .min(self.arcs.len() - 1);
        Ok(&self.arcs[i].symbol)
    }

    /// Index of the arc owning `offset` once the circle is scaled to `range`
    ///
    /// Arc `i` owns `[scaled_bound(cum_low, range), scaled_bound(cum_high, range))`.
    /// Returns `None` when `offset` is not below `range`.
    pub fn locate_offset(&self, offset: u64, range: u64) -> Option<usize> {
        let i = self
            .arcs
            .partition_point(|a| scaled_bound(a.cum_high, range) <= offset);
        (i < self.arcs.len()).then_some(i)
    }
}

/// `⌊range · cum / PROBABILITY_TOTAL⌋` without overflow
#[inline]
pub fn scaled_bound(cum: u32, range: u64) -> u64 {
    ((range as u128 * cum as u128) >> PROBABILITY_BITS) as u64
}

/// Cumulative bounds `cum_0 = 0 < cum_1 < … < cum_n = PROBABILITY_TOTAL`
///
/// Each bound is the rounded prefix sum, pushed up so every symbol keeps at
/// least one unit, then pulled down so the last bound lands exactly on the
/// total.
fn quantize(probabilities: &[f64]) -> Result<Vec<u32>> {
    let n = probabilities.len();
    if n as u64 > PROBABILITY_TOTAL {
        return Err(Error::ModelError(format!(
            "{} symbols cannot be quantized into {} units",
            n, PROBABILITY_TOTAL
        )));
    }
    if n == 0 {
        return Ok(vec![0]);
    }

    let total = PROBABILITY_TOTAL as f64;
    let mut bounds = vec![0u64; n + 1];
    let mut prefix = 0.0;
    for i in 1..n {
        prefix += probabilities[i - 1];
        let rounded = (prefix * total).round().clamp(0.0, total) as u64;
        bounds[i] = rounded.max(bounds[i - 1] + 1);
    }
    bounds[n] = PROBABILITY_TOTAL;
    for i in (1..n).rev() {
        bounds[i] = bounds[i].min(bounds[i + 1] - 1);
    }

    Ok(bounds.into_iter().map(|b| b as u32).collect())
}
