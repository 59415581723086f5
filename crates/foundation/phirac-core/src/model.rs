//! ProbabilityModel - validated symbol → probability table
//!
//! Iteration order is part of the model. The arc table is laid out in
//! exactly this order, so an encoder and a decoder that disagree on order
//! produce different arcs for the same probabilities. The container stores
//! entries in this order for that reason.

use crate::arc::PROBABILITY_TOTAL;
use crate::{Error, Result, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Allowed distance of the probability sum from 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Whether a compression job shares one model or builds one per batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelScope {
    /// One model for the whole job, stored once
    #[default]
    Global,
    /// Each batch carries its own model
    PerBatch,
}

impl fmt::Display for ModelScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelScope::Global => write!(f, "global"),
            ModelScope::PerBatch => write!(f, "per_batch"),
        }
    }
}

impl FromStr for ModelScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "global" => Ok(ModelScope::Global),
            "per_batch" | "batch" => Ok(ModelScope::PerBatch),
            other => Err(Error::ConfigError(format!("unknown model scope '{}'", other))),
        }
    }
}

/// Order in which `from_symbols` lays out the symbols it counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolOrder {
    /// Order of first occurrence in the input
    #[default]
    FirstSeen,
    /// Ascending by the symbol's own ordering
    Sorted,
}

impl FromStr for SymbolOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "first_seen" => Ok(SymbolOrder::FirstSeen),
            "sorted" => Ok(SymbolOrder::Sorted),
            other => Err(Error::ConfigError(format!("unknown symbol order '{}'", other))),
        }
    }
}

/// Static probability table with a significant iteration order
///
/// Every probability is in (0, 1] and the total is within
/// [`PROBABILITY_TOLERANCE`] of 1. An empty model is valid (it describes an
/// empty input) but cannot drive the coder.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityModel<S: Symbol> {
    entries: Vec<(S, f64)>,
}

impl<S: Symbol> ProbabilityModel<S> {
    /// Validate and wrap an ordered table
    pub fn new(entries: Vec<(S, f64)>) -> Result<Self> {
        Self::validate(&entries)?;
        Ok(Self { entries })
    }

    /// Start an explicit table
    pub fn builder() -> ProbabilityModelBuilder<S> {
        ProbabilityModelBuilder::default()
    }

    /// Count occurrences and turn them into `count / total` probabilities
    pub fn from_symbols(symbols: &[S], order: SymbolOrder) -> Result<Self> {
        let mut counts: HashMap<&S, u64> = HashMap::new();
        let mut first_seen: Vec<&S> = Vec::new();
        for s in symbols {
            let count = counts.entry(s).or_insert(0);
            if *count == 0 {
                first_seen.push(s);
            }
            *count += 1;
        }

        if order == SymbolOrder::Sorted {
            first_seen.sort();
        }

        let total = symbols.len() as f64;
        let entries = first_seen
            .into_iter()
            .map(|s| (s.clone(), counts[s] as f64 / total))
            .collect();
        Self::new(entries)
    }

    fn validate(entries: &[(S, f64)]) -> Result<()> {
        if entries.len() as u64 > PROBABILITY_TOTAL {
            return Err(Error::ModelError(format!(
                "{} symbols exceeds the limit of {}",
                entries.len(),
                PROBABILITY_TOTAL
            )));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        let mut sum = 0.0;
        for (symbol, p) in entries {
            if !p.is_finite() || *p <= 0.0 || *p > 1.0 {
                return Err(Error::ModelError(format!(
                    "probability {} for {:?} is not in (0, 1]",
                    p, symbol
                )));
            }
            if !seen.insert(symbol) {
                return Err(Error::ModelError(format!("duplicate symbol {:?}", symbol)));
            }
            sum += p;
        }

        if !entries.is_empty() && (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(Error::ModelError(format!(
                "probabilities sum to {}, expected 1",
                sum
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in model order
    pub fn iter(&self) -> impl Iterator<Item = (&S, f64)> + '_ {
        self.entries.iter().map(|(s, p)| (s, *p))
    }

    /// Symbols in model order
    pub fn symbols(&self) -> Vec<S> {
        self.entries.iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn probability(&self, symbol: &S) -> Option<f64> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, p)| *p)
    }

    /// Shannon entropy in bits per symbol
    pub fn entropy_bits(&self) -> f64 {
        self.entries
            .iter()
            .map(|(_, p)| -p * p.log2())
            .sum()
    }
}

/// Fallible builder for explicit tables
#[derive(Debug, Clone)]
pub struct ProbabilityModelBuilder<S: Symbol> {
    entries: Vec<(S, f64)>,
}

impl<S: Symbol> Default for ProbabilityModelBuilder<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: Symbol> ProbabilityModelBuilder<S> {
    /// Append a symbol; position in the table follows call order
    pub fn symbol(mut self, symbol: S, probability: f64) -> Self {
        self.entries.push((symbol, probability));
        self
    }

    pub fn build(self) -> Result<ProbabilityModel<S>> {
        ProbabilityModel::new(self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> ProbabilityModel<u8> {
        ProbabilityModel::builder()
            .symbol(b'A', 0.5)
            .symbol(b'B', 0.25)
            .symbol(b'C', 0.25)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_keeps_order() {
        let model = abc();
        assert_eq!(model.symbols(), vec![b'A', b'B', b'C']);
        assert_eq!(model.probability(&b'B'), Some(0.25));
        assert_eq!(model.probability(&b'Z'), None);
    }

    #[test]
    fn test_rejects_bad_probabilities() {
        let zero = ProbabilityModel::builder().symbol(1u8, 0.0).symbol(2u8, 1.0).build();
        assert!(matches!(zero, Err(Error::ModelError(_))));

        let unnormalized = ProbabilityModel::builder().symbol(1u8, 0.5).symbol(2u8, 0.4).build();
        assert!(matches!(unnormalized, Err(Error::ModelError(_))));

        let nan = ProbabilityModel::builder().symbol(1u8, f64::NAN).build();
        assert!(nan.is_err());

        let dup = ProbabilityModel::builder().symbol(1u8, 0.5).symbol(1u8, 0.5).build();
        assert!(matches!(dup, Err(Error::ModelError(_))));
    }

    #[test]
    fn test_tolerance() {
        let close = ProbabilityModel::builder()
            .symbol(1u8, 0.5)
            .symbol(2u8, 0.5 + PROBABILITY_TOLERANCE / 2.0)
            .build();
        assert!(close.is_ok());
    }

    #[test]
    fn test_from_symbols_first_seen() {
        let model = ProbabilityModel::from_symbols(&b"ABAC"[..], SymbolOrder::FirstSeen).unwrap();
        assert_eq!(model, abc());
    }

    #[test]
    fn test_from_symbols_sorted() {
        let model = ProbabilityModel::from_symbols(&b"CABA"[..], SymbolOrder::Sorted).unwrap();
        assert_eq!(model.symbols(), vec![b'A', b'B', b'C']);
    }

    #[test]
    fn test_empty_model() {
        let model = ProbabilityModel::<u8>::from_symbols(&[], SymbolOrder::FirstSeen).unwrap();
        assert!(model.is_empty());
        assert_eq!(model.entropy_bits(), 0.0);
    }

    #[test]
    fn test_entropy() {
        assert!((abc().entropy_bits() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("per-batch".parse::<ModelScope>().unwrap(), ModelScope::PerBatch);
        assert_eq!("GLOBAL".parse::<ModelScope>().unwrap(), ModelScope::Global);
        assert!("adaptive".parse::<ModelScope>().is_err());
        assert_eq!("sorted".parse::<SymbolOrder>().unwrap(), SymbolOrder::Sorted);
    }
}
