//! HorizonBatcher - bounded, independent coding passes
//!
//! Each batch restarts the coder on the full circle, so the digits any one
//! pass has to emit grow with the horizon, not with the whole input.
//! Batches share nothing but the arc table, which makes them safe to run on
//! rayon's pool. Results are always reassembled in batch-index order.

use crate::RadialArithmeticCoder;
use phirac_core::{ArcTable, Error, PhiAdicNumber, Result, Symbol};
use rayon::prelude::*;

/// A slice of the input coded as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a, S> {
    pub index: usize,
    pub symbols: &'a [S],
}

/// One batch's committed angle and the number of symbols it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBatch {
    pub angle: PhiAdicNumber,
    pub count: usize,
}

/// Symbols recovered from one batch, tagged with its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBatch<S> {
    pub index: usize,
    pub symbols: Vec<S>,
}

/// Splits streams into horizon-sized batches and codes them
#[derive(Debug, Clone, Copy)]
pub struct HorizonBatcher {
    horizon: usize,
    parallel: bool,
}

impl HorizonBatcher {
    pub fn new(horizon: usize) -> Result<Self> {
        if horizon == 0 {
            return Err(Error::RangeError("horizon must be at least 1".into()));
        }
        Ok(Self {
            horizon,
            parallel: true,
        })
    }

    /// Run batches on the rayon pool (default) or one after another
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Runs of at most `horizon` symbols; only the last may be shorter
    pub fn split<'a, S>(&self, symbols: &'a [S]) -> Vec<Batch<'a, S>> {
        symbols
            .chunks(self.horizon)
            .enumerate()
            .map(|(index, symbols)| Batch { index, symbols })
            .collect()
    }

    /// Concatenate decoded batches, which must arrive as 0, 1, 2, …
    pub fn join<S>(&self, batches: Vec<DecodedBatch<S>>) -> Result<Vec<S>> {
        let total = batches.iter().map(|b| b.symbols.len()).sum();
        let mut out = Vec::with_capacity(total);
        for (expected, batch) in batches.into_iter().enumerate() {
            if batch.index != expected {
                return Err(Error::OrderError {
                    expected,
                    got: batch.index,
                });
            }
            out.extend(batch.symbols);
        }
        Ok(out)
    }

    /// Apply `f` to every item, in parallel when enabled, keeping input order
    pub fn map_ordered<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> Result<R> + Sync + Send,
    {
        if self.parallel && items.len() > 1 {
            items
                .par_iter()
                .enumerate()
                .map(|(i, item)| f(i, item))
                .collect()
        } else {
            items.iter().enumerate().map(|(i, item)| f(i, item)).collect()
        }
    }

    /// Split and encode against one shared table
    pub fn encode_all<S: Symbol>(
        &self,
        table: &ArcTable<S>,
        symbols: &[S],
    ) -> Result<Vec<EncodedBatch>> {
        let batches = self.split(symbols);
        self.map_ordered(&batches, |_, batch| encode_batch(table, batch))
    }

    /// Decode every batch against one shared table and join the results
    pub fn decode_all<S: Symbol>(
        &self,
        table: &ArcTable<S>,
        batches: &[EncodedBatch],
    ) -> Result<Vec<S>> {
        let decoded = self.map_ordered(batches, |index, batch| {
            decode_batch(table, index, batch)
        })?;
        self.join(decoded)
    }
}

/// Code one batch
pub fn encode_batch<S: Symbol>(table: &ArcTable<S>, batch: &Batch<'_, S>) -> Result<EncodedBatch> {
    let angle = RadialArithmeticCoder::new(table).encode(batch.symbols)?;
    tracing::debug!(
        "Encoded batch {}: {} symbols → {} digits",
        batch.index,
        batch.symbols.len(),
        angle.len()
    );
    Ok(EncodedBatch {
        angle,
        count: batch.symbols.len(),
    })
}

/// Recover one batch
pub fn decode_batch<S: Symbol>(
    table: &ArcTable<S>,
    index: usize,
    batch: &EncodedBatch,
) -> Result<DecodedBatch<S>> {
    let symbols = RadialArithmeticCoder::new(table).decode(&batch.angle, batch.count)?;
    tracing::debug!("Decoded batch {}: {} symbols", index, symbols.len());
    Ok(DecodedBatch { index, symbols })
}
