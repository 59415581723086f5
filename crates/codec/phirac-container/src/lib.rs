//! # phirac-container
//!
//! The serialized form of a compression job: the probability model(s) and
//! every batch's angle digits, round-tripped without loss.
//!
//! ```text
//! ┌──────┬───┬─────┬──────┬─────────┬─────────┬────────┬──────────────────────────┐
//! │ PHIR │ v │flags│ kind │ horizon │ [model] │ batches│ [model] count digits … │
//! └──────┴───┴─────┴──────┴─────────┴─────────┴────────┴──────────────────────────┘
//!   4      1    1     1      u32       global    u32     per batch (repeated)
//! ```
//!
//! Model entries are stored in arc-table order. A decoder that rebuilds the
//! table in any other order gets different arcs and therefore different
//! output, so the order on disk is as significant as the probabilities.

mod wire;

use phirac_codec::EncodedBatch;
use phirac_core::{Error, ModelScope, ProbabilityModel, Result, Symbol};
use serde::Serialize;
use wire::{Reader, Writer};

/// File magic
pub const MAGIC: &[u8; 4] = b"PHIR";

/// Container format version
pub const VERSION: u8 = 1;

const FLAG_PER_BATCH_MODELS: u8 = 0x01;

const HEADER_LEN: usize = 4 + 1 + 1 + 1 + 4;

/// Fixed-size fields at the start of every container
#[derive(Debug, Clone, Copy)]
struct Header {
    scope: ModelScope,
    kind: u8,
    horizon: u32,
}

/// Probability model(s) plus the ordered list of coded batches
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedData<S: Symbol> {
    horizon: u32,
    scope: ModelScope,
    models: Vec<ProbabilityModel<S>>,
    batches: Vec<EncodedBatch>,
}

impl<S: Symbol> CompressedData<S> {
    /// One model shared by every batch
    pub fn pack(
        model: ProbabilityModel<S>,
        batches: Vec<EncodedBatch>,
        horizon: usize,
    ) -> Result<Self> {
        Self::checked(ModelScope::Global, vec![model], batches, horizon)
    }

    /// One model per batch, `models[i]` coding `batches[i]`
    pub fn pack_per_batch(
        models: Vec<ProbabilityModel<S>>,
        batches: Vec<EncodedBatch>,
        horizon: usize,
    ) -> Result<Self> {
        if models.len() != batches.len() {
            return Err(Error::FormatError(format!(
                "{} models for {} batches",
                models.len(),
                batches.len()
            )));
        }
        Self::checked(ModelScope::PerBatch, models, batches, horizon)
    }

    fn checked(
        scope: ModelScope,
        models: Vec<ProbabilityModel<S>>,
        batches: Vec<EncodedBatch>,
        horizon: usize,
    ) -> Result<Self> {
        let horizon = u32::try_from(horizon)
            .ok()
            .filter(|h| *h > 0)
            .ok_or_else(|| Error::FormatError(format!("horizon {} does not fit", horizon)))?;

        for (i, batch) in batches.iter().enumerate() {
            if batch.count > horizon as usize {
                return Err(Error::FormatError(format!(
                    "batch {} holds {} symbols, horizon is {}",
                    i, batch.count, horizon
                )));
            }
            if batch.angle.len() > u32::MAX as usize {
                return Err(Error::FormatError(format!(
                    "batch {} has too many digits to store",
                    i
                )));
            }
        }

        let data = Self {
            horizon,
            scope,
            models,
            batches,
        };
        for (i, batch) in data.batches.iter().enumerate() {
            if batch.count > 0 && data.model_for(i).map_or(true, |m| m.is_empty()) {
                return Err(Error::FormatError(format!(
                    "batch {} holds {} symbols but its model is empty",
                    i, batch.count
                )));
            }
        }
        Ok(data)
    }

    pub fn horizon(&self) -> usize {
        self.horizon as usize
    }

    pub fn scope(&self) -> ModelScope {
        self.scope
    }

    pub fn models(&self) -> &[ProbabilityModel<S>] {
        &self.models
    }

    pub fn batches(&self) -> &[EncodedBatch] {
        &self.batches
    }

    /// Model that codes batch `index`
    pub fn model_for(&self, index: usize) -> Option<&ProbabilityModel<S>> {
        match self.scope {
            ModelScope::Global => self.models.first(),
            ModelScope::PerBatch => self.models.get(index),
        }
    }

    /// Symbols across all batches
    pub fn symbol_count(&self) -> usize {
        self.batches.iter().map(|b| b.count).sum()
    }

    /// Phi-adic digits across all batches
    pub fn digit_count(&self) -> usize {
        self.batches.iter().map(|b| b.angle.len()).sum()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.bytes(MAGIC);
        w.u8(VERSION);
        w.u8(match self.scope {
            ModelScope::Global => 0,
            ModelScope::PerBatch => FLAG_PER_BATCH_MODELS,
        });
        w.u8(S::KIND);
        w.u32(self.horizon);

        if self.scope == ModelScope::Global {
            if let Some(model) = self.models.first() {
                w.model(model);
            }
        }

        w.u32(self.batches.len() as u32);
        for (i, batch) in self.batches.iter().enumerate() {
            if self.scope == ModelScope::PerBatch {
                w.model(&self.models[i]);
            }
            w.u32(batch.count as u32);
            w.digits(&batch.angle);
        }
        w.finish()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let Header { scope, horizon, .. } = read_header(&mut r, Some(S::KIND))?;

        let mut models = Vec::new();
        if scope == ModelScope::Global {
            models.push(r.model()?);
        }

        let batch_count = r.u32("batch count")? as usize;
        // A batch needs at least 8 bytes of counts
        if batch_count > r.remaining() / 8 {
            return Err(Error::FormatError(format!(
                "{} batches cannot fit in {} bytes",
                batch_count,
                r.remaining()
            )));
        }

        let mut batches = Vec::with_capacity(batch_count);
        for i in 0..batch_count {
            if scope == ModelScope::PerBatch {
                models.push(r.model()?);
            }
            let count = r.u32("symbol count")? as usize;
            if count > horizon as usize {
                return Err(Error::FormatError(format!(
                    "batch {} claims {} symbols, horizon is {}",
                    i, count, horizon
                )));
            }
            let angle = r.digits()?;
            batches.push(EncodedBatch { angle, count });
        }

        if r.remaining() != 0 {
            return Err(Error::FormatError(format!(
                "{} trailing bytes after last batch",
                r.remaining()
            )));
        }

        Self::checked(scope, models, batches, horizon as usize)
    }

    /// Length of `to_bytes()`, computed from field widths
    pub fn encoded_len(&self) -> usize {
        let models: usize = self.models.iter().map(wire::model_len).sum();
        let batches: usize = self
            .batches
            .iter()
            .map(|b| 4 + wire::digits_len(&b.angle))
            .sum();
        HEADER_LEN + models + 4 + batches
    }

    /// Totals for display
    pub fn summary(&self) -> ContainerSummary {
        let model_symbols = self.models.iter().map(|m| m.len()).max().unwrap_or(0);
        let symbols = self.symbol_count();
        let digits = self.digit_count();
        let packed_bytes = self.encoded_len();
        ContainerSummary {
            version: VERSION,
            kind: kind_name(S::KIND).to_string(),
            scope: self.scope,
            horizon: self.horizon as usize,
            batches: self.batches.len(),
            models: self.models.len(),
            model_symbols,
            symbols,
            digits,
            packed_bytes,
            bits_per_symbol: if symbols == 0 {
                0.0
            } else {
                (packed_bytes * 8) as f64 / symbols as f64
            },
        }
    }
}

/// Inspectable totals of a container
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerSummary {
    pub version: u8,
    pub kind: String,
    pub scope: ModelScope,
    pub horizon: usize,
    pub batches: usize,
    pub models: usize,
    /// Largest alphabet among the stored models
    pub model_symbols: usize,
    pub symbols: usize,
    pub digits: usize,
    pub packed_bytes: usize,
    pub bits_per_symbol: f64,
}

impl std::fmt::Display for ContainerSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PHIR v{} ({} symbols)", self.version, self.kind)?;
        writeln!(f, "  scope:       {}", self.scope)?;
        writeln!(f, "  horizon:     {}", self.horizon)?;
        writeln!(f, "  batches:     {}", self.batches)?;
        writeln!(f, "  models:      {} (up to {} symbols)", self.models, self.model_symbols)?;
        writeln!(f, "  symbols:     {}", self.symbols)?;
        writeln!(f, "  digits:      {}", self.digits)?;
        writeln!(f, "  size:        {} bytes", self.packed_bytes)?;
        write!(f, "  rate:        {:.3} bits/symbol", self.bits_per_symbol)
    }
}

/// Symbol kind tag of a container, read from the header alone
pub fn peek_kind(bytes: &[u8]) -> Result<u8> {
    let mut r = Reader::new(bytes);
    Ok(read_header(&mut r, None)?.kind)
}

/// Human name of a symbol kind tag
pub fn kind_name(kind: u8) -> &'static str {
    match kind {
        phirac_core::KIND_BYTE => "byte",
        phirac_core::KIND_WORD => "word",
        phirac_core::KIND_BYTE_STRING => "byte-string",
        _ => "unknown",
    }
}

fn read_header(r: &mut Reader<'_>, expected_kind: Option<u8>) -> Result<Header> {
    if r.take(4, "magic")? != MAGIC {
        return Err(Error::FormatError("not a PHIR container".into()));
    }
    let version = r.u8("version")?;
    if version != VERSION {
        return Err(Error::FormatError(format!("unsupported version {}", version)));
    }

    let flags = r.u8("flags")?;
    if flags & !FLAG_PER_BATCH_MODELS != 0 {
        return Err(Error::FormatError(format!("unknown flags {:#04x}", flags)));
    }
    let scope = if flags & FLAG_PER_BATCH_MODELS != 0 {
        ModelScope::PerBatch
    } else {
        ModelScope::Global
    };

    let kind = r.u8("symbol kind")?;
    match expected_kind {
        Some(expected) if kind != expected => {
            return Err(Error::FormatError(format!(
                "container holds {} symbols, expected {}",
                kind_name(kind),
                kind_name(expected)
            )));
        }
        None if kind_name(kind) == "unknown" => {
            return Err(Error::FormatError(format!("unknown symbol kind {}", kind)));
        }
        _ => {}
    }

    let horizon = r.u32("horizon")?;
    if horizon == 0 {
        return Err(Error::FormatError("horizon is zero".into()));
    }
    Ok(Header {
        scope,
        kind,
        horizon,
    })
}
