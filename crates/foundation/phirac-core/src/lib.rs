//! # phirac-core
//!
//! Foundation types for radial arithmetic coding over the golden-ratio base.
//!
//! ```text
//!   ProbabilityModel ──build──▶ ArcTable ──▶ (coder narrows arcs)
//!        │                         │
//!        │   stored order ═════════╛  order is part of the contract
//!        ▼
//!   PhiAdicNumber  0.1001010φ  = φ⁻¹ + φ⁻⁴ + φ⁻⁶   (no two adjacent 1s)
//! ```
//!
//! - `PhiAdicNumber`: exact fractional value in [0,1) as canonical base-φ digits
//! - `ProbabilityModel`: validated symbol → probability table with stable order
//! - `ArcTable`: contiguous sub-arcs of the circle, quantized for exact coding
//! - `zeckendorf`: rank arithmetic over canonical digit windows

pub mod arc;
pub mod model;
pub mod phi_adic;
pub mod symbol;
pub mod zeckendorf;

pub use arc::{Arc, ArcTable, PROBABILITY_BITS, PROBABILITY_TOTAL};
pub use model::{ModelScope, ProbabilityModel, ProbabilityModelBuilder, SymbolOrder, PROBABILITY_TOLERANCE};
pub use phi_adic::{canonicalize_tail, PhiAdicNumber, DEFAULT_FLOAT_DIGITS, PHI, PHI_INV};
pub use symbol::{Symbol, KIND_BYTE, KIND_BYTE_STRING, KIND_WORD};

/// Result type for phirac operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while modeling, coding or (de)serializing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Invalid probability model: {0}")]
    ModelError(String),

    #[error("Cannot code with an empty alphabet")]
    EmptyAlphabetError,

    #[error("Symbol not present in model: {0}")]
    UnknownSymbolError(String),

    #[error("Value out of range: {0}")]
    RangeError(String),

    #[error("Corrupted coded data: {0}")]
    CorruptionError(String),

    #[error("Malformed container: {0}")]
    FormatError(String),

    #[error("Batch out of sequence: expected index {expected}, got {got}")]
    OrderError { expected: usize, got: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
