//! # phirac-codec
//!
//! The coding passes: a radial arithmetic coder over phi-adic digits and the
//! horizon batcher that keeps each pass bounded.
//!
//! ```text
//!   symbols ──split(H)──▶ [batch 0] [batch 1] … [batch n]
//!                             │         │           │      (rayon, independent)
//!                          encode    encode      encode
//!                             ▼         ▼           ▼
//!                          angle₀    angle₁  …   angleₙ    PhiAdicNumber + count
//! ```

pub mod batcher;
pub mod coder;

pub use batcher::{decode_batch, encode_batch, Batch, DecodedBatch, EncodedBatch, HorizonBatcher};
pub use coder::{
    CoderState, CodingInterval, RadialArithmeticCoder, RadialDecoder, RadialEncoder, MIN_RANGE,
    WINDOW_DIGITS,
};
