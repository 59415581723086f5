//! # phirac-engine
//!
//! End-to-end compression: count a model, cut the input into horizon-sized
//! batches, code each batch into one phi-adic angle and pack the result.
//!
//! - `Compressor`: configured pipeline over any `Symbol` type
//! - `tokenize`: bytes and lossless word/separator runs
//! - `inspect`: container summary without knowing its symbol type upfront

pub mod compressor;
pub mod tokenize;

pub use compressor::{inspect, CompressionStats, Compressor};
pub use tokenize::{join_words, tokenize_bytes, tokenize_words};
