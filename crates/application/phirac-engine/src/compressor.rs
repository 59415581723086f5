//! Compressor - the full pipeline in both directions
//!
//! ```text
//! compress:    symbols ─▶ model(s) ─▶ ArcTable ─▶ HorizonBatcher ─▶ CompressedData
//! decompress:  CompressedData ─▶ stored model(s) ─▶ ArcTable ─▶ batches ─▶ symbols
//! ```

use crate::tokenize::{join_words, tokenize_bytes, tokenize_words};
use phirac_codec::{decode_batch, encode_batch, DecodedBatch, EncodedBatch, HorizonBatcher};
use phirac_config::{CodecConfig, Tokenizer};
use phirac_container::{kind_name, peek_kind, CompressedData, ContainerSummary};
use phirac_core::{
    ArcTable, Error, ModelScope, ProbabilityModel, Result, Symbol, KIND_BYTE, KIND_BYTE_STRING,
    KIND_WORD,
};
use serde::Serialize;

/// Sizes and rates of one compressed job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionStats {
    pub symbols: usize,
    pub batches: usize,
    pub digits: usize,
    pub packed_bytes: usize,
    /// Container bits per input symbol
    pub bits_per_symbol: f64,
    /// Empirical entropy of the stored model(s), in bits for the whole input
    pub entropy_bits: f64,
}

impl CompressionStats {
    pub fn from_container<S: Symbol>(data: &CompressedData<S>) -> Self {
        let symbols = data.symbol_count();
        let packed_bytes = data.encoded_len();
        let entropy_bits = data
            .batches()
            .iter()
            .enumerate()
            .map(|(i, b)| {
                data.model_for(i)
                    .map_or(0.0, |m| m.entropy_bits() * b.count as f64)
            })
            .sum();

        Self {
            symbols,
            batches: data.batches().len(),
            digits: data.digit_count(),
            packed_bytes,
            bits_per_symbol: if symbols == 0 {
                0.0
            } else {
                (packed_bytes * 8) as f64 / symbols as f64
            },
            entropy_bits,
        }
    }

    /// Packed size relative to an original size in bytes
    pub fn ratio(&self, original_bytes: usize) -> f64 {
        if original_bytes == 0 {
            0.0
        } else {
            self.packed_bytes as f64 / original_bytes as f64
        }
    }
}

/// Configured compression pipeline
#[derive(Debug, Clone, Default)]
pub struct Compressor {
    config: CodecConfig,
}

impl Compressor {
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn batcher(&self, horizon: usize) -> Result<HorizonBatcher> {
        Ok(HorizonBatcher::new(horizon)?.with_parallel(self.config.parallel))
    }

    /// Model, batch and code a symbol sequence
    pub fn compress<S: Symbol>(&self, symbols: &[S]) -> Result<CompressedData<S>> {
        let horizon = self.config.horizon;
        let batcher = self.batcher(horizon)?;
        let order = self.config.symbol_order;

        let data = match self.config.model_scope {
            ModelScope::Global => {
                let model = ProbabilityModel::from_symbols(symbols, order)?;
                let batches = if symbols.is_empty() {
                    Vec::new()
                } else {
                    let table = ArcTable::build(&model)?;
                    batcher.encode_all(&table, symbols)?
                };
                CompressedData::pack(model, batches, horizon)?
            }
            ModelScope::PerBatch => {
                let slices = batcher.split(symbols);
                let coded = batcher.map_ordered(&slices, |_, batch| {
                    let model = ProbabilityModel::from_symbols(batch.symbols, order)?;
                    let table = ArcTable::build(&model)?;
                    Ok((model, encode_batch(&table, batch)?))
                })?;
                let (models, batches): (Vec<_>, Vec<EncodedBatch>) = coded.into_iter().unzip();
                CompressedData::pack_per_batch(models, batches, horizon)?
            }
        };

        tracing::info!(
            "Compressed {} symbols into {} batches ({} digits, {} models)",
            symbols.len(),
            data.batches().len(),
            data.digit_count(),
            data.models().len()
        );
        Ok(data)
    }

    /// Rebuild each batch's arc table from the stored model(s) and decode
    ///
    /// The container's own horizon and scope are used; only `parallel` is
    /// taken from this compressor's configuration.
    pub fn decompress<S: Symbol>(&self, data: &CompressedData<S>) -> Result<Vec<S>> {
        let batcher = self.batcher(data.horizon())?;

        let symbols = match data.scope() {
            ModelScope::Global => {
                if data.batches().is_empty() {
                    Vec::new()
                } else {
                    let model = data
                        .model_for(0)
                        .ok_or_else(|| Error::FormatError("container has no model".into()))?;
                    let table = ArcTable::build(model)?;
                    batcher.decode_all(&table, data.batches())?
                }
            }
            ModelScope::PerBatch => {
                let decoded: Vec<DecodedBatch<S>> =
                    batcher.map_ordered(data.batches(), |index, batch| {
                        let model = data.model_for(index).ok_or_else(|| {
                            Error::FormatError(format!("no model for batch {}", index))
                        })?;
                        let table = ArcTable::build(model)?;
                        decode_batch(&table, index, batch)
                    })?;
                batcher.join(decoded)?
            }
        };

        tracing::info!(
            "Decompressed {} batches into {} symbols",
            data.batches().len(),
            symbols.len()
        );
        Ok(symbols)
    }

    /// Tokenize raw input with the configured tokenizer and serialize
    pub fn compress_bytes(&self, input: &[u8]) -> Result<Vec<u8>> {
        match self.config.tokenizer {
            Tokenizer::Bytes => Ok(self.compress(&tokenize_bytes(input))?.to_bytes()),
            Tokenizer::Words => {
                let text = std::str::from_utf8(input).map_err(|e| {
                    Error::RangeError(format!("word tokenizer needs UTF-8 input: {}", e))
                })?;
                Ok(self.compress(&tokenize_words(text))?.to_bytes())
            }
        }
    }

    /// Parse a container of any symbol kind and restore the raw bytes
    pub fn decompress_bytes(&self, container: &[u8]) -> Result<Vec<u8>> {
        match peek_kind(container)? {
            KIND_BYTE => self.decompress(&CompressedData::<u8>::from_bytes(container)?),
            KIND_WORD => {
                let words = self.decompress(&CompressedData::<String>::from_bytes(container)?)?;
                Ok(join_words(&words).into_bytes())
            }
            KIND_BYTE_STRING => {
                let chunks =
                    self.decompress(&CompressedData::<Vec<u8>>::from_bytes(container)?)?;
                Ok(chunks.concat())
            }
            other => Err(Error::FormatError(format!(
                "cannot decompress {} symbols",
                kind_name(other)
            ))),
        }
    }
}

/// Summary of a container of any symbol kind
pub fn inspect(container: &[u8]) -> Result<ContainerSummary> {
    Ok(match peek_kind(container)? {
        KIND_BYTE => CompressedData::<u8>::from_bytes(container)?.summary(),
        KIND_WORD => CompressedData::<String>::from_bytes(container)?.summary(),
        KIND_BYTE_STRING => CompressedData::<Vec<u8>>::from_bytes(container)?.summary(),
        other => {
            return Err(Error::FormatError(format!(
                "unknown symbol kind {}",
                other
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use phirac_core::SymbolOrder;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn config(horizon: usize, scope: ModelScope) -> CodecConfig {
        CodecConfig {
            horizon,
            model_scope: scope,
            ..Default::default()
        }
    }

    fn skewed_bytes(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len)
            .map(|_| {
                let r: f64 = rng.gen();
                if r < 0.6 {
                    b'e'
                } else if r < 0.85 {
                    b't'
                } else {
                    rng.gen_range(b'a'..=b'z')
                }
            })
            .collect()
    }

    #[test]
    fn test_global_roundtrip() {
        let input = skewed_bytes(10_000, 1);
        let compressor = Compressor::new(config(1000, ModelScope::Global)).unwrap();
        let data = compressor.compress(&input).unwrap();
        assert_eq!(data.batches().len(), 10);
        assert_eq!(data.models().len(), 1);
        assert_eq!(compressor.decompress(&data).unwrap(), input);
    }

    #[test]
    fn test_per_batch_roundtrip() {
        let input = skewed_bytes(5_000, 2);
        let compressor = Compressor::new(config(700, ModelScope::PerBatch)).unwrap();
        let data = compressor.compress(&input).unwrap();
        assert_eq!(data.models().len(), data.batches().len());
        assert_eq!(compressor.decompress(&data).unwrap(), input);
    }

    #[test]
    fn test_empty_input() {
        for scope in [ModelScope::Global, ModelScope::PerBatch] {
            let compressor = Compressor::new(config(64, scope)).unwrap();
            let data = compressor.compress::<u8>(&[]).unwrap();
            assert!(data.batches().is_empty());
            assert!(compressor.decompress(&data).unwrap().is_empty());
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(matches!(
            Compressor::new(config(0, ModelScope::Global)),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_compresses_skewed_input() {
        let input = skewed_bytes(20_000, 3);
        let compressor = Compressor::new(config(4096, ModelScope::Global)).unwrap();
        let data = compressor.compress(&input).unwrap();
        let stats = CompressionStats::from_container(&data);
        assert_eq!(stats.packed_bytes, data.to_bytes().len());
        assert!(stats.packed_bytes < input.len());
        assert!(stats.ratio(input.len()) < 1.0);
        // one bit per phi-adic digit costs log2(φ)⁻¹ ≈ 1.44× the entropy
        assert!(stats.digits as f64 >= stats.entropy_bits);
        assert!((stats.digits as f64) < stats.entropy_bits * 1.6 + 100.0 * stats.batches as f64);
    }

    #[test]
    fn test_bytes_dispatch() {
        let text = "to be or not to be, that is the question".repeat(30);

        let bytes_cfg = Compressor::new(config(256, ModelScope::Global)).unwrap();
        let packed = bytes_cfg.compress_bytes(text.as_bytes()).unwrap();
        assert_eq!(peek_kind(&packed).unwrap(), KIND_BYTE);
        assert_eq!(bytes_cfg.decompress_bytes(&packed).unwrap(), text.as_bytes());

        let words_cfg = Compressor::new(CodecConfig {
            tokenizer: Tokenizer::Words,
            symbol_order: SymbolOrder::Sorted,
            ..config(64, ModelScope::PerBatch)
        })
        .unwrap();
        let packed = words_cfg.compress_bytes(text.as_bytes()).unwrap();
        assert_eq!(peek_kind(&packed).unwrap(), KIND_WORD);
        // decompression follows the container, not the configured tokenizer
        assert_eq!(bytes_cfg.decompress_bytes(&packed).unwrap(), text.as_bytes());

        let summary = inspect(&packed).unwrap();
        assert_eq!(summary.kind, "word");
        assert_eq!(summary.scope, ModelScope::PerBatch);
    }

    #[test]
    fn test_word_tokenizer_rejects_invalid_utf8() {
        let compressor = Compressor::new(CodecConfig {
            tokenizer: Tokenizer::Words,
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(
            compressor.compress_bytes(&[0xff, 0xfe, 0x00]),
            Err(Error::RangeError(_))
        ));
    }

    #[test]
    fn test_byte_string_symbols() {
        let chunks: Vec<Vec<u8>> = b"abcabcabxabc".chunks(3).map(|c| c.to_vec()).collect();
        let compressor = Compressor::new(config(2, ModelScope::Global)).unwrap();
        let packed = compressor.compress(&chunks).unwrap().to_bytes();
        assert_eq!(compressor.decompress_bytes(&packed).unwrap(), b"abcabcabxabc");
    }

    #[test]
    fn test_corrupt_container_is_rejected() {
        let compressor = Compressor::default();
        assert!(compressor.decompress_bytes(b"PHIX").is_err());
        assert!(inspect(&[]).is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_is_independent_of_horizon(
            input in prop::collection::vec(0u8..8, 0..500),
            horizon in 1usize..200,
            per_batch in any::<bool>(),
            parallel in any::<bool>(),
        ) {
            let scope = if per_batch { ModelScope::PerBatch } else { ModelScope::Global };
            let compressor = Compressor::new(CodecConfig {
                parallel,
                ..config(horizon, scope)
            })
            .unwrap();
            let bytes = compressor.compress(&input).unwrap().to_bytes();
            let back = CompressedData::<u8>::from_bytes(&bytes).unwrap();
            prop_assert_eq!(compressor.decompress(&back).unwrap(), input);
        }
    }
}
