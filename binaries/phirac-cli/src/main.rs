//! phirac CLI
//!
//! Compress files into PHIR containers with golden-ratio radial arithmetic
//! coding, and turn them back.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use phirac_config::{CodecConfig, Tokenizer};
use phirac_core::ModelScope;
use phirac_engine::{inspect, Compressor};

#[derive(Parser)]
#[command(name = "phirac")]
#[command(about = "Radial arithmetic coding over phi-adic digits")]
#[command(version)]
struct Cli {
    /// Log per-batch progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a PHIR container
    Compress {
        /// File to compress
        input: PathBuf,

        /// Container to write
        output: PathBuf,

        /// bytes or words
        #[arg(short, long)]
        tokenizer: Option<Tokenizer>,

        /// Maximum symbols per batch
        #[arg(long)]
        horizon: Option<usize>,

        /// Store a separate model with every batch
        #[arg(long)]
        per_batch_models: bool,

        /// Code batches one after another
        #[arg(long)]
        sequential: bool,

        /// Config file (defaults to ~/.config/phirac/config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Restore the original file from a container
    Decompress {
        /// Container to read
        input: PathBuf,

        /// File to write
        output: PathBuf,

        /// Decode batches one after another
        #[arg(long)]
        sequential: bool,
    },

    /// Show what a container holds
    Inspect {
        /// Container to read
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Only print the config file location
        #[arg(long)]
        path: bool,

        /// Config file to read instead of the default
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "phirac=debug" } else { "phirac=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compress {
            input,
            output,
            tokenizer,
            horizon,
            per_batch_models,
            sequential,
            config,
        } => {
            let mut cfg = resolve_config(config.as_deref())?;
            if let Some(t) = tokenizer {
                cfg.tokenizer = t;
            }
            if let Some(h) = horizon {
                cfg.horizon = h;
            }
            if per_batch_models {
                cfg.model_scope = ModelScope::PerBatch;
            }
            if sequential {
                cfg.parallel = false;
            }
            let summary = compress_file(cfg, &input, &output)?;
            println!("{}", summary);
        }

        Commands::Decompress {
            input,
            output,
            sequential,
        } => {
            let mut cfg = decompress_config(CodecConfig::load_default());
            if sequential {
                cfg.parallel = false;
            }
            let written = decompress_file(cfg, &input, &output)?;
            println!("Restored {} bytes to {}", written, output.display());
        }

        Commands::Inspect { file, json } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let summary = inspect(&bytes)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", summary);
            }
        }

        Commands::Config { path, config } => {
            if path {
                let location = config.unwrap_or_else(CodecConfig::default_location);
                println!("{}", location.display());
            } else {
                let cfg = resolve_config(config.as_deref())?;
                print!("{}", cfg.to_yaml()?);
            }
        }
    }

    Ok(())
}

/// Explicit file plus environment, or the default location
fn resolve_config(path: Option<&Path>) -> Result<CodecConfig> {
    let cfg = match path {
        Some(p) => {
            let mut cfg = CodecConfig::load(p)
                .with_context(|| format!("Failed to load config {}", p.display()))?;
            cfg.apply_env()?;
            cfg
        }
        None => CodecConfig::load_default()?,
    };
    tracing::debug!("Effective config: {:?}", cfg);
    Ok(cfg)
}

/// Decompression only takes `parallel` from the config; the container
/// carries everything else, so a broken config file falls back to defaults
fn decompress_config(loaded: phirac_config::Result<CodecConfig>) -> CodecConfig {
    loaded.unwrap_or_else(|e| {
        tracing::warn!("Ignoring config: {}", e);
        CodecConfig::default()
    })
}

/// Compress `input` into `output`, returning a one-line report
fn compress_file(cfg: CodecConfig, input: &Path, output: &Path) -> Result<String> {
    let raw = std::fs::read(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let compressor = Compressor::new(cfg)?;
    let packed = compressor.compress_bytes(&raw)?;
    std::fs::write(output, &packed)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let ratio = if raw.is_empty() {
        0.0
    } else {
        packed.len() as f64 / raw.len() as f64
    };
    Ok(format!(
        "{} → {}: {} bytes → {} bytes ({:.1}%)",
        input.display(),
        output.display(),
        raw.len(),
        packed.len(),
        ratio * 100.0
    ))
}

/// Restore `input` into `output`, returning the number of bytes written
fn decompress_file(cfg: CodecConfig, input: &Path, output: &Path) -> Result<usize> {
    let packed = std::fs::read(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let compressor = Compressor::new(cfg)?;
    let raw = compressor
        .decompress_bytes(&packed)
        .with_context(|| format!("Failed to decode {}", input.display()))?;
    std::fs::write(output, &raw)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(raw.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "phirac",
            "compress",
            "in.txt",
            "out.phir",
            "--tokenizer",
            "words",
            "--horizon",
            "512",
            "--per-batch-models",
        ])
        .unwrap();
        match cli.command {
            Commands::Compress {
                tokenizer,
                horizon,
                per_batch_models,
                ..
            } => {
                assert_eq!(tokenizer, Some(Tokenizer::Words));
                assert_eq!(horizon, Some(512));
                assert!(per_batch_models);
            }
            _ => panic!("expected compress"),
        }
        assert!(Cli::try_parse_from(["phirac", "compress", "a", "b", "-t", "bits"]).is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("poem.txt");
        let packed = dir.path().join("poem.phir");
        let restored = dir.path().join("poem.out");
        let text = "Nature's first green is gold,\nHer hardest hue to hold.\n".repeat(40);
        std::fs::write(&input, &text).unwrap();

        for tokenizer in [Tokenizer::Bytes, Tokenizer::Words] {
            let cfg = CodecConfig {
                tokenizer,
                horizon: 300,
                ..Default::default()
            };
            compress_file(cfg.clone(), &input, &packed).unwrap();
            let written = decompress_file(cfg, &packed, &restored).unwrap();
            assert_eq!(written, text.len());
            assert_eq!(std::fs::read_to_string(&restored).unwrap(), text);
        }
    }

    #[test]
    fn test_broken_config_does_not_block_decompress() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        let packed = dir.path().join("notes.phir");
        let restored = dir.path().join("notes.out");
        std::fs::write(&input, "golden angle, golden angle").unwrap();
        compress_file(CodecConfig::default(), &input, &packed).unwrap();

        let broken = dir.path().join("config.yaml");
        std::fs::write(&broken, "horizon: [not a number").unwrap();
        let cfg = decompress_config(CodecConfig::load(&broken));
        assert_eq!(cfg, CodecConfig::default());

        decompress_file(cfg, &packed, &restored).unwrap();
        assert_eq!(
            std::fs::read_to_string(&restored).unwrap(),
            "golden angle, golden angle"
        );
    }

    #[test]
    fn test_missing_input_reports_path() {
        let dir = tempdir().unwrap();
        let err = compress_file(
            CodecConfig::default(),
            &dir.path().join("absent"),
            &dir.path().join("out"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("absent"));
    }
}
