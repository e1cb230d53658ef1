// src/cli/commands.rs
use crate::types::HashEncoding;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// XenBlocks Miner CLI - Argon2id proof-of-work miner in Rust
#[derive(Parser, Debug)]
#[command(name = "xen-miner-rs")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform (start mining, run benchmarks, or generate config)
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Start mining operation with specified options
    Start(StartOptions),

    /// Measure the local Argon2id hashrate
    Benchmark(BenchmarkOptions),

    /// Generate configuration file template
    Config(ConfigOptions),
}

/// Options for starting the mining operation
#[derive(Parser, Debug)]
pub struct StartOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Account address to mine for (overrides config)
    #[arg(short, long)]
    pub account: Option<String>,

    /// Number of worker threads to use, 0 for all cores (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,
}

/// Options for running the hashing benchmark
#[derive(Parser, Debug)]
pub struct BenchmarkOptions {
    /// Duration of benchmark in seconds
    #[arg(short, long, default_value_t = 60)]
    pub duration: u64,

    /// Number of threads to use
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,

    /// Argon2 memory cost in KB
    #[arg(short, long, default_value_t = 1500)]
    pub memory_cost: u32,

    /// Hash output length in bytes (32 or 64)
    #[arg(long, default_value_t = 64)]
    pub hash_length: usize,

    /// Output rendering of each hash
    #[arg(short, long, value_enum, default_value_t = HashEncoding::Hex)]
    pub encoding: HashEncoding,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,

    /// Account address to pre-fill
    #[arg(short, long)]
    pub account: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_overrides() {
        let cli = Commands::try_parse_from([
            "xen-miner-rs",
            "start",
            "--config",
            "miner.toml",
            "--account",
            "0x1234567890123456789012345678901234567890",
            "--workers",
            "4",
        ])
        .unwrap();

        match cli.action {
            Action::Start(opts) => {
                assert_eq!(opts.config, PathBuf::from("miner.toml"));
                assert_eq!(opts.workers, Some(4));
                assert!(opts.account.is_some());
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_benchmark_defaults() {
        let cli = Commands::try_parse_from(["xen-miner-rs", "benchmark", "-d", "5"]).unwrap();
        match cli.action {
            Action::Benchmark(opts) => {
                assert_eq!(opts.duration, 5);
                assert_eq!(opts.memory_cost, 1500);
                assert_eq!(opts.hash_length, 64);
                assert_eq!(opts.encoding, HashEncoding::Hex);
                assert!(opts.threads >= 1);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_config_defaults() {
        let cli = Commands::try_parse_from(["xen-miner-rs", "config"]).unwrap();
        match cli.action {
            Action::Config(opts) => {
                assert_eq!(opts.output, PathBuf::from("config.toml"));
                assert!(opts.account.is_none());
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }
}
