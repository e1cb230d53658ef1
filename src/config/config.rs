// src/config/config.rs
use crate::{
    network::{authority::AuthorityConfig, retry::RetryConfig},
    types::HashEncoding,
    utils::error::MinerError,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for the mining application
///
/// Holds the account being mined for, worker and hash settings, and the
/// authority endpoints used for difficulty, verification and submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Account address credited with mined blocks (`0x` + 40 hex chars)
    #[serde(default)]
    pub account: String,

    /// Number of worker threads to use for mining
    /// (0 = one per available CPU)
    #[serde(default)]
    pub worker_threads: usize,

    /// Argon2id output length in bytes (32 or 64)
    #[serde(default = "default_hash_length")]
    pub hash_length: usize,

    /// How hashes are rendered before matching (hex or phc)
    #[serde(default)]
    pub encoding: HashEncoding,

    /// Memory cost in KB, used until the authority's difficulty is known
    #[serde(default = "default_memory_cost")]
    pub memory_cost: u32,

    /// Seconds between difficulty refreshes (0 disables refreshing)
    #[serde(default = "default_difficulty_refresh_secs")]
    pub difficulty_refresh_secs: u64,

    /// Seconds between statistics log lines
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,

    /// Submit `XUNI` matches as well as `XEN11` ones
    #[serde(default)]
    pub submit_xuni: bool,

    /// Remote authority endpoints
    #[serde(default)]
    pub authority: AuthorityConfig,

    /// Retry behaviour for authority requests
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_hash_length() -> usize {
    64
}

fn default_memory_cost() -> u32 {
    1500
}

fn default_difficulty_refresh_secs() -> u64 {
    300
}

fn default_report_interval_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: String::new(),
            worker_threads: 0,
            hash_length: default_hash_length(),
            encoding: HashEncoding::default(),
            memory_cost: default_memory_cost(),
            difficulty_refresh_secs: default_difficulty_refresh_secs(),
            report_interval_secs: default_report_interval_secs(),
            submit_xuni: false,
            authority: AuthorityConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Settings a pool is started with
///
/// Workers receive a copy at start, so a later change to `memory_cost`
/// only reaches workers started after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningConfig {
    /// Validated account address
    pub account: String,
    /// Argon2id memory cost in KB
    pub memory_cost: u32,
    /// Requested workers (0 = auto)
    pub worker_threads: usize,
    /// Whether `XUNI` matches go through submission
    pub submit_xuni: bool,
}

impl MiningConfig {
    /// Builds a mining config, rejecting malformed accounts up front
    pub fn new(account: impl Into<String>, memory_cost: u32) -> Result<Self, MinerError> {
        let account = account.into();
        validate_account(&account)?;
        Ok(Self {
            account,
            memory_cost,
            worker_threads: 0,
            submit_xuni: false,
        })
    }

    /// Salt bytes derived from the account
    pub fn salt(&self) -> Result<Vec<u8>, MinerError> {
        account_salt(&self.account)
    }

    /// Number of workers to spawn: the request capped by available
    /// hardware parallelism, at least one
    pub fn worker_count(&self) -> usize {
        let available = num_cpus::get().max(1);
        match self.worker_threads {
            0 => available,
            n => n.min(available),
        }
    }
}

/// Checks an account address: `0x` followed by 40 hex characters of any case
pub fn validate_account(account: &str) -> Result<(), MinerError> {
    let body = account
        .strip_prefix("0x")
        .ok_or_else(|| MinerError::ValidationError(format!("Account '{}' must start with 0x", account)))?;

    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MinerError::ValidationError(format!(
            "Account '{}' must have 40 hex characters after 0x",
            account
        )));
    }
    Ok(())
}

/// Raw salt for the hash engine: the account with its `0x` prefix removed,
/// decoded from hex
pub fn account_salt(account: &str) -> Result<Vec<u8>, MinerError> {
    validate_account(account)?;
    Ok(hex::decode(&account[2..])?)
}

impl Config {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(MinerError)` - If file couldn't be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(&config_str)
    }

    /// Parses configuration from TOML text
    pub fn parse(text: &str) -> Result<Self, MinerError> {
        toml::from_str(text)
            .map_err(|e| MinerError::ConfigError(format!("Invalid config format: {}", e)))
    }

    /// Checks every field that would otherwise fail later, at pool start
    /// or on the first request
    pub fn validate(&self) -> Result<(), MinerError> {
        validate_account(&self.account)?;

        if self.hash_length != 32 && self.hash_length != 64 {
            return Err(MinerError::ConfigError(format!(
                "hash_length must be 32 or 64, got {}",
                self.hash_length
            )));
        }
        if self.memory_cost < 8 {
            return Err(MinerError::ConfigError(format!(
                "memory_cost must be at least 8 KB, got {}",
                self.memory_cost
            )));
        }
        if self.report_interval_secs == 0 {
            return Err(MinerError::ConfigError(
                "report_interval_secs must be positive".into(),
            ));
        }
        self.authority.validate()
    }

    /// Runtime mining settings derived from this configuration
    pub fn mining_config(&self) -> Result<MiningConfig, MinerError> {
        let mut mining = MiningConfig::new(self.account.clone(), self.memory_cost)?;
        mining.worker_threads = self.worker_threads;
        mining.submit_xuni = self.submit_xuni;
        Ok(mining)
    }

    /// Generates a configuration template string
    ///
    /// # Arguments
    /// * `account` - Account to pre-fill, if known
    ///
    /// # Returns
    /// String containing a commented TOML configuration template
    pub fn generate_template(account: Option<&str>) -> String {
        let defaults = Config::default();
        let mut template = String::new();
        template.push_str("# XenBlocks Miner Configuration\n\n");
        template.push_str("# Account credited with mined blocks\n");
        template.push_str(&format!(
            "account = \"{}\"\n",
            account.unwrap_or("0x0000000000000000000000000000000000000000")
        ));
        template.push_str("# Number of worker threads (0 = auto-detect)\n");
        template.push_str("worker_threads = 0\n");
        template.push_str("# Argon2id output length in bytes (32 or 64)\n");
        template.push_str(&format!("hash_length = {}\n", defaults.hash_length));
        template.push_str("# Hash rendering used for matching: hex or phc\n");
        template.push_str(&format!("encoding = \"{}\"\n", defaults.encoding));
        template.push_str("# Fallback memory cost (KB) when difficulty cannot be fetched\n");
        template.push_str(&format!("memory_cost = {}\n", defaults.memory_cost));
        template.push_str("# Seconds between difficulty refreshes (0 = never)\n");
        template.push_str(&format!(
            "difficulty_refresh_secs = {}\n",
            defaults.difficulty_refresh_secs
        ));
        template.push_str("# Seconds between statistics reports\n");
        template.push_str(&format!(
            "report_interval_secs = {}\n",
            defaults.report_interval_secs
        ));
        template.push_str("# Also submit XUNI matches\n");
        template.push_str("submit_xuni = false\n\n");

        template.push_str("[authority]\n");
        template.push_str(&format!(
            "difficulty_url = \"{}\"\n",
            defaults.authority.difficulty_url
        ));
        template.push_str(&format!("verify_url = \"{}\"\n", defaults.authority.verify_url));
        template.push_str(&format!(
            "lastblock_url = \"{}\"\n",
            defaults.authority.lastblock_url
        ));
        template.push_str(&format!("submit_url = \"{}\"\n\n", defaults.authority.submit_url));

        template.push_str("[retry]\n");
        template.push_str(&format!("max_retries = {}\n", defaults.retry.max_retries));
        template.push_str(&format!("delay_secs = {}\n", defaults.retry.delay_secs));

        template
    }
}
