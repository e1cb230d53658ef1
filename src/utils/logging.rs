// src/utils/logging.rs
//! Logging configuration and utilities
//!
//! Sets up `env_logger` for the miner and the benchmark command, and provides
//! the small formatting helpers used by status lines (hash counts and
//! elapsed mining time).

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;
use std::time::Duration;

/// Initializes the logging subsystem for mining
///
/// # Configuration
/// - Logs to stdout
/// - Default log level: Info
/// - HTTP client internals are capped at Warn
/// - Respects `RUST_LOG` environment variable if set
pub fn init_logging() {
    init_with_default(LevelFilter::Info);
}

/// Configures benchmark-specific logging
///
/// Same format as [`init_logging`], but defaults to Debug so per-thread
/// hashrates are visible.
pub fn init_bench_logging() {
    init_with_default(LevelFilter::Debug);
}

fn init_with_default(default: LevelFilter) {
    let mut builder = common_log_config();

    if env::var("RUST_LOG").is_err() {
        builder
            .filter_level(default)
            .filter_module("hyper", LevelFilter::Warn)
            .filter_module("hyper_util", LevelFilter::Warn)
            .filter_module("reqwest", LevelFilter::Warn);
    } else {
        builder.parse_env("RUST_LOG");
    }

    // A second init (e.g. from tests) is not an error worth surfacing
    let _ = builder.try_init();
}

/// Creates and configures a base logger builder with common settings
///
/// Format: `[<epoch seconds> <LEVEL> <module>:<line>] <message>` on stdout.
fn common_log_config() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            use std::io::Write;
            let ts = buf.timestamp_seconds();
            let level = record.level();
            let module = record.module_path().unwrap_or_default();
            let line = record.line().unwrap_or(0);

            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                ts,
                level,
                module,
                line,
                record.args()
            )
        })
        .target(Target::Stdout);

    builder
}

/// Formats a counter with `,` thousands separators (`1234567` -> `1,234,567`)
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a duration as `Hh Mm Ss`, dropping sub-second precision
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}
