//! Logging Config

use clap::Args;

/// How diagnostics are written to stderr.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// One line per event, for reading in a terminal alongside the receipt.
    Compact,

    /// One JSON object per event, for piping stderr into a collector.
    Json,
}

/// Diagnostics for the cart commands. Receipts and order ids go to stdout; these go to stderr.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Filter directive for cart diagnostics, e.g. `warn` or `storefront_cart=debug`
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Diagnostic format on stderr
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
