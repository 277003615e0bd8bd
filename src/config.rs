use clap::{Parser, ValueEnum};
use std::time::Duration;
use thiserror::Error;

/// Errors encountered while validating command line and environment configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value was empty.
    #[error("Missing value for {0}")]
    MissingValue(String),
    /// A value was present but could not be parsed or is out of range.
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

/// What a cycle does with stale series when it could not obtain any index list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutagePolicy {
    /// Leave every series and the remembered index set untouched.
    #[default]
    Preserve,
    /// Treat the outage as "no indexes exist" and zero every known index.
    Zero,
}

/// Raw command line flags. Each flag falls back to an environment variable.
#[derive(Debug, Parser)]
#[command(
    name = "sphinx-exporter",
    version,
    about = "Export Sphinx per-index statistics for Prometheus"
)]
pub struct Cli {
    /// Sphinx SphinxQL (MySQL protocol) address.
    #[arg(long, env = "SPHINX_ADDRESS", default_value = "127.0.0.1")]
    pub sphinx_address: String,
    /// Sphinx SphinxQL (MySQL protocol) port.
    #[arg(long, env = "SPHINX_PORT", default_value = "9306")]
    pub sphinx_port: String,
    /// Port for the exporter to listen on.
    #[arg(long, env = "LISTEN_PORT", default_value = "9247")]
    pub listen_port: String,
    /// Seconds to sleep between collection cycles.
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 5)]
    pub poll_interval_secs: u64,
    /// Behavior when a cycle cannot list indexes at all.
    #[arg(long, env = "OUTAGE_POLICY", value_enum, default_value_t = OutagePolicy::Preserve)]
    pub outage_policy: OutagePolicy,
}

/// Validated runtime configuration for the exporter.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host name or IP of the Sphinx server.
    pub sphinx_address: String,
    /// SphinxQL port of the Sphinx server.
    pub sphinx_port: u16,
    /// Port the HTTP metrics endpoint binds to.
    pub listen_port: u16,
    /// Fixed sleep between collection cycles.
    pub poll_interval: Duration,
    /// Stale-series handling when the source is unavailable.
    pub outage_policy: OutagePolicy,
}

impl Config {
    /// Validate parsed flags into a runtime configuration.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let sphinx_address = cli.sphinx_address.trim().to_string();
        if sphinx_address.is_empty() {
            return Err(ConfigError::MissingValue("sphinx-address".into()));
        }
        if cli.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue("poll-interval-secs".into()));
        }

        Ok(Self {
            sphinx_address,
            sphinx_port: parse_port(&cli.sphinx_port, "sphinx-port")?,
            listen_port: parse_port(&cli.listen_port, "listen-port")?,
            poll_interval: Duration::from_secs(cli.poll_interval_secs),
            outage_policy: cli.outage_policy,
        })
    }
}

fn parse_port(value: &str, name: &str) -> Result<u16, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::MissingValue(name.to_string()));
    }
    match value.parse::<u16>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidValue(name.to_string())),
        Ok(port) => Ok(port),
    }
}

/// Load `.env`, parse flags, and validate them.
pub fn load() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_cli(Cli::parse())?;
    tracing::debug!(
        sphinx_address = %config.sphinx_address,
        sphinx_port = config.sphinx_port,
        listen_port = config.listen_port,
        poll_interval = ?config.poll_interval,
        outage_policy = ?config.outage_policy,
        "Loaded configuration"
    );
    Ok(config)
}
