use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ghost: GhostConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

#[derive(Debug, Deserialize)]
pub struct StationConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            timezone: default_timezone(),
            log_level: default_log_level(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "station445.db".to_string()
}

/// Ghost content API endpoint. The key is the public content key, sent as a query parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct GhostConfig {
    #[serde(default = "default_ghost_url")]
    pub url: String,
    #[serde(default = "default_ghost_key")]
    pub key: String,
    #[serde(default = "default_archive_limit")]
    pub archive_limit: u32,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            url: default_ghost_url(),
            key: default_ghost_key(),
            archive_limit: default_archive_limit(),
        }
    }
}

fn default_ghost_url() -> String {
    "https://demo.ghost.io".to_string()
}
fn default_ghost_key() -> String {
    "22444f78447824223cefc48062".to_string()
}
fn default_archive_limit() -> u32 {
    15
}

impl GhostConfig {
    /// Posts collection endpoint, always with a trailing slash.
    pub fn posts_url(&self) -> String {
        format!("{}/ghost/api/content/posts/", self.url.trim_end_matches('/'))
    }
}

/// Passphrases for the two cosmetic gates. These are shared secrets checked locally,
/// not credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_visual_passphrase")]
    pub visual_passphrase: String,
    #[serde(default = "default_admin_passphrase")]
    pub admin_passphrase: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            visual_passphrase: default_visual_passphrase(),
            admin_passphrase: default_admin_passphrase(),
        }
    }
}

fn default_visual_passphrase() -> String {
    "netws112".to_string()
}
fn default_admin_passphrase() -> String {
    "VOID".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_uplink_line")]
    pub uplink_line: String,
    #[serde(default = "default_uplink_jitter")]
    pub uplink_jitter: String,
    #[serde(default = "default_reveal_buffer")]
    pub reveal_buffer: String,
    #[serde(default = "default_unlock_delay")]
    pub unlock_delay: String,
    #[serde(default = "default_admin_step")]
    pub admin_step: String,
    #[serde(default = "default_admin_grant_hold")]
    pub admin_grant_hold: String,
    #[serde(default = "default_admin_deny_hold")]
    pub admin_deny_hold: String,
    #[serde(default = "default_extraction_delay")]
    pub extraction_delay: String,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            uplink_line: default_uplink_line(),
            uplink_jitter: default_uplink_jitter(),
            reveal_buffer: default_reveal_buffer(),
            unlock_delay: default_unlock_delay(),
            admin_step: default_admin_step(),
            admin_grant_hold: default_admin_grant_hold(),
            admin_deny_hold: default_admin_deny_hold(),
            extraction_delay: default_extraction_delay(),
        }
    }
}

fn default_uplink_line() -> String {
    "600ms".to_string()
}
fn default_uplink_jitter() -> String {
    "400ms".to_string()
}
fn default_reveal_buffer() -> String {
    "800ms".to_string()
}
fn default_unlock_delay() -> String {
    "800ms".to_string()
}
fn default_admin_step() -> String {
    "500ms".to_string()
}
fn default_admin_grant_hold() -> String {
    "1500ms".to_string()
}
fn default_admin_deny_hold() -> String {
    "2s".to_string()
}
fn default_extraction_delay() -> String {
    "1500ms".to_string()
}

/// Parsed delays for the scripted terminal sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub uplink_line: Duration,
    pub uplink_jitter: Duration,
    pub reveal_buffer: Duration,
    pub unlock_delay: Duration,
    pub admin_step: Duration,
    pub admin_grant_hold: Duration,
    pub admin_deny_hold: Duration,
    pub extraction_delay: Duration,
}

impl Pacing {
    /// No waiting at all. Sequences still emit every line.
    #[cfg(test)]
    pub const fn instant() -> Self {
        Self {
            uplink_line: Duration::ZERO,
            uplink_jitter: Duration::ZERO,
            reveal_buffer: Duration::ZERO,
            unlock_delay: Duration::ZERO,
            admin_step: Duration::ZERO,
            admin_grant_hold: Duration::ZERO,
            admin_deny_hold: Duration::ZERO,
            extraction_delay: Duration::ZERO,
        }
    }
}

impl PacingConfig {
    pub fn parse(&self) -> Result<Pacing, ConfigError> {
        let parse = |name: &str, value: &str| {
            humantime::parse_duration(value)
                .map_err(|e| ConfigError::Validation(format!("pacing {name} '{value}': {e}")))
        };
        Ok(Pacing {
            uplink_line: parse("uplink_line", &self.uplink_line)?,
            uplink_jitter: parse("uplink_jitter", &self.uplink_jitter)?,
            reveal_buffer: parse("reveal_buffer", &self.reveal_buffer)?,
            unlock_delay: parse("unlock_delay", &self.unlock_delay)?,
            admin_step: parse("admin_step", &self.admin_step)?,
            admin_grant_hold: parse("admin_grant_hold", &self.admin_grant_hold)?,
            admin_deny_hold: parse("admin_deny_hold", &self.admin_deny_hold)?,
            extraction_delay: parse("extraction_delay", &self.extraction_delay)?,
        })
    }
}

impl Config {
    /// Resolve the database path (relative to data_dir if not absolute).
    pub fn db_path(&self) -> PathBuf {
        let db_path = Path::new(&self.database.path);
        if db_path.is_absolute() {
            db_path.to_path_buf()
        } else {
            self.station.data_dir.join(db_path)
        }
    }

    /// Configured display timezone. Only valid after `validate_config`.
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.station.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(ConfigError::ReadFile)
        .context("reading config file")?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<()> {
    // Validate content API base URL
    let url = reqwest::Url::parse(&config.ghost.url)
        .map_err(|e| ConfigError::Validation(format!("ghost url '{}': {}", config.ghost.url, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "ghost url '{}': scheme must be http or https",
            config.ghost.url
        ))
        .into());
    }

    if config.ghost.key.trim().is_empty() {
        return Err(ConfigError::Validation("ghost key must not be empty".to_string()).into());
    }

    if config.ghost.archive_limit == 0 {
        return Err(ConfigError::Validation("ghost archive_limit must be at least 1".to_string()).into());
    }

    if config.gate.visual_passphrase.is_empty() || config.gate.admin_passphrase.is_empty() {
        return Err(ConfigError::Validation("gate passphrases must not be empty".to_string()).into());
    }

    // Validate timezone
    config
        .station
        .timezone
        .parse::<chrono_tz::Tz>()
        .map_err(|_| ConfigError::Validation(format!("unknown timezone '{}'", config.station.timezone)))?;

    config.pacing.parse()?;

    Ok(())
}
