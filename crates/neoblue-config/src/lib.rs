//! Shared configuration for the neoblue CLI and host integrations.
//!
//! A TOML file with coordinator tuning defaults and a list of named blinds,
//! overridable from `NEOBLUE_`-prefixed environment variables, translated
//! into `neoblue_core::CoordinatorConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use neoblue_api::{DeviceAddress, NEOSMART_MANUFACTURER_ID};
use neoblue_core::{CoordinatorConfig, DEFAULT_FALLBACK_RSSI};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no device named '{name}' in config")]
    UnknownDevice { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named blinds.
    #[serde(default)]
    pub devices: BTreeMap<String, Device>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_manufacturer_id")]
    pub manufacturer_id: u16,

    /// Seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,

    /// Seconds a stored advertisement stays usable.
    #[serde(default = "default_advertisement_recency")]
    pub advertisement_recency: u64,

    #[serde(default = "default_fallback_rssi")]
    pub fallback_rssi: i16,

    #[serde(default = "default_true")]
    pub surface_signal_only: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            manufacturer_id: default_manufacturer_id(),
            connect_timeout: default_connect_timeout(),
            command_timeout: default_command_timeout(),
            advertisement_recency: default_advertisement_recency(),
            fallback_rssi: default_fallback_rssi(),
            surface_signal_only: true,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_manufacturer_id() -> u16 {
    NEOSMART_MANUFACTURER_ID
}
fn default_connect_timeout() -> u64 {
    15
}
fn default_command_timeout() -> u64 {
    5
}
fn default_advertisement_recency() -> u64 {
    195
}
fn default_fallback_rssi() -> i16 {
    DEFAULT_FALLBACK_RSSI
}
fn default_true() -> bool {
    true
}

/// A named blind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Device {
    /// Link-layer address (`AA:BB:CC:DD:EE:FF`).
    pub address: String,

    /// Room or window label.
    pub label: Option<String>,

    /// Override connect timeout (seconds).
    pub connect_timeout: Option<u64>,

    /// Override command timeout (seconds).
    pub command_timeout: Option<u64>,
}

impl Device {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            label: None,
            connect_timeout: None,
            command_timeout: None,
        }
    }
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Coordinator tuning from `[defaults]`, validated.
    pub fn coordinator_config(&self) -> Result<CoordinatorConfig, ConfigError> {
        let d = &self.defaults;
        if d.connect_timeout == 0 {
            return Err(invalid("connect_timeout", "must be greater than 0"));
        }
        if d.command_timeout == 0 {
            return Err(invalid("command_timeout", "must be greater than 0"));
        }
        if !(-127..=20).contains(&d.fallback_rssi) {
            return Err(invalid(
                "fallback_rssi",
                format!("{} dBm is outside -127..=20", d.fallback_rssi),
            ));
        }

        Ok(CoordinatorConfig {
            manufacturer_id: d.manufacturer_id,
            connect_timeout: Duration::from_secs(d.connect_timeout),
            command_timeout: Duration::from_secs(d.command_timeout),
            advertisement_recency: Duration::from_secs(d.advertisement_recency),
            fallback_rssi: d.fallback_rssi,
            surface_signal_only: d.surface_signal_only,
        })
    }

    /// Address and effective tuning for the device called `name`.
    pub fn device_config(
        &self,
        name: &str,
    ) -> Result<(DeviceAddress, CoordinatorConfig), ConfigError> {
        let device = self
            .devices
            .get(name)
            .ok_or_else(|| ConfigError::UnknownDevice { name: name.into() })?;

        let address = validate_address(&device.address)?;
        let mut config = self.coordinator_config()?;

        if let Some(secs) = device.connect_timeout {
            if secs == 0 {
                return Err(invalid("connect_timeout", "must be greater than 0"));
            }
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = device.command_timeout {
            if secs == 0 {
                return Err(invalid("command_timeout", "must be greater than 0"));
            }
            config.command_timeout = Duration::from_secs(secs);
        }

        Ok((address, config))
    }

    /// Add or replace a device. Returns the entry it replaced, if any.
    pub fn add_device(&mut self, name: &str, device: Device) -> Result<Option<Device>, ConfigError> {
        if name.trim().is_empty() {
            return Err(invalid("name", "must not be empty"));
        }
        let address = validate_address(&device.address)?;
        let device = Device {
            address: address.to_string(),
            ..device
        };
        Ok(self.devices.insert(name.to_owned(), device))
    }

    pub fn remove_device(&mut self, name: &str) -> Result<Device, ConfigError> {
        self.devices
            .remove(name)
            .ok_or_else(|| ConfigError::UnknownDevice { name: name.into() })
    }
}

/// Normalize and sanity-check an address: six hex octets, or an opaque
/// platform identifier with no whitespace.
pub fn validate_address(raw: &str) -> Result<DeviceAddress, ConfigError> {
    let address = DeviceAddress::new(raw);
    let s = address.as_str();
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return Err(invalid("address", format!("'{raw}' is not a device address")));
    }
    let octets: Vec<&str> = s.split(':').collect();
    if octets.len() > 1
        && (octets.len() != 6
            || !octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit())))
    {
        return Err(invalid(
            "address",
            format!("'{raw}' is not of the form AA:BB:CC:DD:EE:FF"),
        ));
    }
    Ok(address)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("rs", "neoblue", "neoblue").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("neoblue");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields defaults.
///
/// Environment keys use `__` between table and field, e.g.
/// `NEOBLUE_DEFAULTS__CONNECT_TIMEOUT=20`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NEOBLUE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
