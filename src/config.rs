// src/config.rs
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::Deserialize;
use crate::types::ConnectionMode;
pub const DEFAULT_CONFIG_FILE: &str = "mfc-logger.toml";
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub mode: ConnectionMode,
    /// Directory the session files go to; `~/mfc-data` when unset.
    pub data_dir: Option<PathBuf>,
    pub poll_interval_ms: u64,
    pub plot_interval_ms: u64,
    /// How often each engine asks its device for position and destination.
    pub refresh_interval_ms: u64,
    pub timeout_ms: u64,
    pub buffer_capacity: usize,
    pub plot_window_minutes: f64,
    pub devices: Vec<DeviceConfig>,
}
fn default_host() -> String {
    "localhost".to_owned()
}
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: ConnectionMode::Hardware,
            data_dir: None,
            poll_interval_ms: 1000,
            plot_interval_ms: 1000,
            refresh_interval_ms: 1000,
            timeout_ms: 2000,
            buffer_capacity: crate::drivers::buffer::DEFAULT_CAPACITY,
            plot_window_minutes: 3.0,
            devices: (1..=3)
                .map(|i| DeviceConfig {
                    name: format!("mfc{i}"),
                    host: default_host(),
                    port: 38000 + i,
                })
                .collect(),
        }
    }
}
impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        anyhow::ensure!(!config.devices.is_empty(), "at least one device is required");
        Ok(config)
    }
    /// Reads `path` if it exists, otherwise falls back to the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found, using default configuration", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing {}", path.display()))
    }
    /// `data_dir` if set, else `<home>/mfc-data`.
    pub fn data_dir(&self) -> Result<PathBuf> {
        resolve_data_dir(self.data_dir.as_deref(), dirs::home_dir())
    }
    /// Samples kept per device span `buffer_capacity * refresh_interval_ms`;
    /// the plot window never extends past that.
    pub fn visible_window_minutes(&self) -> f64 {
        let buffered = self.buffer_capacity as f64 * self.refresh_interval_ms as f64 / 60_000.0;
        self.plot_window_minutes.min(buffered)
    }
}
fn resolve_data_dir(configured: Option<&Path>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        return Ok(dir.to_path_buf());
    }
    let home = home.context("no home directory; set data_dir in the configuration")?;
    Ok(home.join("mfc-data"))
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn defaults_point_at_three_local_daemons() {
        let config = AppConfig::default();
        let ports: Vec<u16> = config.devices.iter().map(|d| d.port).collect();
        assert_eq!(ports, vec![38001, 38002, 38003]);
        assert_eq!(config.devices[0].name, "mfc1");
        assert_eq!(config.buffer_capacity, 300);
        assert_eq!(config.refresh_interval_ms, 1000);
    }
    #[test]
    fn toml_overrides_selected_keys() {
        let config = AppConfig::from_toml(
            r#"
            mode = "simulation"
            data_dir = "/tmp/flows"
            poll_interval_ms = 500

            [[devices]]
            name = "n2"
            port = 39001

            [[devices]]
            name = "ar"
            host = "10.0.0.7"
            port = 39002
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, ConnectionMode::Simulation);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/flows"));
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.plot_interval_ms, 1000);
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].host, "localhost");
        assert_eq!(config.devices[1].host, "10.0.0.7");
    }
    #[test]
    fn empty_device_list_is_rejected() {
        assert!(AppConfig::from_toml("devices = []").is_err());
    }
    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
    #[test]
    fn data_dir_defaults_under_home() {
        let dir = resolve_data_dir(None, Some(PathBuf::from("/home/lab"))).unwrap();
        assert_eq!(dir, PathBuf::from("/home/lab/mfc-data"));
    }
    #[test]
    fn missing_home_is_an_error() {
        let err = resolve_data_dir(None, None).unwrap_err();
        assert!(err.to_string().contains("no home directory"));
        // an explicit directory does not need a home
        let dir = resolve_data_dir(Some(Path::new("/srv/mfc")), None).unwrap();
        assert_eq!(dir, PathBuf::from("/srv/mfc"));
    }
    #[test]
    fn default_window_is_covered_by_the_buffer() {
        let config = AppConfig::default();
        // 300 samples at 1 s cover 5 minutes, more than the 3 minute window
        assert_eq!(config.visible_window_minutes(), 3.0);
        let fast = AppConfig {
            refresh_interval_ms: 250,
            ..AppConfig::default()
        };
        assert_eq!(fast.visible_window_minutes(), 1.25);
    }
}
