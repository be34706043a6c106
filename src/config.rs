use std::{io, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::trigger::RecurrenceDay;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("couldn't read or write config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("couldn't find a home directory for the config")]
    NoConfigDir,
}

/// everything that used to be hardcoded on the controller
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default = "Note::wake_melody")]
    pub melody: Vec<Note>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// endpoint returning the alarm list as json
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/api/alarms".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HardwareConfig {
    pub led_pin: u8,
    pub buzzer_pin: u8,
    pub button_pin: u8,
    pub max_duty: u32,
    pub pwm_freq: u32,
    pub debounce_ms: u64,
    /// buzzer volume, 1.0 is full
    pub volume: f32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            led_pin: 25,
            buzzer_pin: 16,
            button_pin: 15,
            max_duty: 65535,
            pwm_freq: 1000,
            debounce_ms: 100,
            volume: 0.2,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// sleep between polls when there is no alarm to wait for
    pub idle_poll_secs: u64,
    /// how often the button is checked while waiting for an alarm
    pub wait_step_secs: u64,
    /// how often the light is updated while ramping
    pub ramp_step_ms: u64,
    pub recurrence_day: RecurrenceDay,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            idle_poll_secs: 60,
            wait_step_secs: 1,
            ramp_step_ms: 100,
            recurrence_day: RecurrenceDay::default(),
        }
    }
}

impl TimingConfig {
    #[must_use]
    pub const fn idle_poll(&self) -> Duration {
        Duration::from_secs(self.idle_poll_secs)
    }

    #[must_use]
    pub fn wait_step(&self) -> Duration {
        Duration::from_secs(self.wait_step_secs.max(1))
    }

    #[must_use]
    pub fn ramp_step(&self) -> Duration {
        Duration::from_millis(self.ramp_step_ms.max(1))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Note {
    /// in hz
    pub frequency: f32,
    pub duration_ms: u64,
}

impl Note {
    #[must_use]
    pub const fn new(frequency: f32, duration_ms: u64) -> Self {
        Self {
            frequency,
            duration_ms,
        }
    }

    /// A4, C#5, E5, A5
    #[must_use]
    pub fn wake_melody() -> Vec<Self> {
        vec![
            Self::new(440.0, 500),
            Self::new(554.0, 500),
            Self::new(659.0, 500),
            Self::new(880.0, 1000),
        ]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            hardware: HardwareConfig::default(),
            timing: TimingConfig::default(),
            melody: Note::wake_melody(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&config)?)
    }

    /// like [`Config::load`] but a missing file just means the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("no config at {}, using defaults", path.display());
            Ok(Self::new())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        std::fs::write(path, config).map_err(io_err)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", "dawnlight")
            .ok_or(ConfigError::NoConfigDir)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    #[must_use]
    pub fn is_config_present() -> bool {
        Self::config_path().is_ok_and(|path| path.exists())
    }
}
