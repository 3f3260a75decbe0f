use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::time::Duration;

use crate::note::{NoteColor, NoteId, NoteKind, Palette};
use crate::utils::paths::get_config_path;

/// Default port for the store service
pub const DEFAULT_STORE_PORT: u16 = 48373;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite file next to the config.
    #[default]
    Local,
    /// An `arnotes serve` instance reached over HTTP.
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_store_url")]
    pub url: String,

    /// How often remote subscriptions re-read their document.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_store_url() -> String {
    format!("http://127.0.0.1:{DEFAULT_STORE_PORT}")
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_store_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// A physical marker bound to a note. `key` is the digit that simulates
/// detecting it in the terminal client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub key: u8,

    #[serde(default)]
    pub name: String,

    pub note_id: NoteId,

    pub kind: NoteKind,
}

fn default_markers() -> Vec<MarkerConfig> {
    vec![
        MarkerConfig {
            key: 1,
            name: "Shopping".to_string(),
            note_id: NoteId::new("note1"),
            kind: NoteKind::Shopping,
        },
        MarkerConfig {
            key: 2,
            name: "To-do".to_string(),
            note_id: NoteId::new("note2"),
            kind: NoteKind::Todo,
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Colour used when a note has none or an unreadable one.
    #[serde(default = "default_fallback_color")]
    pub fallback_color: String,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default = "default_markers")]
    pub markers: Vec<MarkerConfig>,
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_fallback_color() -> String {
    Palette::Red.name().to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            fallback_color: default_fallback_color(),
            store: StoreConfig::default(),
            markers: default_markers(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.fallback()?;

        let mut keys = HashSet::new();
        let mut kinds: HashMap<&NoteId, NoteKind> = HashMap::new();
        for marker in &self.markers {
            if !(1..=9).contains(&marker.key) {
                bail!("Marker key {} is out of range (1-9)", marker.key);
            }
            if !keys.insert(marker.key) {
                bail!("Marker key {} is used more than once", marker.key);
            }
            if let Some(existing) = kinds.insert(&marker.note_id, marker.kind)
                && existing != marker.kind
            {
                bail!(
                    "Note {} is bound both as {} and as {}",
                    marker.note_id,
                    existing,
                    marker.kind
                );
            }
        }
        Ok(())
    }

    /// Parsed fallback colour (palette name or `#RRGGBB`).
    pub fn fallback(&self) -> Result<NoteColor> {
        self.fallback_color
            .parse::<NoteColor>()
            .with_context(|| format!("Invalid fallback_color '{}'", self.fallback_color))
    }

    pub fn marker_for_key(&self, key: u8) -> Option<&MarkerConfig> {
        self.markers.iter().find(|m| m.key == key)
    }

    /// Kind of a note id according to the marker table.
    pub fn kind_of(&self, note_id: &NoteId) -> Option<NoteKind> {
        self.markers
            .iter()
            .find(|m| &m.note_id == note_id)
            .map(|m| m.kind)
    }
}
