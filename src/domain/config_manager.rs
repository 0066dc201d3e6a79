use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::domain::fields::{Charge, FieldPreset, Quantity, Viewport};
use crate::domain::heatmap::validate_gamma;

pub const ENV_PREFIX: &str = "FIELDRENDER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    #[serde(default = "default_heatmap")]
    pub heatmap: String,
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    pub output: PathBuf,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    pub field: FieldPreset,
    #[serde(default)]
    pub viewport: Viewport,
}

fn default_heatmap() -> String {
    "builtin:hot".into()
}

fn default_gamma() -> f64 {
    1.0
}

fn default_poll_interval_ms() -> u64 {
    25
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            heatmap: default_heatmap(),
            gamma: default_gamma(),
            output: PathBuf::from("field.png"),
            workers: None,
            poll_interval_ms: default_poll_interval_ms(),
            field: FieldPreset::PointCharges {
                charges: vec![
                    Charge { x: -0.4, y: 0.0, q: 1.0 },
                    Charge { x: 0.4, y: 0.0, q: -1.0 },
                ],
                quantity: Quantity::Potential,
            },
            viewport: Viewport::default(),
        }
    }
}

impl RenderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("Invalid dimensions {}x{}", self.width, self.height);
        }
        if self.workers == Some(0) {
            bail!("workers must be at least 1");
        }
        validate_gamma(self.gamma)?;
        if self.viewport.x_max <= self.viewport.x_min || self.viewport.y_max <= self.viewport.y_min {
            bail!("Viewport must have positive extent: {:?}", self.viewport);
        }
        self.field.validate().map_err(anyhow::Error::msg)?;
        Ok(())
    }
}

/// Reads `path` (format from its extension), then applies
/// `FIELDRENDER_*` environment overrides; nested keys use `__`.
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    let settings = Config::builder()
        .add_source(File::from(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to read config {:?}", path))?;

    let cfg: RenderConfig = settings
        .try_deserialize()
        .with_context(|| format!("Invalid config {:?}", path))?;
    cfg.validate()
        .with_context(|| format!("Invalid config {:?}", path))?;
    Ok(cfg)
}

pub fn save_config(config: &RenderConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir: {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(config)
        .context("Failed to serialize config")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write config to {:?}", path))?;
    Ok(())
}
