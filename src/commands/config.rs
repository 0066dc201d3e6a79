use std::path::Path;

use anyhow::{bail, Result};

use crate::domain::config_manager::{self, RenderConfig};

/// Writes a starter config to `path`, refusing to overwrite.
pub fn init_config(path: &Path) -> Result<serde_json::Value> {
    if path.exists() {
        bail!("Config {:?} already exists", path);
    }
    let cfg = RenderConfig::default();
    config_manager::save_config(&cfg, path)?;
    Ok(serde_json::json!({
        "config_path": path.to_string_lossy(),
        "output": cfg.output.to_string_lossy(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("render.json");
        init_config(&path).unwrap();
        let cfg = config_manager::load_config(&path).unwrap();
        let defaults = RenderConfig::default();
        assert_eq!((cfg.width, cfg.height), (defaults.width, defaults.height));
        assert_eq!(cfg.field, defaults.field);
        assert_eq!(cfg.heatmap, defaults.heatmap);
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("render.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(init_config(&path).is_err());
    }
}
