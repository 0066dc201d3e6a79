use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::config_manager::{self, RenderConfig};
use crate::domain::heatmap::RampSource;
use crate::domain::pipeline::{self, RenderOptions};
use crate::domain::progress::{ConsoleProgress, ProgressObserver};
use crate::model::GridSize;

use super::helpers::resolve_output_path;

pub fn render_from_config(path: &Path) -> Result<serde_json::Value> {
    let cfg = config_manager::load_config(path)?;
    render_config(&cfg, &mut ConsoleProgress::stdout())
}

pub fn render_config(cfg: &RenderConfig, observer: &mut dyn ProgressObserver) -> Result<serde_json::Value> {
    cfg.validate()?;
    let heatmap: RampSource = cfg
        .heatmap
        .parse()
        .with_context(|| format!("Invalid heatmap '{}'", cfg.heatmap))?;
    let output = resolve_output_path(&cfg.output)?;

    let mut options = RenderOptions::new(cfg.width, cfg.height, heatmap, output);
    options.gamma = cfg.gamma;
    options.workers = cfg.workers;
    options.poll_interval = cfg.poll_interval();

    let grid = GridSize::new(cfg.width, cfg.height)?;
    let field = cfg.field.sampler(grid, cfg.viewport);
    let summary = pipeline::render(&options, field, observer)
        .with_context(|| format!("Failed to render {:?}", options.output))?;

    Ok(serde_json::json!({
        "png_path": summary.output.to_string_lossy(),
        "dimensions": [summary.width, summary.height],
        "workers": summary.workers,
        "normalization": summary.normalization,
        "elapsed_ms": summary.elapsed_ms,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fields::FieldPreset;
    use crate::domain::progress::SilentProgress;

    #[test]
    fn test_render_config_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = RenderConfig {
            width: 40,
            height: 20,
            output: tmp.path().join("ripple.png"),
            workers: Some(2),
            poll_interval_ms: 1,
            field: FieldPreset::Ripple { wavelength: 0.3 },
            ..Default::default()
        };

        let summary = render_config(&cfg, &mut SilentProgress).unwrap();
        assert_eq!(summary["dimensions"], serde_json::json!([40, 20]));
        assert_eq!(summary["workers"], 2);
        assert_eq!(summary["normalization"]["kind"], "rescaled");

        let img = image::open(tmp.path().join("ripple.png")).unwrap();
        assert_eq!((img.width(), img.height()), (40, 20));
    }

    #[test]
    fn test_unknown_heatmap_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = RenderConfig {
            width: 4,
            height: 4,
            heatmap: "builtin:nope".into(),
            output: tmp.path().join("x.png"),
            ..Default::default()
        };
        let err = render_config(&cfg, &mut SilentProgress).unwrap_err();
        assert!(format!("{:#}", err).contains("unknown builtin heatmap 'nope'"));
    }

    #[test]
    fn test_render_from_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("dipole.png");
        let cfg = RenderConfig {
            width: 16,
            height: 16,
            output: out.clone(),
            poll_interval_ms: 1,
            ..Default::default()
        };
        let cfg_path = tmp.path().join("render.json");
        config_manager::save_config(&cfg, &cfg_path).unwrap();

        let summary = render_from_config(&cfg_path).unwrap();
        assert!(out.exists());
        assert_eq!(summary["dimensions"], serde_json::json!([16, 16]));
    }
}
