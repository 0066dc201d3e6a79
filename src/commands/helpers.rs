use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Absolute form of `output` with its parent directory created.
pub fn resolve_output_path(output: &Path) -> Result<PathBuf> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create output dir {:?}", parent))?;
    let file_name = output
        .file_name()
        .with_context(|| format!("Output path {:?} has no file name", output))?;
    let resolved = std::fs::canonicalize(parent)
        .unwrap_or_else(|_| parent.to_path_buf())
        .join(file_name);
    Ok(resolved)
}

pub fn map_anyhow(e: anyhow::Error) -> String {
    format!("{:#}", e)
}
