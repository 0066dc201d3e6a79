use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::{ImageFormat, RgbaImage};
use tempfile::NamedTempFile;

use crate::domain::error::RenderError;

/// Encodes `img` as PNG next to `path` and renames it into place, so a
/// failed write never leaves a partial file at `path`.
pub fn write_png_atomic(img: &RgbaImage, path: &Path) -> Result<(), RenderError> {
    let output_err = |source| RenderError::OutputPath {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if path.is_dir() {
        return Err(output_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "output path is a directory",
        )));
    }
    fs::create_dir_all(dir).map_err(output_err)?;

    let tmp = NamedTempFile::new_in(dir).map_err(output_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        img.write_to(&mut writer, ImageFormat::Png)
            .map_err(|source| RenderError::Encode {
                path: path.to_path_buf(),
                source,
            })?;
        writer.flush().map_err(output_err)?;
    }
    tmp.as_file().sync_all().map_err(output_err)?;
    tmp.persist(path).map_err(|e| output_err(e.error))?;

    log::debug!("wrote {}x{} PNG to {:?}", img.width(), img.height(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(4, 3, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn test_write_and_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/dir/out.png");
        let img = checker();
        write_png_atomic(&img, &path).unwrap();

        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back, img);
    }

    #[test]
    fn test_overwrites_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.png");
        fs::write(&path, b"stale").unwrap();
        write_png_atomic(&checker(), &path).unwrap();
        assert!(image::open(&path).is_ok());
    }

    #[test]
    fn test_directory_target_fails_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        let err = write_png_atomic(&checker(), tmp.path()).unwrap_err();
        assert!(matches!(err, RenderError::OutputPath { .. }));
        let leftovers = fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
