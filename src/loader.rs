// loader.rs - panorama and sprite decoding, off the render thread for the big one

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;

use image::io::Reader as ImageReader;
use image::RgbaImage;

use crate::error::{PanoError, Result};
use crate::i18n::{tr, tr_with};

/// Decode any supported raster into RGBA8, without the decoder's size limits.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let file = File::open(path).map_err(|source| PanoError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = ImageReader::new(BufReader::new(file)).with_guessed_format()?;
    // panoramas routinely exceed the default limits
    reader.no_limits();
    Ok(reader.decode()?.to_rgba8())
}

/// Result of a background panorama load, tagged with where it came from.
pub struct Loaded {
    pub path: PathBuf,
    pub image: Result<RgbaImage>,
}

/// Decode `path` on a worker thread and post the outcome to `tx`.
pub fn spawn_load(path: PathBuf, tx: Sender<Loaded>) {
    thread::spawn(move || {
        log::info!(
            "{}",
            tr_with("log.loading_image", &[("path", path.display().to_string())])
        );

        let image = load_rgba(&path);
        match &image {
            Ok(img) => log::info!(
                "{}",
                tr_with(
                    "log.image_loaded_size",
                    &[("w", img.width().to_string()), ("h", img.height().to_string())]
                )
            ),
            Err(e) => log::warn!("{}", tr_with("error.load_image", &[("err", e.to_string())])),
        }

        if tx.send(Loaded { path, image }).is_err() {
            log::warn!("{}", tr("error.send_to_main_failed"));
        }
    });
}
