//! Image loading and caching for avatars and image bubbles.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::{Error, Result};
use crate::model::ImageHandle;

/// Natural size reported for images that are not loaded (yet).
pub const DEFAULT_NATURAL_SIZE: (u32, u32) = (256, 256);

/// Loads and caches decoded images by handle.
#[derive(Debug, Default)]
pub struct ImageStore {
    /// Directory relative handles are resolved against.
    base_dir: Option<PathBuf>,
    cache: HashMap<ImageHandle, RgbaImage>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative handles against `base_dir` (e.g. the scene file's directory).
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            cache: HashMap::new(),
        }
    }

    /// Load an image from disk, or return the cached copy.
    pub fn load(&mut self, handle: &ImageHandle) -> Result<&RgbaImage> {
        if !self.cache.contains_key(handle) {
            let path = self.resolve_path(handle);
            if !path.exists() {
                return Err(Error::NotFound(format!("image {}", path.display())));
            }
            let img = load_image_file(&path)?;
            tracing::debug!("Loaded image {} ({}x{})", path.display(), img.width(), img.height());
            self.cache.insert(handle.clone(), img);
        }
        self.cache
            .get(handle)
            .ok_or_else(|| Error::NotFound(handle.as_str().to_string()))
    }

    /// Load every handle, logging failures instead of returning them.
    ///
    /// Returns the number of images that could not be loaded.
    pub fn preload<'a>(&mut self, handles: impl IntoIterator<Item = &'a ImageHandle>) -> usize {
        let mut failed = 0;
        for handle in handles {
            if let Err(e) = self.load(handle) {
                tracing::warn!("Image {} unavailable, using placeholder: {}", handle.as_str(), e);
                failed += 1;
            }
        }
        failed
    }

    /// Register an already decoded image under `handle`.
    pub fn insert(&mut self, handle: ImageHandle, image: RgbaImage) {
        self.cache.insert(handle, image);
    }

    pub fn remove(&mut self, handle: &ImageHandle) -> Option<RgbaImage> {
        self.cache.remove(handle)
    }

    /// Get a loaded image without touching the disk.
    pub fn get(&self, handle: &ImageHandle) -> Option<&RgbaImage> {
        self.cache.get(handle)
    }

    /// Natural size of a loaded image, or [`DEFAULT_NATURAL_SIZE`] until it loads.
    pub fn natural_size(&self, handle: &ImageHandle) -> (u32, u32) {
        match self.cache.get(handle) {
            Some(img) if img.width() > 0 && img.height() > 0 => img.dimensions(),
            _ => DEFAULT_NATURAL_SIZE,
        }
    }

    fn resolve_path(&self, handle: &ImageHandle) -> PathBuf {
        let path = Path::new(handle.as_str());
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Load an image file and convert it to RGBA.
fn load_image_file(path: &Path) -> Result<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

/// Scale and crop `img` so it covers a `width` x `height` frame (CSS `object-fit: cover`).
///
/// `anchor` picks which part survives the crop: `(0.5, 0.5)` keeps the centre,
/// `(0.0, 0.0)` the top-left corner.
pub fn cover_fit(img: &RgbaImage, width: u32, height: u32, anchor: (f32, f32)) -> RgbaImage {
    if width == 0 || height == 0 || img.width() == 0 || img.height() == 0 {
        return RgbaImage::new(width, height);
    }
    let (iw, ih) = (img.width() as f32, img.height() as f32);
    let scale = (width as f32 / iw).max(height as f32 / ih);

    // Source rectangle that maps onto the frame.
    let sw = (width as f32 / scale).min(iw);
    let sh = (height as f32 / scale).min(ih);
    let sx = ((iw - sw) * anchor.0.clamp(0.0, 1.0)).clamp(0.0, iw - sw);
    let sy = ((ih - sh) * anchor.1.clamp(0.0, 1.0)).clamp(0.0, ih - sh);

    let crop = imageops::crop_imm(
        img,
        sx.round() as u32,
        sy.round() as u32,
        (sw.round() as u32).max(1),
        (sh.round() as u32).max(1),
    )
    .to_image();
    imageops::resize(&crop, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_images_report_default_square() {
        let store = ImageStore::new();
        assert_eq!(store.natural_size(&ImageHandle::new("nope.png")), DEFAULT_NATURAL_SIZE);
    }

    #[test]
    fn inserted_images_report_their_size() {
        let mut store = ImageStore::new();
        let handle = ImageHandle::new("wide");
        store.insert(handle.clone(), RgbaImage::new(400, 100));
        assert_eq!(store.natural_size(&handle), (400, 100));
    }

    #[test]
    fn missing_file_is_not_found() {
        let mut store = ImageStore::with_base_dir("/definitely/not/here");
        let err = store.load(&ImageHandle::new("avatar.png")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(store.preload([&ImageHandle::new("avatar.png")]), 1);
    }

    #[test]
    fn loads_and_caches_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::from_pixel(3, 5, image::Rgba([1, 2, 3, 255]));
        img.save(dir.path().join("pic.png")).unwrap();

        let mut store = ImageStore::with_base_dir(dir.path());
        let handle = ImageHandle::new("pic.png");
        assert_eq!(store.load(&handle).unwrap().dimensions(), (3, 5));
        assert_eq!(store.natural_size(&handle), (3, 5));
    }

    #[test]
    fn cover_fit_fills_frame() {
        let mut img = RgbaImage::new(200, 100);
        // Left half red, right half blue.
        for (x, _, px) in img.enumerate_pixels_mut() {
            *px = if x < 100 { image::Rgba([255, 0, 0, 255]) } else { image::Rgba([0, 0, 255, 255]) };
        }
        let out = cover_fit(&img, 50, 50, (0.0, 0.5));
        assert_eq!(out.dimensions(), (50, 50));
        // Anchored left: the visible square is all red.
        assert_eq!(out.get_pixel(25, 25)[0], 255);
        assert_eq!(out.get_pixel(25, 25)[2], 0);
    }
}
