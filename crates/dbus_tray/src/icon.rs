use image::{imageops::FilterType, DynamicImage};

/// Edge lengths of the square renditions published in `IconPixmap`.
pub const ICON_SIZES: [u32; 5] = [16, 22, 24, 32, 48];

/// A single rendition in StatusNotifierItem's [Icon format]: ARGB32 in network byte order,
/// row-major.
///
/// [Icon format]: https://freedesktop.org/wiki/Specifications/StatusNotifierItem/Icons/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

impl Pixmap {
    fn from_image(image: &DynamicImage, size: u32) -> Self {
        let mut data = image.resize_exact(size, size, FilterType::Triangle).to_rgba8().into_raw();

        // The image crate hands out RGBA, the protocol wants ARGB.
        for chunk in data.chunks_mut(4) {
            let r = chunk[0];
            let g = chunk[1];
            let b = chunk[2];
            let a = chunk[3];
            chunk[0] = a;
            chunk[1] = r;
            chunk[2] = g;
            chunk[3] = b;
        }

        Self { width: size as i32, height: size as i32, data }
    }

    /// Wire form, one element of `a(iiay)`.
    pub fn to_wire(&self) -> (i32, i32, Vec<u8>) {
        (self.width, self.height, self.data.clone())
    }
}

/// Decode an encoded image (PNG, ICO, BMP or JPEG) and render it at every size in [`ICON_SIZES`].
///
/// Anything that can't be decoded gives no pixmaps at all, so the item just shows up without an
/// icon.
pub fn pixmaps_from_bytes(bytes: &[u8]) -> Vec<Pixmap> {
    if bytes.is_empty() {
        return Vec::new();
    }
    match image::load_from_memory(bytes) {
        Ok(image) => ICON_SIZES.iter().map(|size| Pixmap::from_image(&image, *size)).collect(),
        Err(e) => {
            log::warn!("failed to decode tray icon ({} bytes): {}", bytes.len(), e);
            Vec::new()
        }
    }
}
