//! Image loading for texture data
//!
//! Every format the `image` crate decodes is converted to tightly packed
//! RGBA8, the only pixel format the render backend accepts.

use std::path::Path;

use crate::assets::AssetError;

/// Decoded RGBA8 image ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw RGBA pixel data, row-major, top row first
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Bytes per pixel
    pub const CHANNELS: usize = 4;

    /// Load an image from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }

        let decoded = image::open(path).map_err(|source| AssetError::Image {
            origin: path.display().to_string(),
            source,
        })?;
        let image = Self::from_rgba(decoded.to_rgba8());

        log::debug!("Loaded image {}x{} from {}", image.width, image.height, path.display());
        Ok(image)
    }

    /// Decode an encoded image (PNG, JPEG) held in memory
    pub fn from_bytes(bytes: &[u8], origin: &str) -> Result<Self, AssetError> {
        let decoded = image::load_from_memory(bytes).map_err(|source| AssetError::Image {
            origin: origin.to_string(),
            source,
        })?;
        Ok(Self::from_rgba(decoded.to_rgba8()))
    }

    fn from_rgba(rgba: image::RgbaImage) -> Self {
        let (width, height) = rgba.dimensions();
        Self {
            data: rgba.into_raw(),
            width,
            height,
        }
    }

    /// Create a solid color image
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        Self {
            data: color.repeat(pixel_count),
            width,
            height,
        }
    }

    /// Flip rows so the first row is the bottom of the image, the origin
    /// convention of texture coordinates
    pub fn flipped_vertically(&self) -> Self {
        let row = self.width as usize * Self::CHANNELS;
        let data = if row == 0 {
            Vec::new()
        } else {
            self.data.chunks_exact(row).rev().flatten().copied().collect()
        };

        Self {
            data,
            width: self.width,
            height: self.height,
        }
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 2, [255, 0, 0, 255]);
        assert_eq!(img.size_bytes(), 4 * 2 * ImageData::CHANNELS);
        assert_eq!(&img.data[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_flip_reverses_rows() {
        let mut img = ImageData::solid_color(1, 2, [0, 0, 0, 255]);
        img.data[0..4].copy_from_slice(&[10, 20, 30, 255]);

        let flipped = img.flipped_vertically();
        assert_eq!(&flipped.data[0..4], &[0, 0, 0, 255]);
        assert_eq!(&flipped.data[4..8], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_png_round_trip_through_decoder() {
        let source = image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]));
        let mut encoded = std::io::Cursor::new(Vec::new());
        source.write_to(&mut encoded, image::ImageFormat::Png).unwrap();

        let decoded = ImageData::from_bytes(encoded.get_ref(), "memory.png").unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(&decoded.data[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let result = ImageData::from_bytes(b"not an image", "garbage.bin");
        assert!(matches!(result, Err(AssetError::Image { .. })));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = ImageData::from_file("does/not/exist.png");
        assert!(matches!(result, Err(AssetError::NotFound(_))));
    }
}
