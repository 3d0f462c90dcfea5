//! Decoded texture images, ready for GPU upload.

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "Data size doesn't match RGBA8 format"
        );
        Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        }
    }

    /// Decode an encoded image (PNG or JPEG) into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Decoded texture {}x{}", width, height);
        Ok(Self::new_rgba8(width, height, rgba.into_raw()))
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Bytes in one row of pixels.
    pub fn row_pitch(&self) -> u32 {
        self.width * self.bytes_per_pixel()
    }
}

#[cfg(test)]
pub(crate) fn encode_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_png() {
        let tex = TextureData::decode(&encode_png(3, 2, [10, 20, 30, 255])).unwrap();
        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(tex.row_pitch(), 12);
        assert_eq!(tex.data.len(), 3 * 2 * 4);
        assert_eq!(&tex.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(TextureData::decode(b"not an image").is_err());
    }
}
