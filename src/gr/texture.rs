//! Texture resource contracts and CPU-side pixel data.

use super::{ContextObject, GraphicsError};

/// Pixel channel layout and bit depth of a texture or palette surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceFormat {
    /// 32-bit RGBA, 8 bits per channel.
    R8G8B8A8,
    /// 24-bit RGB, 8 bits per channel.
    R8G8B8,
    /// 16-bit RGB, 5-6-5 bits.
    R5G6B5,
    /// 16-bit RGBA, 5-5-5-1 bits.
    R5G5B5A1,
    /// 8-bit alpha only.
    A8,
    /// 8-bit palette indices.
    Palette8,
}

impl SurfaceFormat {
    /// Bytes per pixel for this format.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::R8G8B8A8 => 4,
            Self::R8G8B8 => 3,
            Self::R5G6B5 | Self::R5G5B5A1 => 2,
            Self::A8 | Self::Palette8 => 1,
        }
    }

    /// Whether the format carries an alpha channel.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::R8G8B8A8 | Self::R5G5B5A1 | Self::A8)
    }

    /// Format name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::R8G8B8A8 => "R8G8B8A8",
            Self::R8G8B8 => "R8G8B8",
            Self::R5G6B5 => "R5G6B5",
            Self::R5G5B5A1 => "R5G5B5A1",
            Self::A8 => "A8",
            Self::Palette8 => "PALETTE8",
        }
    }
}

/// A typed GPU surface resource.
///
/// Dimensions and format are fixed at creation and never change for the
/// lifetime of the texture.
pub trait BaseTexture: ContextObject {
    /// Surface width in pixels.
    fn width(&self) -> u32;

    /// Surface height in pixels.
    fn height(&self) -> u32;

    /// Pixel format.
    fn format(&self) -> SurfaceFormat;
}

/// A texture that can be bound as a render target.
pub trait RenderTexture: BaseTexture {}

/// CPU-side pixel payload used to create and fill textures.
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format of `pixels`.
    pub format: SurfaceFormat,
    /// Raw pixel bytes, row-major, tightly packed.
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Create zero-filled pixel data.
    pub fn new(width: u32, height: u32, format: SurfaceFormat) -> Self {
        let size = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            pixels: vec![0; size],
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...) into RGBA8 pixel data.
    pub fn decode(bytes: &[u8]) -> Result<Self, GraphicsError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            format: SurfaceFormat::R8G8B8A8,
            pixels: image.into_raw(),
        })
    }

    /// Expected byte length for the dimensions and format.
    #[inline]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_sized_for_format() {
        let data = TextureData::new(4, 2, SurfaceFormat::R8G8B8A8);
        assert_eq!(data.pixels.len(), 32);
        assert_eq!(data.pixels.len(), data.expected_len());

        let data = TextureData::new(4, 2, SurfaceFormat::R5G6B5);
        assert_eq!(data.pixels.len(), 16);
    }

    #[test]
    fn test_decode_png() {
        let mut image = image::RgbaImage::new(2, 2);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();

        let data = TextureData::decode(bytes.get_ref()).unwrap();
        assert_eq!(data.width, 2);
        assert_eq!(data.height, 2);
        assert_eq!(data.format, SurfaceFormat::R8G8B8A8);
        assert_eq!(&data.pixels[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            TextureData::decode(&[1, 2, 3, 4]),
            Err(GraphicsError::ImageDecode(_))
        ));
    }
}
