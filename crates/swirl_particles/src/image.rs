//! # Particle Images
//!
//! A thin wrapper over [`RgbaImage`] plus the transforms the cache needs:
//! nearest-neighbour scale, rotation with expanded bounds, and alpha
//! multiply. The raw buffer is plain RGBA8, ready for a texture upload.
//!
//! Image factories render the untransformed *base* image for a visual tag.
//! The cache derives every rotated/scaled/faded variant from that base.

use std::collections::HashMap;

use ::image::imageops::{self, FilterType};
use ::image::{ImageBuffer, RgbaImage};
use swirl_core::Vec2;

use crate::error::FactoryError;

/// One 8-bit RGBA pixel.
pub type Rgba = ::image::Rgba<u8>;

/// Fully transparent black.
pub const TRANSPARENT: Rgba = ::image::Rgba([0, 0, 0, 0]);
/// Opaque white.
pub const WHITE: Rgba = ::image::Rgba([255, 255, 255, 255]);

/// Largest edge length, in pixels, of any cached image variant.
///
/// Lifecycle sizes beyond this are rejected at validation; keys built from
/// eased values that overshoot are clamped to it.
pub const MAX_IMAGE_SIZE: u32 = 1024;

/// Opaque color.
#[must_use]
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgba {
    ::image::Rgba([r, g, b, 255])
}

/// `a * by / 255`, rounded.
#[inline]
const fn multiply_alpha(a: u8, by: u8) -> u8 {
    ((a as u16 * by as u16 + 127) / 255) as u8
}

/// RGBA raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    buffer: RgbaImage,
}

impl Image {
    /// A transparent image.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: RgbaImage::new(width, height),
        }
    }

    /// An image filled with one color.
    #[must_use]
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            buffer: ImageBuffer::from_pixel(width, height, color),
        }
    }

    /// An image whose every pixel is computed by `f(x, y)`.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, f: impl FnMut(u32, u32) -> Rgba) -> Self {
        Self {
            buffer: ImageBuffer::from_fn(width, height, f),
        }
    }

    /// Wraps raw RGBA bytes. `None` if the length does not match.
    #[must_use]
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, bytes).map(|buffer| Self { buffer })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// `(width, height)` as a vector.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    /// True for a zero-area image.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// All pixels, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = &Rgba> {
        self.buffer.pixels()
    }

    /// Raw RGBA bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// The underlying buffer.
    #[must_use]
    pub const fn buffer(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Pixel at `(x, y)`, or `None` out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.buffer.get_pixel_checked(x, y).copied()
    }

    /// Writes one pixel; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if let Some(pixel) = self.buffer.get_pixel_mut_checked(x, y) {
            *pixel = color;
        }
    }

    /// Nearest-neighbour resample to exactly `width` x `height`.
    #[must_use]
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if width == self.width() && height == self.height() {
            return self.clone();
        }
        if self.is_empty() {
            return Self::new(width, height);
        }
        Self {
            buffer: imageops::resize(&self.buffer, width, height, FilterType::Nearest),
        }
    }

    /// Resample so the longer side is `size` pixels, keeping aspect ratio.
    #[must_use]
    pub fn scaled_to(&self, size: u32) -> Self {
        let size = u64::from(size.max(1));
        let longest = u64::from(self.width().max(self.height()).max(1));
        let w = ((u64::from(self.width()) * size + longest / 2) / longest).max(1);
        let h = ((u64::from(self.height()) * size + longest / 2) / longest).max(1);
        self.resized(w as u32, h as u32)
    }

    /// Rotates counter-clockwise (as displayed) by `degrees`.
    ///
    /// The output grows to hold the whole rotated image; uncovered pixels
    /// are transparent. Right angles are exact.
    #[must_use]
    pub fn rotated(&self, degrees: f32) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        let turn = degrees.rem_euclid(360.0);
        let buffer = match turn {
            t if t == 0.0 => return self.clone(),
            t if t == 90.0 => imageops::rotate270(&self.buffer),
            t if t == 180.0 => imageops::rotate180(&self.buffer),
            t if t == 270.0 => imageops::rotate90(&self.buffer),
            t => return self.rotated_free(t),
        };
        Self { buffer }
    }

    fn rotated_free(&self, degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (w, h) = (self.width() as f32, self.height() as f32);
        // Tolerance keeps near-right angles from growing a pixel.
        let out_w = (w * cos.abs() + h * sin.abs() - 1e-3).ceil().max(1.0) as u32;
        let out_h = (w * sin.abs() + h * cos.abs() - 1e-3).ceil().max(1.0) as u32;
        let (half_out_w, half_out_h) = (out_w as f32 * 0.5, out_h as f32 * 0.5);

        Self::from_fn(out_w, out_h, |x, y| {
            let dx = x as f32 + 0.5 - half_out_w;
            let dy = y as f32 + 0.5 - half_out_h;
            // Inverse mapping in y-down pixel space.
            let sx = (dx * cos - dy * sin + w * 0.5).floor();
            let sy = (dx * sin + dy * cos + h * 0.5).floor();
            if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
                *self.buffer.get_pixel(sx as u32, sy as u32)
            } else {
                TRANSPARENT
            }
        })
    }

    /// Multiplies every pixel's alpha by `alpha / 255`.
    #[must_use]
    pub fn with_alpha(&self, alpha: u8) -> Self {
        let mut out = self.clone();
        if alpha != 255 {
            for pixel in out.buffer.pixels_mut() {
                pixel[3] = multiply_alpha(pixel[3], alpha);
            }
        }
        out
    }
}

/// Renders the untransformed image for a visual tag.
pub trait ImageFactory: Send + Sync {
    /// Renders the base image.
    ///
    /// # Errors
    ///
    /// Any [`FactoryError`]; the cache stores nothing for the key.
    fn render_base(&self, tag: &str) -> Result<Image, FactoryError>;
}

impl<F> ImageFactory for F
where
    F: Fn(&str) -> Result<Image, FactoryError> + Send + Sync,
{
    fn render_base(&self, tag: &str) -> Result<Image, FactoryError> {
        self(tag)
    }
}

/// Default edge length for built-in base images.
pub const DEFAULT_BASE_SIZE: u32 = 32;

fn check_base_size(kind: &str, size: u32, min: u32) -> Result<(), FactoryError> {
    if size < min || size > MAX_IMAGE_SIZE {
        return Err(FactoryError::new(format!(
            "{kind} image size must be in {min}..={MAX_IMAGE_SIZE}, got {size}"
        )));
    }
    Ok(())
}

/// A plain filled square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolidImageFactory {
    /// Edge length.
    pub size: u32,
    /// Fill color.
    pub color: Rgba,
}

impl Default for SolidImageFactory {
    fn default() -> Self {
        Self {
            size: DEFAULT_BASE_SIZE,
            color: WHITE,
        }
    }
}

impl ImageFactory for SolidImageFactory {
    fn render_base(&self, _tag: &str) -> Result<Image, FactoryError> {
        check_base_size("solid", self.size, 1)?;
        Ok(Image::filled(self.size, self.size, self.color))
    }
}

/// A disc with a highlight crescent on its left edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleImageFactory {
    /// Edge length of the (square) image.
    pub size: u32,
    /// Body color.
    pub base: Rgba,
    /// Crescent color.
    pub highlight: Rgba,
}

impl Default for BubbleImageFactory {
    fn default() -> Self {
        Self {
            size: DEFAULT_BASE_SIZE,
            base: rgb(0x1e, 0x90, 0xff),
            highlight: WHITE,
        }
    }
}

impl ImageFactory for BubbleImageFactory {
    fn render_base(&self, _tag: &str) -> Result<Image, FactoryError> {
        check_base_size("bubble", self.size, 4)?;
        let r = self.size as f32 * 0.5;
        let center = Vec2::new(r, r);
        let body = center + Vec2::new(2.0, 0.0);
        let (outer2, inner2) = (r * r, (r - 2.0) * (r - 2.0));

        Ok(Image::from_fn(self.size, self.size, |x, y| {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            if (p - body).length_squared() <= inner2 {
                self.base
            } else if (p - center).length_squared() <= outer2 {
                self.highlight
            } else {
                TRANSPARENT
            }
        }))
    }
}

/// A square with a highlight rim on its left and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquabbleImageFactory {
    /// Edge length.
    pub size: u32,
    /// Body color.
    pub base: Rgba,
    /// Rim color.
    pub highlight: Rgba,
}

impl Default for SquabbleImageFactory {
    fn default() -> Self {
        Self {
            size: DEFAULT_BASE_SIZE,
            base: rgb(0xff, 0x8c, 0x00),
            highlight: WHITE,
        }
    }
}

impl ImageFactory for SquabbleImageFactory {
    fn render_base(&self, _tag: &str) -> Result<Image, FactoryError> {
        check_base_size("squabble", self.size, 2)?;
        let rim = self.size - 1;
        Ok(Image::from_fn(self.size, self.size, |x, y| {
            if x == 0 || y == rim {
                self.highlight
            } else {
                self.base
            }
        }))
    }
}

/// Dispatches on the tag to one registered factory per tag.
///
/// The default instance knows `solid`, `bubble` and `squabble`.
pub struct TaggedImageFactory {
    factories: HashMap<String, Box<dyn ImageFactory>>,
}

impl TaggedImageFactory {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers (or replaces) the factory for `tag`.
    #[must_use]
    pub fn with(mut self, tag: impl Into<String>, factory: impl ImageFactory + 'static) -> Self {
        self.factories.insert(tag.into(), Box::new(factory));
        self
    }

    /// True if `tag` has a factory.
    #[must_use]
    pub fn knows(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }
}

impl Default for TaggedImageFactory {
    fn default() -> Self {
        Self::empty()
            .with("solid", SolidImageFactory::default())
            .with("bubble", BubbleImageFactory::default())
            .with("squabble", SquabbleImageFactory::default())
    }
}

impl ImageFactory for TaggedImageFactory {
    fn render_base(&self, tag: &str) -> Result<Image, FactoryError> {
        self.factories
            .get(tag)
            .ok_or_else(|| FactoryError::new(format!("no image factory for tag '{tag}'")))?
            .render_base(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = rgb(255, 0, 0);
    const BLUE: Rgba = rgb(0, 0, 255);

    #[test]
    fn test_pixel_access() {
        let mut image = Image::new(3, 2);
        image.set_pixel(2, 1, RED);
        image.set_pixel(5, 5, RED);
        assert_eq!(image.pixel(2, 1), Some(RED));
        assert_eq!(image.pixel(0, 0), Some(TRANSPARENT));
        assert_eq!(image.pixel(3, 0), None);
        assert_eq!(image.as_bytes().len(), 3 * 2 * 4);
        assert!(Image::from_raw(2, 2, vec![0; 12]).is_none());
        assert!(Image::from_raw(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn test_scaled_keeps_aspect() {
        let image = Image::filled(32, 16, RED);
        let small = image.scaled_to(8);
        assert_eq!((small.width(), small.height()), (8, 4));
        let tiny = image.scaled_to(0);
        assert_eq!((tiny.width(), tiny.height()), (1, 1));
        assert!(tiny.pixels().all(|&p| p == RED));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        // [RED, BLUE] rotated a quarter turn counter-clockwise puts BLUE on top.
        let mut image = Image::new(2, 1);
        image.set_pixel(0, 0, RED);
        image.set_pixel(1, 0, BLUE);
        let rotated = image.rotated(90.0);
        assert_eq!((rotated.width(), rotated.height()), (1, 2));
        assert_eq!(rotated.pixel(0, 0), Some(BLUE));
        assert_eq!(rotated.pixel(0, 1), Some(RED));

        let back = image.rotated(-270.0);
        assert_eq!(back, rotated);
        let half = image.rotated(180.0);
        assert_eq!(half.pixel(0, 0), Some(BLUE));
    }

    #[test]
    fn test_rotate_expands_bounds() {
        let image = Image::filled(10, 10, RED);
        let rotated = image.rotated(45.0);
        assert_eq!(rotated.width(), 15);
        assert_eq!(rotated.height(), 15);
        // Corners fall outside the rotated square.
        assert_eq!(rotated.pixel(0, 0), Some(TRANSPARENT));
        assert_eq!(rotated.pixel(7, 7), Some(RED));
        assert_eq!(image.rotated(360.0), image);
    }

    #[test]
    fn test_alpha_multiply() {
        let image = Image::filled(2, 2, RED);
        assert_eq!(image.with_alpha(0).pixel(0, 0).map(|p| p[3]), Some(0));
        assert_eq!(image.with_alpha(128).pixel(1, 1).map(|p| p[3]), Some(128));
        assert_eq!(multiply_alpha(128, 128), 64);
    }

    #[test]
    fn test_builtin_factories() {
        let tagged = TaggedImageFactory::default();
        let bubble = tagged.render_base("bubble").unwrap();
        assert_eq!((bubble.width(), bubble.height()), (32, 32));
        // outside the disc stays transparent
        assert_eq!(bubble.pixel(0, 0), Some(TRANSPARENT));
        assert_eq!(bubble.pixel(16, 16), Some(BubbleImageFactory::default().base));
        assert_eq!(bubble.pixel(1, 16), Some(WHITE));

        let squabble = tagged.render_base("squabble").unwrap();
        assert_eq!(squabble.pixel(0, 0), Some(WHITE));
        assert_eq!(squabble.pixel(31, 31), Some(WHITE));
        assert_eq!(squabble.pixel(16, 16), Some(SquabbleImageFactory::default().base));

        assert!(tagged.render_base("unknown").is_err());
        assert!(SolidImageFactory { size: 0, color: RED }.render_base("x").is_err());
        let huge = SolidImageFactory {
            size: MAX_IMAGE_SIZE + 1,
            color: RED,
        };
        assert!(huge.render_base("x").is_err());
    }

    #[test]
    fn test_closure_factory() {
        let factory = |tag: &str| -> Result<Image, FactoryError> {
            Ok(Image::filled(tag.len() as u32, 1, RED))
        };
        assert_eq!(factory.render_base("abc").unwrap().width(), 3);
    }
}
