use anyhow::{anyhow, bail, Result};

pub mod flip;
pub mod gray;
pub mod shared;
pub mod size;

/// Byte layout of a frame buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// One intensity byte per pixel.
    Gray,
    /// Interleaved `R, G, B, A`, four bytes per pixel.
    Rgba,
}

impl PixelLayout {
    pub const fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgba => 4,
        }
    }
}

/// A captured camera frame. The buffer length always matches
/// `width * height * layout.channels()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    layout: PixelLayout,
    pixels: Vec<u8>,
}

pub(crate) fn buffer_len(width: u32, height: u32, layout: PixelLayout) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(layout.channels()))
        .ok_or(anyhow!("Frame size {}x{} overflows the address space", width, height))
}

impl Frame {
    pub fn new(width: u32, height: u32, layout: PixelLayout, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Frame dimensions must be positive, got {}x{}", width, height);
        }

        let expected = buffer_len(width, height, layout)?;
        if pixels.len() != expected {
            bail!(
                "Frame buffer length mismatch: {} vs {} for {}x{} {:?}",
                pixels.len(),
                expected,
                width,
                height,
                layout
            );
        }

        Ok(Self {
            width,
            height,
            layout,
            pixels,
        })
    }

    pub fn rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        Self::new(width, height, PixelLayout::Rgba, pixels)
    }

    pub fn gray(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        Self::new(width, height, PixelLayout::Gray, pixels)
    }

    /// Builds a frame where every pixel repeats `pixel`, which must hold one
    /// byte per channel of `layout`.
    pub fn filled(width: u32, height: u32, layout: PixelLayout, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != layout.channels() {
            bail!(
                "Fill pixel has {} bytes, {:?} needs {}",
                pixel.len(),
                layout,
                layout.channels()
            );
        }

        let len = buffer_len(width, height, layout)?;
        let pixels = pixel.iter().copied().cycle().take(len).collect();
        Self::new(width, height, layout, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Bytes per row.
    pub fn row_stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.row_stride();
        let start = y as usize * stride;
        &self.pixels[start..start + stride]
    }
}
