use crate::{Frame, PixelLayout};
use anyhow::Result;
use rayon::prelude::*;

pub trait GrayscaleFrame {
    /// Luminance conversion, `round(0.299 r + 0.587 g + 0.114 b)`. Alpha is ignored.
    fn to_grayscale(&self) -> Result<Frame>;
}

impl GrayscaleFrame for Frame {
    fn to_grayscale(&self) -> Result<Frame> {
        match self.layout() {
            PixelLayout::Gray => Ok(self.clone()),
            PixelLayout::Rgba => {
                let gray = self
                    .pixels()
                    .par_chunks_exact(4)
                    .map(|pixel| {
                        let (r, g, b) = (pixel[0] as f32, pixel[1] as f32, pixel[2] as f32);
                        (0.299 * r + 0.587 * g + 0.114 * b).round().min(255.0) as u8
                    })
                    .collect::<Vec<_>>();

                Frame::gray(self.width(), self.height(), gray)
            }
        }
    }
}
