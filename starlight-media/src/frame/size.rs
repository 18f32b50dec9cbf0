use crate::frame::buffer_len;
use crate::Frame;
use anyhow::{bail, Result};
use rayon::prelude::*;

pub trait ResizeFrame {
    fn resize_to(&mut self, size: (u32, u32)) -> Result<()>;
    fn resize_into(&self, size: (u32, u32)) -> Result<Self>
    where
        Self: Sized;
}

impl ResizeFrame for Frame {
    fn resize_to(&mut self, size: (u32, u32)) -> Result<()> {
        *self = self.resize_into(size)?;
        Ok(())
    }

    /// Bilinear resample, channel by channel. Samples are taken at
    /// `target * (source / target)` and the far neighbour is clamped to the
    /// last row/column, so nothing wraps or extrapolates.
    fn resize_into(&self, size: (u32, u32)) -> Result<Self> {
        let (target_width, target_height) = size;
        if target_width == 0 || target_height == 0 {
            bail!(
                "Resize target must be positive, got {}x{}",
                target_width,
                target_height
            );
        }

        let (source_width, source_height) = self.get_size();
        let channels = self.channels();
        let source = self.pixels();

        let x_ratio = source_width as f32 / target_width as f32;
        let y_ratio = source_height as f32 / target_height as f32;
        let target_stride = target_width as usize * channels;

        let mut resized = vec![0u8; buffer_len(target_width, target_height, self.layout())?];

        resized
            .par_chunks_mut(target_stride)
            .enumerate()
            .for_each(|(ty, row)| {
                let sy = ty as f32 * y_ratio;
                let y0 = (sy.floor() as u32).min(source_height - 1);
                let y1 = (y0 + 1).min(source_height - 1);
                let dy = sy - y0 as f32;

                for tx in 0..target_width as usize {
                    let sx = tx as f32 * x_ratio;
                    let x0 = (sx.floor() as u32).min(source_width - 1);
                    let x1 = (x0 + 1).min(source_width - 1);
                    let dx = sx - x0 as f32;

                    let at = |x: u32, y: u32, channel: usize| {
                        source[(y as usize * source_width as usize + x as usize) * channels
                            + channel] as f32
                    };

                    for channel in 0..channels {
                        let c00 = at(x0, y0, channel);
                        let c01 = at(x1, y0, channel);
                        let c10 = at(x0, y1, channel);
                        let c11 = at(x1, y1, channel);

                        let value = c00 * (1.0 - dx) * (1.0 - dy)
                            + c01 * dx * (1.0 - dy)
                            + c10 * (1.0 - dx) * dy
                            + c11 * dx * dy;

                        row[tx * channels + channel] = value as u8;
                    }
                }
            });

        Frame::new(target_width, target_height, self.layout(), resized)
    }
}
