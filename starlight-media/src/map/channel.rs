use crate::map::{region_height, region_start};
use crate::{Frame, PixelLayout};
use anyhow::{bail, Result};
use bitvec::prelude::BitVec;
use ndarray::Array2;
use std::ops::Deref;

/// One intensity channel of the ground region, indexed `[[row, column]]`.
/// Row 0 is source row `floor(height / 3)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMap(Array2<u8>);

impl Deref for ChannelMap {
    type Target = Array2<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ChannelMap {
    /// Picks the byte at `channel_offset` inside every pixel of the bottom two
    /// thirds of `frame`.
    pub fn extract(frame: &Frame, channel_offset: usize) -> Result<Self> {
        if frame.layout() != PixelLayout::Rgba {
            bail!("Expected an RGBA frame, got {:?}", frame.layout());
        }
        let channels = frame.channels();
        if channel_offset >= channels {
            bail!("Channel offset {} out of range for an RGBA pixel", channel_offset);
        }

        let width = frame.width() as usize;
        let start = region_start(frame.height()) as usize;
        let rows = region_height(frame.height()) as usize;
        let pixels = frame.pixels();

        let map = Array2::from_shape_fn((rows, width), |(y, x)| {
            pixels[((y + start) * width + x) * channels + channel_offset]
        });

        Ok(Self(map))
    }

    pub fn from_array(map: Array2<u8>) -> Self {
        Self(map)
    }

    pub fn width(&self) -> usize {
        self.0.ncols()
    }

    pub fn height(&self) -> usize {
        self.0.nrows()
    }

    /// Row-major mask of pixels brighter than `threshold`.
    pub fn saturation_mask(&self, threshold: u8) -> BitVec {
        self.0.iter().map(|&value| value > threshold).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_bottom_two_thirds_of_one_channel() {
        // 2x6 frame, red = row index, blue = 100 + row index.
        let pixels = (0..6u8)
            .flat_map(|y| [[y, 0, 100 + y, 255], [y, 0, 100 + y, 255]])
            .flatten()
            .collect();
        let frame = Frame::rgba(2, 6, pixels).unwrap();

        let red = ChannelMap::extract(&frame, 0).unwrap();
        assert_eq!((red.height(), red.width()), (4, 2));
        assert_eq!(red[[0, 0]], 2);
        assert_eq!(red[[3, 1]], 5);

        let blue = ChannelMap::extract(&frame, 2).unwrap();
        assert_eq!(blue[[0, 1]], 102);
    }

    #[test]
    fn region_height_rounds_toward_the_ground() {
        let frame = Frame::filled(3, 7, PixelLayout::Rgba, &[9, 0, 0, 255]).unwrap();
        let map = ChannelMap::extract(&frame, 0).unwrap();
        assert_eq!(map.height(), 7 - 7 / 3);
    }

    #[test]
    fn rejects_offset_outside_pixel() {
        let frame = Frame::filled(2, 3, PixelLayout::Rgba, &[0, 0, 0, 0]).unwrap();
        assert!(ChannelMap::extract(&frame, 4).is_err());
    }

    #[test]
    fn rejects_non_rgba_frames() {
        let gray = Frame::filled(2, 3, PixelLayout::Gray, &[0]).unwrap();
        assert!(ChannelMap::extract(&gray, 0).is_err());
    }

    #[test]
    fn saturation_mask_is_strictly_greater() {
        let map = ChannelMap::from_array(Array2::from_shape_vec((1, 3), vec![160, 161, 10]).unwrap());
        let mask = map.saturation_mask(160);
        assert_eq!(mask.count_ones(), 1);
        assert!(mask[1]);
    }
}
