use crate::Frame;

/// Renderer readback is bottom-up; consumers expect top-down rows.
pub trait FlipFrame {
    fn flip_vertically(&mut self);
}

impl FlipFrame for Frame {
    fn flip_vertically(&mut self) {
        let stride = self.row_stride();
        let height = self.height() as usize;
        let half = height / 2;

        // For odd heights the middle row stays in the lower half and is never touched.
        let (top, bottom) = self.pixels_mut().split_at_mut(half * stride);
        let bottom_rows = height - half;

        for row in 0..half {
            let mirror = bottom_rows - 1 - row;
            top[row * stride..(row + 1) * stride]
                .swap_with_slice(&mut bottom[mirror * stride..(mirror + 1) * stride]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixelLayout;

    fn numbered(width: u32, height: u32, layout: PixelLayout) -> Frame {
        let len = width as usize * height as usize * layout.channels();
        Frame::new(width, height, layout, (0..len).map(|i| (i % 251) as u8).collect()).unwrap()
    }

    #[test]
    fn swaps_rows() {
        let mut frame = Frame::gray(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        frame.flip_vertically();
        assert_eq!(frame.pixels(), &[5, 6, 3, 4, 1, 2]);
    }

    #[test]
    fn keeps_pixel_bytes_together() {
        let mut frame = Frame::rgba(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        frame.flip_vertically();
        assert_eq!(frame.pixels(), &[5, 6, 7, 8, 1, 2, 3, 4]);
    }

    #[test]
    fn flipping_twice_restores_frame() {
        for (width, height) in [(1, 1), (3, 1), (4, 4), (5, 7), (64, 48)] {
            for layout in [PixelLayout::Gray, PixelLayout::Rgba] {
                let original = numbered(width, height, layout);
                let mut frame = original.clone();
                frame.flip_vertically();
                if height > 1 {
                    assert_ne!(frame, original);
                }
                frame.flip_vertically();
                assert_eq!(frame, original);
            }
        }
    }
}
