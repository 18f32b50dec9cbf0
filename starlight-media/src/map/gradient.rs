use crate::ChannelMap;
use ndarray::{Array2, Zip};
use std::ops::Deref;

/// Sobel edge magnitude per pixel of a [`ChannelMap`]. The outermost rows and
/// columns have no full neighbourhood and stay at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientMap(Array2<f32>);

impl Deref for GradientMap {
    type Target = Array2<f32>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl GradientMap {
    pub fn compute(channel: &ChannelMap) -> Self {
        let (rows, cols) = channel.dim();
        let mut gradients = Array2::<f32>::zeros((rows, cols));

        Zip::indexed(&mut gradients).par_for_each(|(y, x), gradient| {
            if y == 0 || x == 0 || y + 1 >= rows || x + 1 >= cols {
                return;
            }

            let c = |dy: usize, dx: usize| channel[[y + dy - 1, x + dx - 1]] as f32;

            let gx = -c(0, 0) + c(0, 2) - 2.0 * c(1, 0) + 2.0 * c(1, 2) - c(2, 0) + c(2, 2);
            let gy = -c(0, 0) - 2.0 * c(0, 1) - c(0, 2) + c(2, 0) + 2.0 * c(2, 1) + c(2, 2);

            *gradient = (gx * gx + gy * gy).sqrt();
        });

        Self(gradients)
    }

    pub fn width(&self) -> usize {
        self.0.ncols()
    }

    pub fn height(&self) -> usize {
        self.0.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(rows: usize, cols: usize, f: impl Fn(usize, usize) -> u8) -> ChannelMap {
        ChannelMap::from_array(Array2::from_shape_fn((rows, cols), |(y, x)| f(y, x)))
    }

    #[test]
    fn flat_region_has_no_edges() {
        let gradients = GradientMap::compute(&map(5, 6, |_, _| 128));
        assert!(gradients.iter().all(|&g| g == 0.0));
    }

    #[test]
    fn vertical_step_is_horizontal_gradient() {
        // Columns 0..2 dark, 2.. bright.
        let gradients = GradientMap::compute(&map(4, 4, |_, x| if x < 2 { 0 } else { 10 }));
        // At (1, 1): gx = 10 + 20 + 10 = 40, gy = 0.
        assert_eq!(gradients[[1, 1]], 40.0);
        assert_eq!(gradients[[1, 2]], 40.0);
    }

    #[test]
    fn borders_stay_zero_for_any_input() {
        let gradients =
            GradientMap::compute(&map(7, 9, |y, x| ((y * 37 + x * 91) % 256) as u8));
        let (rows, cols) = gradients.dim();

        for x in 0..cols {
            assert_eq!(gradients[[0, x]], 0.0);
            assert_eq!(gradients[[rows - 1, x]], 0.0);
        }
        for y in 0..rows {
            assert_eq!(gradients[[y, 0]], 0.0);
            assert_eq!(gradients[[y, cols - 1]], 0.0);
        }
        assert!(gradients.iter().any(|&g| g > 0.0));
    }

    #[test]
    fn tiny_maps_are_all_border() {
        let gradients = GradientMap::compute(&map(2, 2, |y, x| (y * 200 + x * 50) as u8));
        assert!(gradients.iter().all(|&g| g == 0.0));
    }
}
