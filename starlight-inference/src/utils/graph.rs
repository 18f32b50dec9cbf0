use num::Num;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point<T: Num> {
    pub x: T,
    pub y: T,
}

/// Axis-aligned box anchored at its top-left corner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Box<T: Num> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T: Num + Copy> Box<T> {
    pub fn from_corners(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    pub fn area(&self) -> T {
        self.width * self.height
    }

    pub fn center(&self) -> Point<T> {
        let two = T::one() + T::one();
        Point {
            x: self.x + self.width / two,
            y: self.y + self.height / two,
        }
    }
}

impl<T: Num + Copy + PartialOrd> Box<T> {
    /// Both sides strictly positive. Swapped corners fail this.
    pub fn has_extent(&self) -> bool {
        self.width > T::zero() && self.height > T::zero()
    }
}

impl Point<f32> {
    /// Rescales a point from a `from` sized space into a `to` sized space.
    pub fn rescale(self, from: (f32, f32), to: (f32, f32)) -> Self {
        Point {
            x: self.x / from.0 * to.0,
            y: self.y / from.1 * to.1,
        }
    }
}
