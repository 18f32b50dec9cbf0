pub mod frame;
pub mod map;

pub use frame::flip::FlipFrame;
pub use frame::gray::GrayscaleFrame;
pub use frame::shared::FrameSlot;
pub use frame::size::ResizeFrame;
pub use frame::{Frame, PixelLayout};
pub use map::channel::ChannelMap;
pub use map::gradient::GradientMap;
