use crate::Frame;
use log::debug;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;

/// Single-frame mailbox between the renderer and the analysis loop.
/// Publishing replaces any frame that was not yet taken; taking moves the
/// frame out, so a frame is never analysed twice.
#[derive(Clone, Default)]
pub struct FrameSlot(Arc<Mutex<Option<Frame>>>);

impl Debug for FrameSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.0.lock();
        match guard.as_ref() {
            Some(frame) => write!(f, "FrameSlot({}x{})", frame.width(), frame.height()),
            None => write!(f, "FrameSlot(empty)"),
        }
    }
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: Frame) {
        if self.0.lock().replace(frame).is_some() {
            debug!("Replaced a frame that was never analysed");
        }
    }

    pub fn take(&self) -> Option<Frame> {
        self.0.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_none()
    }
}
