use anyhow::Result;
use bytes::{BufMut, Bytes, BytesMut};
use starlight_media::{Frame, GrayscaleFrame, ResizeFrame};

/// A frame prepared for the external detector, tagged with the analysis
/// cycle that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorRequest {
    pub sequence: u64,
    pub frame: Frame,
}

impl DetectorRequest {
    /// Expects an already top-down frame; converts to grayscale when asked and
    /// resamples to the detector input size.
    pub fn prepare(
        sequence: u64,
        frame: &Frame,
        input_size: (u32, u32),
        grayscale: bool,
    ) -> Result<Self> {
        let frame = if grayscale {
            frame.to_grayscale()?.resize_into(input_size)?
        } else {
            frame.resize_into(input_size)?
        };

        Ok(Self { sequence, frame })
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn channels(&self) -> usize {
        self.frame.channels()
    }

    /// Binary body understood by the detector service: big-endian width and
    /// height followed by the raw pixel bytes.
    pub fn to_bytes(&self) -> Bytes {
        let pixels = self.frame.pixels();
        let mut bytes = BytesMut::with_capacity(8 + pixels.len());
        bytes.put_u32(self.width());
        bytes.put_u32(self.height());
        bytes.put_slice(pixels);
        bytes.freeze()
    }
}
