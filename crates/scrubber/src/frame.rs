use std::time::Duration;

use serde::Serialize;

use crate::bits::{bit, color_table_len, extract_bits};

/// Delay used when a frame carries no usable timing: a raw delay of 0 or 1
/// hundredths would make playback spin.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// How a frame's region is treated before the next frame is drawn
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub enum DisposalMethod {
    #[default]
    Unspecified,
    DoNotDispose,
    RestoreBackground,
    RestorePrevious,
}

impl DisposalMethod {
    /// Map the 3-bit disposal field. Reserved values behave like
    /// [`DisposalMethod::Unspecified`].
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            1 => DisposalMethod::DoNotDispose,
            2 => DisposalMethod::RestoreBackground,
            3 => DisposalMethod::RestorePrevious,
            _ => DisposalMethod::Unspecified,
        }
    }

    pub fn to_bits(self) -> u8 {
        match self {
            DisposalMethod::Unspecified => 0,
            DisposalMethod::DoNotDispose => 1,
            DisposalMethod::RestoreBackground => 2,
            DisposalMethod::RestorePrevious => 3,
        }
    }
}

/// Decoded graphics control extension, waiting for the next image
/// descriptor to claim it.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct GraphicControl {
    pub disposal: DisposalMethod,
    /// Raw delay in hundredths of a second. This is the full little-endian
    /// u16 of the block, not just its low byte, so 300 means 3 seconds.
    pub delay: u16,
    pub transparent_index: Option<u8>,
}

impl GraphicControl {
    /// Parse the 4 byte payload of a graphics control block:
    /// packed, delay (u16 LE), transparent color index.
    pub fn from_payload(payload: &[u8; 4]) -> Self {
        let packed = payload[0];
        let transparent_index = bit(packed, 7).then_some(payload[3]);

        GraphicControl {
            disposal: DisposalMethod::from_bits(extract_bits(packed, 3, 3)),
            delay: u16::from_le_bytes([payload[1], payload[2]]),
            transparent_index,
        }
    }
}

/// Convert a raw delay in hundredths into a display duration.
pub fn normalize_delay(raw: u16) -> Duration {
    if raw < 2 {
        DEFAULT_DELAY
    } else {
        Duration::from_millis(u64::from(raw) * 10)
    }
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub struct Size {
    pub w: u16,
    pub h: u16,
}

/// The not-yet-decoded pixel payload of one image descriptor
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ImageData {
    /// Packed byte of the image descriptor (local table flag, interlace,
    /// sort, local table size)
    pub packed: u8,
    /// Local color table bytes, empty when absent
    pub local_palette: Vec<u8>,
    pub lzw_min_code_size: u8,
    /// Data sub-block chain, zero length terminator included
    pub sub_blocks: Vec<u8>,
}

impl ImageData {
    pub fn has_local_palette(&self) -> bool {
        color_table_len(self.packed) > 0
    }

    pub fn is_interlaced(&self) -> bool {
        bit(self.packed, 1)
    }
}

/// One logical animation frame, as parsed from the container
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Frame {
    pub index: usize,
    pub position: Position,
    pub size: Size,
    pub disposal: DisposalMethod,
    pub delay: Duration,
    pub transparent_index: Option<u8>,
    pub data: ImageData,
}

impl Frame {
    pub fn has_transparency(&self) -> bool {
        self.transparent_index.is_some()
    }

    /// Keyframes get their composite cached for the session's lifetime.
    /// Frame 0 is cached too but is not a key: every replay can start from
    /// a clear canvas.
    pub fn is_key_frame(&self, interval: usize) -> bool {
        self.index != 0 && self.index % interval.max(1) == 0
    }

    /// Does the rectangle fit inside a `width` x `height` canvas?
    pub fn fits(&self, width: u16, height: u16) -> bool {
        u32::from(self.position.x) + u32::from(self.size.w) <= u32::from(width)
            && u32::from(self.position.y) + u32::from(self.size.h) <= u32::from(height)
    }
}
