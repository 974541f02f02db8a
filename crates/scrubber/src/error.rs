use std::io;
use std::sync::Arc;

use crate::decoder::DecodeError;

/// Scrubber related errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The byte stream does not follow the GIF block structure. No session
    /// is created from it.
    #[error("malformed container at byte {offset}: {reason}")]
    MalformedContainer { offset: usize, reason: Malformation },

    /// The external decoder rejected a frame. The rest of the animation is
    /// still usable.
    #[error("frame {index} could not be decoded: {source}")]
    FrameDecode {
        index: usize,
        #[source]
        source: Arc<DecodeError>,
    },

    /// A step ran off either end with looping disabled
    #[error("reached the {0} of the animation")]
    BoundaryReached(Boundary),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum Malformation {
    #[error("not a GIF87a or GIF89a signature")]
    BadSignature,

    #[error("header or color table is truncated")]
    TruncatedHeader,

    #[error("block is truncated")]
    TruncatedBlock,

    #[error("sub-block runs past the end of the data")]
    TruncatedSubBlock,

    #[error("sub-block chain has no terminator")]
    MissingTerminator,

    #[error("unknown block introducer {0:#04x}")]
    UnknownBlock(u8),

    #[error("graphics control block is too short")]
    ShortGraphicControl,

    /// Frame rectangle does not fit inside the logical screen
    #[error("frame rectangle exceeds the canvas")]
    FrameOutOfBounds,

    /// Logical screen needs more memory than one canvas may take
    #[error("logical screen is too large to composite")]
    CanvasTooLarge,

    #[error("container has no image frames")]
    NoFrames,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Boundary {
    Start,
    End,
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Boundary::Start => write!(f, "start"),
            Boundary::End => write!(f, "end"),
        }
    }
}

impl Error {
    pub fn malformed(offset: usize, reason: Malformation) -> Self {
        Error::MalformedContainer { offset, reason }
    }

    pub fn frame_decode(index: usize, source: Arc<DecodeError>) -> Self {
        Error::FrameDecode { index, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
