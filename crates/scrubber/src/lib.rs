//! Random-access playback for animated GIFs.
//!
//! A container is parsed once into frames that still hold their raw LZW
//! data. Any frame can then be composited on demand: the engine replays
//! the disposal protocol from the nearest cached keyframe, handing each
//! frame to an external decoder wrapped in its own standalone GIF.

mod bits;
mod decoder;
mod encoder;
mod error;
mod frame;
mod options;
mod parser;
pub mod render;
mod session;
mod timeline;

pub use decoder::{DecodeError, FrameDecoder, ImageDecoder};
pub use encoder::encode_standalone;
pub use error::{Boundary, Error, Malformation, Result};
pub use frame::{DisposalMethod, Frame, ImageData, Position, Size, DEFAULT_DELAY};
pub use options::{TimelineOptions, DEFAULT_KEY_FRAME_INTERVAL};
pub use parser::{parse, Container, Header, Version};
pub use render::{CompositeEngine, PassEvent, PassReport, RenderPass, Retention};
pub use session::{CanvasSize, Session};
pub use timeline::{Direction, Timeline};

#[cfg(test)]
mod test_util;

#[cfg(test)]
mod tests;
