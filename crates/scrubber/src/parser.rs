//! Block walker for GIF containers.
//!
//! The parser only classifies blocks and slices out their payloads. LZW data
//! is carried through untouched so a frame can later be handed, on its own,
//! to an external decoder.

use image::Limits;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::bits::color_table_len;
use crate::error::{Error, Malformation, Result};
use crate::frame::{
    normalize_delay, DisposalMethod, Frame, GraphicControl, ImageData, Position, Size,
};

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_DESCRIPTOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;

const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;

/// Signature, version and logical screen descriptor
pub const HEADER_LEN: usize = 13;
/// Introducer, four u16 fields and the packed byte
const DESCRIPTOR_LEN: usize = 10;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum Version {
    Gif87a,
    Gif89a,
}

impl Version {
    pub fn signature(self) -> &'static [u8; 6] {
        match self {
            Version::Gif87a => b"GIF87a",
            Version::Gif89a => b"GIF89a",
        }
    }

    fn from_signature(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"GIF87a" => Some(Version::Gif87a),
            b"GIF89a" => Some(Version::Gif89a),
            _ => None,
        }
    }
}

/// Both header variants, normalized
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct Header {
    pub version: Version,
    pub width: u16,
    pub height: u16,
    /// Logical screen packed byte: global table flag, color resolution,
    /// sort flag, global table size
    pub packed: u8,
    pub background_index: u8,
    pub aspect_ratio: u8,
}

impl Header {
    fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 6 {
            return Err(Error::malformed(0, Malformation::TruncatedHeader));
        }

        let version = Version::from_signature(&bytes[..6])
            .ok_or_else(|| Error::malformed(0, Malformation::BadSignature))?;

        if bytes.len() < HEADER_LEN {
            return Err(Error::malformed(6, Malformation::TruncatedHeader));
        }

        Ok(Header {
            version,
            width: u16::from_le_bytes([bytes[6], bytes[7]]),
            height: u16::from_le_bytes([bytes[8], bytes[9]]),
            packed: bytes[10],
            background_index: bytes[11],
            aspect_ratio: bytes[12],
        })
    }

    pub fn global_palette_len(&self) -> usize {
        color_table_len(self.packed)
    }

    /// Bytes one RGBA canvas of the logical screen takes
    pub fn canvas_bytes(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * 4
    }
}

/// Everything one decode session needs from the raw bytes.
///
/// Only [`parse`] builds one, so a container always has at least one frame,
/// every frame fits the logical screen and the screen fits the allocation
/// limit.
#[derive(Debug, Clone)]
pub struct Container {
    pub(crate) header: Header,
    /// RGB triples, empty when the container has no global table
    pub(crate) palette: Vec<u8>,
    pub(crate) frames: Vec<Frame>,
    /// A frame restores to background somewhere, so the backdrop may
    /// show through even if frame 0 is fully opaque.
    pub(crate) assumes_transparency: bool,
}

impl Container {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn palette(&self) -> &[u8] {
        &self.palette
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn assumes_transparency(&self) -> bool {
        self.assumes_transparency
    }

    pub fn canvas_size(&self) -> (u16, u16) {
        (self.header.width, self.header.height)
    }
}

/// Byte cursor with bounds-checked reads that report where they failed
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn take(&mut self, len: usize, reason: Malformation) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| Error::malformed(self.pos, reason))?;

        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, reason: Malformation) -> Result<u8> {
        Ok(self.take(1, reason)?[0])
    }

    /// Advance past a sub-block chain and return the bytes it spans,
    /// terminator included.
    fn sub_block_chain(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        loop {
            let Some(len) = self.peek() else {
                return Err(Error::malformed(self.pos, Malformation::MissingTerminator));
            };

            if len == 0 {
                self.pos += 1;
                return Ok(&self.bytes[start..self.pos]);
            }

            let at = self.pos;
            self.pos += 1;
            self.take(len as usize, Malformation::TruncatedSubBlock)
                .map_err(|_| Error::malformed(at, Malformation::TruncatedSubBlock))?;
        }
    }
}

/// Walk the container and collect its frames.
#[profiling::function]
pub fn parse(bytes: &[u8]) -> Result<Container> {
    let header = Header::parse(bytes)?;

    // same budget the image crate decodes under, checked before any
    // canvas gets allocated
    if Limits::default().reserve(header.canvas_bytes()).is_err() {
        return Err(Error::malformed(6, Malformation::CanvasTooLarge));
    }

    let palette_end = HEADER_LEN + header.global_palette_len();
    if bytes.len() < palette_end {
        return Err(Error::malformed(HEADER_LEN, Malformation::TruncatedHeader));
    }
    let palette = bytes[HEADER_LEN..palette_end].to_vec();

    let mut cursor = Cursor::new(bytes, palette_end);
    let mut frames: Vec<Frame> = Vec::new();
    let mut pending: Option<GraphicControl> = None;
    let mut assumes_transparency = false;

    loop {
        let Some(introducer) = cursor.peek() else {
            if frames.is_empty() {
                return Err(Error::malformed(cursor.pos, Malformation::NoFrames));
            }
            warn!(
                "container ended at byte {} without a trailer, keeping {} frames",
                cursor.pos,
                frames.len()
            );
            break;
        };

        match introducer {
            EXTENSION_INTRODUCER => {
                let start = cursor.pos;
                cursor.pos += 1;
                let label = cursor.u8(Malformation::TruncatedBlock)?;
                if label == GRAPHIC_CONTROL_LABEL {
                    pending = Some(parse_graphic_control(&mut cursor)?);
                    trace!("graphics control at {start}: {pending:?}");
                } else {
                    // comment, application, plain text: nothing we render
                    cursor.sub_block_chain()?;
                    trace!("skipped extension {label:#04x} at {start}");
                }
            }

            IMAGE_DESCRIPTOR => {
                let start = cursor.pos;
                let gce = pending.take().unwrap_or_default();
                let frame = parse_frame(&mut cursor, frames.len(), gce)?;

                if !frame.fits(header.width, header.height) {
                    return Err(Error::malformed(start, Malformation::FrameOutOfBounds));
                }

                if frame.disposal == DisposalMethod::RestoreBackground {
                    assumes_transparency = true;
                }

                trace!(
                    "frame {} at {start}: {:?} {:?} {:?}",
                    frame.index,
                    frame.position,
                    frame.size,
                    frame.disposal
                );
                frames.push(frame);
            }

            TRAILER => {
                if frames.is_empty() {
                    return Err(Error::malformed(cursor.pos, Malformation::NoFrames));
                }
                break;
            }

            other => {
                return Err(Error::malformed(
                    cursor.pos,
                    Malformation::UnknownBlock(other),
                ));
            }
        }
    }

    debug!(
        "parsed {:?} container {}x{} with {} frames",
        header.version,
        header.width,
        header.height,
        frames.len()
    );

    Ok(Container {
        header,
        palette,
        frames,
        assumes_transparency,
    })
}

/// Cursor sits right after the 0xF9 label.
fn parse_graphic_control(cursor: &mut Cursor<'_>) -> Result<GraphicControl> {
    let start = cursor.pos;
    let chain = cursor.sub_block_chain()?;

    // chain[0] is the block size, normally 4
    let block_len = chain[0] as usize;
    if block_len < 4 {
        return Err(Error::malformed(start, Malformation::ShortGraphicControl));
    }

    let payload: [u8; 4] = [chain[1], chain[2], chain[3], chain[4]];
    Ok(GraphicControl::from_payload(&payload))
}

/// Cursor sits on the 0x2C introducer.
fn parse_frame(cursor: &mut Cursor<'_>, index: usize, gce: GraphicControl) -> Result<Frame> {
    let descriptor = cursor.take(DESCRIPTOR_LEN, Malformation::TruncatedBlock)?;
    let field = |i: usize| u16::from_le_bytes([descriptor[1 + i * 2], descriptor[2 + i * 2]]);

    let position = Position {
        x: field(0),
        y: field(1),
    };
    let size = Size {
        w: field(2),
        h: field(3),
    };
    let packed = descriptor[9];

    let local_palette = cursor
        .take(color_table_len(packed), Malformation::TruncatedBlock)?
        .to_vec();
    let lzw_min_code_size = cursor.u8(Malformation::TruncatedBlock)?;
    let sub_blocks = cursor.sub_block_chain()?.to_vec();

    Ok(Frame {
        index,
        position,
        size,
        disposal: gce.disposal,
        delay: normalize_delay(gce.delay),
        transparent_index: gce.transparent_index,
        data: ImageData {
            packed,
            local_palette,
            lzw_min_code_size,
            sub_blocks,
        },
    })
}
