//! Hand-assembled GIF bytes and a deterministic stand-in decoder.

use image::{Rgba, RgbaImage};

use crate::decoder::{DecodeError, FrameDecoder};
use crate::frame::DisposalMethod;
use crate::parser::{parse, Version};

/// LZW chain (min code size 2) for a single pixel of index 0
pub const PIXEL_0: &[u8] = &[0x02, 0x44, 0x01, 0x00];
/// LZW chain (min code size 2) for a single pixel of index 1
pub const PIXEL_1: &[u8] = &[0x02, 0x4C, 0x01, 0x00];

/// Pack raw palette indices into a sub-block chain. Only [`FakeDecoder`]
/// understands this "encoding": every payload byte is one pixel.
pub fn raw_indices(indices: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in indices.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
    out
}

fn table_bits(colors: &[[u8; 3]]) -> (u8, Vec<u8>) {
    let entries = colors.len().max(2).next_power_of_two();
    let size = entries.trailing_zeros() as u8 - 1;

    let mut table: Vec<u8> = colors.iter().flatten().copied().collect();
    table.resize(entries * 3, 0);
    (0x80 | size, table)
}

pub struct GifBuilder {
    version: Version,
    width: u16,
    height: u16,
    palette: Option<Vec<[u8; 3]>>,
    blocks: Vec<u8>,
}

impl GifBuilder {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            version: Version::Gif89a,
            width,
            height,
            palette: None,
            blocks: Vec::new(),
        }
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn palette(mut self, colors: &[[u8; 3]]) -> Self {
        self.palette = Some(colors.to_vec());
        self
    }

    pub fn control(mut self, disposal: DisposalMethod, delay: u16, transparent: Option<u8>) -> Self {
        let packed = (disposal.to_bits() << 2) | u8::from(transparent.is_some());
        self.blocks.extend_from_slice(&[0x21, 0xF9, 0x04, packed]);
        self.blocks.extend_from_slice(&delay.to_le_bytes());
        self.blocks.push(transparent.unwrap_or(0));
        self.blocks.push(0x00);
        self
    }

    fn descriptor(&mut self, x: u16, y: u16, w: u16, h: u16, packed: u8) {
        self.blocks.push(0x2C);
        for v in [x, y, w, h] {
            self.blocks.extend_from_slice(&v.to_le_bytes());
        }
        self.blocks.push(packed);
    }

    /// `chain` is the data sub-block chain, terminator included
    pub fn frame(mut self, x: u16, y: u16, w: u16, h: u16, chain: &[u8]) -> Self {
        self.descriptor(x, y, w, h, 0);
        self.blocks.push(2);
        self.blocks.extend_from_slice(chain);
        self
    }

    pub fn local_frame(
        mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        colors: &[[u8; 3]],
        chain: &[u8],
    ) -> Self {
        let (packed, table) = table_bits(colors);
        self.descriptor(x, y, w, h, packed);
        self.blocks.extend_from_slice(&table);
        self.blocks.push(2);
        self.blocks.extend_from_slice(chain);
        self
    }

    pub fn comment(mut self, text: &[u8]) -> Self {
        self.blocks.extend_from_slice(&[0x21, 0xFE]);
        self.blocks.extend_from_slice(&raw_indices(text));
        self
    }

    pub fn netscape_loop(mut self) -> Self {
        self.blocks.extend_from_slice(&[0x21, 0xFF, 0x0B]);
        self.blocks.extend_from_slice(b"NETSCAPE2.0");
        self.blocks.extend_from_slice(&[0x03, 0x01, 0x00, 0x00, 0x00]);
        self
    }

    pub fn plain_text(mut self) -> Self {
        self.blocks.extend_from_slice(&[0x21, 0x01, 0x0C]);
        self.blocks.extend_from_slice(&[0; 12]);
        self.blocks.extend_from_slice(&[0x02, b'h', b'i', 0x00]);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(self.version.signature());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());

        match &self.palette {
            Some(colors) => {
                let (packed, table) = table_bits(colors);
                out.extend_from_slice(&[packed, 0, 0]);
                out.extend_from_slice(&table);
            }
            None => out.extend_from_slice(&[0, 0, 0]),
        }

        out.extend_from_slice(&self.blocks);
        out.push(0x3B);
        out
    }
}

/// Reads [`raw_indices`] payloads back into canvas-sized RGBA, the way a
/// real GIF decoder would place the frame. Index `poison`, if set, makes
/// the whole frame fail to decode.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeDecoder {
    pub poison: Option<u8>,
}

impl FakeDecoder {
    pub fn poisoned(index: u8) -> Self {
        Self {
            poison: Some(index),
        }
    }
}

impl FrameDecoder for FakeDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
        let container = parse(bytes).map_err(|e| DecodeError::Generic(e.to_string()))?;
        let frame = &container.frames[0];
        let (width, height) = container.canvas_size();

        let mut indices = Vec::new();
        let mut chain = frame.data.sub_blocks.as_slice();
        while let Some((&len, rest)) = chain.split_first() {
            let len = len as usize;
            indices.extend_from_slice(&rest[..len]);
            chain = &rest[len..];
        }

        let (w, h) = (frame.size.w as u32, frame.size.h as u32);
        if indices.len() != (w * h) as usize {
            return Err(format!("expected {} pixels, got {}", w * h, indices.len()).into());
        }

        let palette = if frame.data.local_palette.is_empty() {
            &container.palette
        } else {
            &frame.data.local_palette
        };

        let mut image = RgbaImage::new(width as u32, height as u32);
        for (i, &index) in indices.iter().enumerate() {
            if Some(index) == self.poison {
                return Err(format!("poisoned index {index}").into());
            }

            if Some(index) == frame.transparent_index {
                continue;
            }

            let at = index as usize * 3;
            let rgb = palette
                .get(at..at + 3)
                .ok_or_else(|| DecodeError::Generic(format!("index {index} outside palette")))?;

            let x = frame.position.x as u32 + i as u32 % w;
            let y = frame.position.y as u32 + i as u32 / w;
            image.put_pixel(x, y, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        }

        Ok(image)
    }
}
