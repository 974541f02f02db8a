//! Wraps a single parsed frame into a complete, standalone GIF.

use crate::frame::Frame;
use crate::parser::{Header, Version, HEADER_LEN};

const GRAPHIC_CONTROL: [u8; 3] = [0x21, 0xF9, 0x04];

/// Build a single-image container for `frame`.
///
/// The logical screen keeps the full canvas size so a decoder hands back
/// the frame already placed at its position. Timing is dropped: the
/// graphics control block, written only when the frame has a transparent
/// index, always carries a zero delay.
pub fn encode_standalone(header: &Header, palette: &[u8], frame: &Frame) -> Vec<u8> {
    let data = &frame.data;
    let mut out = Vec::with_capacity(
        HEADER_LEN + palette.len() + data.local_palette.len() + data.sub_blocks.len() + 32,
    );

    // graphics control blocks only exist since 89a
    let version = if frame.has_transparency() {
        Version::Gif89a
    } else {
        header.version
    };

    out.extend_from_slice(version.signature());
    out.extend_from_slice(&header.width.to_le_bytes());
    out.extend_from_slice(&header.height.to_le_bytes());
    out.push(header.packed);
    out.push(header.background_index);
    out.push(header.aspect_ratio);
    out.extend_from_slice(palette);

    if let Some(transparent) = frame.transparent_index {
        out.extend_from_slice(&GRAPHIC_CONTROL);
        // disposal unspecified, no user input, transparency flag set
        out.push(0b0000_0001);
        out.extend_from_slice(&[0x00, 0x00]);
        out.push(transparent);
        out.push(0x00);
    }

    out.push(0x2C);
    out.extend_from_slice(&frame.position.x.to_le_bytes());
    out.extend_from_slice(&frame.position.y.to_le_bytes());
    out.extend_from_slice(&frame.size.w.to_le_bytes());
    out.extend_from_slice(&frame.size.h.to_le_bytes());
    out.push(data.packed);
    out.extend_from_slice(&data.local_palette);
    out.push(data.lzw_min_code_size);
    out.extend_from_slice(&data.sub_blocks);

    out.push(0x3B);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::DisposalMethod;
    use crate::parser::parse;
    use crate::test_util::{GifBuilder, PIXEL_0, PIXEL_1};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn standalone_reparses_to_the_same_frame() {
        let bytes = GifBuilder::new(8, 6)
            .palette(&[[0, 0, 0], [9, 9, 9]])
            .control(DisposalMethod::RestorePrevious, 40, Some(1))
            .frame(0, 0, 8, 6, PIXEL_0)
            .frame(2, 3, 4, 2, PIXEL_1)
            .build();
        let container = parse(&bytes).unwrap();

        for frame in &container.frames {
            let standalone = encode_standalone(&container.header, &container.palette, frame);
            let single = parse(&standalone).unwrap();

            assert_eq!(single.frames.len(), 1);
            assert_eq!(single.canvas_size(), container.canvas_size());
            assert_eq!(single.palette, container.palette);

            let copy = &single.frames[0];
            assert_eq!(copy.position, frame.position);
            assert_eq!(copy.size, frame.size);
            assert_eq!(copy.data, frame.data);
            assert_eq!(copy.transparent_index, frame.transparent_index);
        }
    }

    #[test]
    fn timing_and_disposal_are_dropped() {
        let bytes = GifBuilder::new(1, 1)
            .palette(&[[0, 0, 0], [1, 1, 1]])
            .control(DisposalMethod::RestoreBackground, 500, Some(0))
            .frame(0, 0, 1, 1, PIXEL_0)
            .build();
        let container = parse(&bytes).unwrap();
        let frame = &container.frames[0];

        let standalone = encode_standalone(&container.header, &container.palette, frame);
        let gce_at = HEADER_LEN + container.palette.len();
        assert_eq!(
            &standalone[gce_at..gce_at + 8],
            &[0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00]
        );

        let single = parse(&standalone).unwrap();
        assert_eq!(single.frames[0].disposal, DisposalMethod::Unspecified);
        assert_eq!(single.frames[0].delay, Duration::from_millis(100));
    }

    #[test]
    fn opaque_frame_has_no_graphic_control() {
        let bytes = GifBuilder::new(1, 1)
            .control(DisposalMethod::DoNotDispose, 20, None)
            .frame(0, 0, 1, 1, PIXEL_0)
            .build();
        let container = parse(&bytes).unwrap();
        let standalone =
            encode_standalone(&container.header, &container.palette, &container.frames[0]);

        assert_eq!(standalone[HEADER_LEN], 0x2C);
        assert_eq!(standalone.last(), Some(&0x3B));
    }

    #[test]
    fn version_is_kept_unless_graphic_control_is_needed() {
        let plain = GifBuilder::new(1, 1)
            .version(Version::Gif87a)
            .frame(0, 0, 1, 1, PIXEL_0)
            .build();
        let container = parse(&plain).unwrap();
        let standalone =
            encode_standalone(&container.header, &container.palette, &container.frames[0]);
        assert_eq!(&standalone[..6], b"GIF87a");

        let transparent = GifBuilder::new(1, 1)
            .version(Version::Gif87a)
            .control(DisposalMethod::Unspecified, 0, Some(0))
            .frame(0, 0, 1, 1, PIXEL_0)
            .build();
        let container = parse(&transparent).unwrap();
        let standalone =
            encode_standalone(&container.header, &container.palette, &container.frames[0]);
        assert_eq!(&standalone[..6], b"GIF89a");
    }
}
