//! Pixel operations the disposal protocol needs on a full-canvas RGBA
//! buffer. Rectangles are clipped to the canvas.

use image::RgbaImage;

use crate::decoder::DecodeError;
use crate::frame::Frame;

const CHANNELS: usize = 4;

/// Clear `w` x `h` pixels at `x`, `y` to transparent black.
pub fn clear_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32) {
    let (cw, ch) = canvas.dimensions();
    let x_end = x.saturating_add(w).min(cw);
    let y_end = y.saturating_add(h).min(ch);
    if x >= x_end || y >= y_end {
        return;
    }

    let stride = cw as usize * CHANNELS;
    let raw: &mut [u8] = &mut **canvas;
    for row in y..y_end {
        let start = row as usize * stride + x as usize * CHANNELS;
        let end = row as usize * stride + x_end as usize * CHANNELS;
        raw[start..end].fill(0);
    }
}

/// Clear the rectangle a frame occupied.
pub fn clear_frame(canvas: &mut RgbaImage, frame: &Frame) {
    clear_rect(
        canvas,
        u32::from(frame.position.x),
        u32::from(frame.position.y),
        u32::from(frame.size.w),
        u32::from(frame.size.h),
    );
}

/// Draw decoded frame pixels into the frame's rectangle.
///
/// `decoded` is either canvas-sized, with the frame already at its
/// position, or exactly the frame's size. Pixels with alpha 0 are the
/// frame's transparent index and leave the canvas as it was.
pub fn draw_frame(
    canvas: &mut RgbaImage,
    decoded: &RgbaImage,
    frame: &Frame,
) -> Result<(), DecodeError> {
    let (cw, ch) = canvas.dimensions();
    let (fw, fh) = (u32::from(frame.size.w), u32::from(frame.size.h));
    let (fx, fy) = (u32::from(frame.position.x), u32::from(frame.position.y));

    let (src_x, src_y) = if decoded.dimensions() == (cw, ch) {
        (fx, fy)
    } else if decoded.dimensions() == (fw, fh) {
        (0, 0)
    } else {
        let (found_w, found_h) = decoded.dimensions();
        return Err(DecodeError::Dimensions {
            expected_w: fw,
            expected_h: fh,
            found_w,
            found_h,
        });
    };

    let w = fw.min(cw.saturating_sub(fx));
    let h = fh.min(ch.saturating_sub(fy));

    for row in 0..h {
        for col in 0..w {
            let pixel = decoded.get_pixel(src_x + col, src_y + row);
            if pixel[3] == 0 {
                continue;
            }
            canvas.put_pixel(fx + col, fy + row, *pixel);
        }
    }

    Ok(())
}

/// Does any pixel show the backdrop through?
pub fn has_transparent_pixel(canvas: &RgbaImage) -> bool {
    canvas.pixels().any(|pixel| pixel[3] == 0)
}
