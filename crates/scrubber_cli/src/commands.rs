use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageFormat;
use scrubber::{
    DisposalMethod, ImageDecoder, PassEvent, PassReport, Retention, Session, TimelineOptions,
    Version,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;

pub fn load_session(path: &Path, options: TimelineOptions) -> Result<Session> {
    let bytes = fs::read(path)?;
    Ok(Session::load(&bytes, Arc::new(ImageDecoder), options)?)
}

#[derive(Debug, Serialize)]
struct FrameInfo {
    index: usize,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    delay_ms: u128,
    disposal: DisposalMethod,
    transparent_index: Option<u8>,
    interlaced: bool,
    key_frame: bool,
}

#[derive(Debug, Serialize)]
struct Info {
    version: Version,
    width: u16,
    height: u16,
    frame_count: usize,
    has_transparency: bool,
    frames: Vec<FrameInfo>,
}

pub fn info(session: &mut Session, json: bool, out: &mut impl Write) -> Result<()> {
    // frame 0 settles the transparency flag
    if let Err(err) = session.get_frame(0) {
        warn!("{err}");
    }

    let size = session.canvas_size();
    let interval = session.options().key_frame_interval;
    let info = Info {
        version: session.header().version,
        width: size.width,
        height: size.height,
        frame_count: session.frame_count(),
        has_transparency: session.has_transparency(),
        frames: session
            .frames()
            .iter()
            .map(|frame| FrameInfo {
                index: frame.index,
                x: frame.position.x,
                y: frame.position.y,
                width: frame.size.w,
                height: frame.size.h,
                delay_ms: frame.delay.as_millis(),
                disposal: frame.disposal,
                transparent_index: frame.transparent_index,
                interlaced: frame.data.is_interlaced(),
                key_frame: frame.is_key_frame(interval),
            })
            .collect(),
    };

    if json {
        serde_json::to_writer_pretty(&mut *out, &info)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "{:?} {}x{}, {} frames, transparency: {}",
        info.version, info.width, info.height, info.frame_count, info.has_transparency
    )?;
    for frame in &info.frames {
        let transparent = frame
            .transparent_index
            .map(|index| format!(" transparent={index}"))
            .unwrap_or_default();
        let interlaced = if frame.interlaced { " interlaced" } else { "" };
        let key = if frame.key_frame { " key" } else { "" };
        writeln!(
            out,
            "  #{:<4} {}x{}+{}+{} {}ms {:?}{}{}{}",
            frame.index,
            frame.width,
            frame.height,
            frame.x,
            frame.y,
            frame.delay_ms,
            frame.disposal,
            transparent,
            interlaced,
            key
        )?;
    }

    Ok(())
}

fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame-{index:04}.png"))
}

/// Render every frame in the background and write each one out as it
/// arrives. Broken frames are written with the canvas they were drawn
/// over.
pub fn explode(session: &Session, dir: &Path, retention: Retention) -> Result<PassReport> {
    fs::create_dir_all(dir)?;

    let pass = session.prerender(retention)?;
    let total = pass.frame_count();
    let step = (total / 10).max(1);

    for event in pass.events().iter() {
        let index = event.index();
        if let PassEvent::Failed { error, .. } = &event {
            warn!("frame {index} is broken, writing the previous canvas: {error}");
        }

        event
            .canvas()
            .save_with_format(frame_path(dir, index), ImageFormat::Png)?;

        if (index + 1) % step == 0 || index + 1 == total {
            info!("{}/{total} frames ({:.0}%)", index + 1, pass.fraction() * 100.0);
        }
    }

    Ok(pass.block_until_done())
}

/// Seek to one frame and save it. A frame that fails to decode is saved
/// as the canvas it would have been drawn over.
pub fn frame(session: &mut Session, index: usize, out: &Path) -> Result<()> {
    let canvas = match session.get_frame(index) {
        Ok(canvas) => canvas,
        Err(err @ scrubber::Error::FrameDecode { .. }) => {
            warn!("{err}");
            match session.timeline().canvas() {
                Some(canvas) => canvas.clone(),
                None => return Err(err.into()),
            }
        }
        Err(err) => return Err(err.into()),
    };

    canvas.save_with_format(out, ImageFormat::Png)?;
    info!(
        "wrote frame {} to {}",
        session.timeline().cursor(),
        out.display()
    );
    Ok(())
}
