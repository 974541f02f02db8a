use std::sync::Arc;

use image::RgbaImage;
use tracing::{trace, warn};

use crate::decoder::{DecodeError, FrameDecoder};
use crate::encoder::encode_standalone;
use crate::error::{Error, Malformation, Result};
use crate::frame::{DisposalMethod, Frame};
use crate::parser::Container;
use crate::render::cache::{CachedFrame, RenderShared, Retention};
use crate::render::canvas;

/// Rebuilds the visible canvas for any frame index.
///
/// The engine owns one live canvas, the last frame it composited. A
/// request resumes from whichever is closest at or before the target: the
/// live canvas or a frame in the shared cache. From there it replays the
/// disposal protocol forward one frame at a time. Since frame N only
/// depends on frame N-1's canvas and disposal, any cached ancestor is a
/// valid starting point.
pub struct CompositeEngine {
    container: Arc<Container>,
    decoder: Arc<dyn FrameDecoder>,
    shared: Arc<RenderShared>,
    retention: Retention,
    key_frame_interval: usize,
    live: Option<(usize, CachedFrame)>,
}

impl CompositeEngine {
    pub fn new(
        container: Arc<Container>,
        decoder: Arc<dyn FrameDecoder>,
        shared: Arc<RenderShared>,
        retention: Retention,
        key_frame_interval: usize,
    ) -> Self {
        Self {
            container,
            decoder,
            shared,
            retention,
            key_frame_interval: key_frame_interval.max(1),
            live: None,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.container.frames.len()
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn shared(&self) -> &Arc<RenderShared> {
        &self.shared
    }

    pub fn key_frame_interval(&self) -> usize {
        self.key_frame_interval
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Index and pixels of the live canvas. After a failed frame this is
    /// what should stay on screen.
    pub fn canvas(&self) -> Option<(usize, &Arc<RgbaImage>)> {
        self.live.as_ref().map(|(index, state)| (*index, &state.canvas))
    }

    /// Composite frame `index` (clamped to the last frame).
    ///
    /// Fails with [`Error::FrameDecode`] only when frame `index` itself
    /// could not be decoded. Broken frames passed on the way are logged
    /// and skipped, their canvas keeps the state they would have been
    /// drawn over.
    #[profiling::function]
    pub fn composite(&mut self, index: usize) -> Result<Arc<RgbaImage>> {
        if self.frame_count() == 0 {
            return Err(Error::malformed(0, Malformation::NoFrames));
        }
        let index = index.min(self.frame_count() - 1);

        let (from, prev) = match self.resume_point(index) {
            Some((start, state)) if start == index => {
                self.live = Some((index, state.clone()));
                return finish(index, state);
            }
            Some((start, state)) => (start + 1, Some(state)),
            None => (0, None),
        };

        trace!("compositing {from}..={index}");

        let mut state = self.step(from, prev);
        self.publish(from, &state);
        for i in from + 1..=index {
            state = self.step(i, Some(state));
            self.publish(i, &state);
        }

        self.live = Some((index, state.clone()));
        finish(index, state)
    }

    /// Forget composites at or after `index`, frame 0 excepted.
    pub fn invalidate_from(&mut self, index: usize) {
        self.shared.cache_mut().invalidate_from(index);
        if matches!(self.live, Some((live, _)) if live >= index) {
            self.live = None;
        }
    }

    fn publish(&self, index: usize, state: &CachedFrame) {
        if self.retention.retains(index, self.key_frame_interval) {
            self.shared.cache_mut().insert(index, state.clone());
        }
    }

    fn resume_point(&self, index: usize) -> Option<(usize, CachedFrame)> {
        let cached = self
            .shared
            .cache()
            .nearest(index)
            .map(|(i, state)| (i, state.clone()));

        let live = self
            .live
            .as_ref()
            .filter(|(i, _)| *i <= index)
            .map(|(i, state)| (*i, state.clone()));

        match (cached, live) {
            (Some(c), Some(l)) => Some(if l.0 >= c.0 { l } else { c }),
            (c, l) => c.or(l),
        }
    }

    /// Apply one transition: dispose the previous frame, snapshot if this
    /// frame restores to previous, draw, and inspect frame 0 for
    /// transparency.
    fn step(&self, index: usize, prev: Option<CachedFrame>) -> CachedFrame {
        let frame = &self.container.frames[index];

        let mut canvas = match (index, prev) {
            (0, _) | (_, None) => {
                let (w, h) = self.container.canvas_size();
                Arc::new(RgbaImage::new(u32::from(w), u32::from(h)))
            }
            (_, Some(prev)) => self.dispose(index - 1, prev),
        };

        let backup = (frame.disposal == DisposalMethod::RestorePrevious).then(|| canvas.clone());

        let failure = match self.decode(frame) {
            Ok(decoded) => canvas::draw_frame(Arc::make_mut(&mut canvas), &decoded, frame).err(),
            Err(err) => Some(err),
        }
        .map(|err| {
            warn!("frame {index} failed to decode, keeping previous canvas: {err}");
            Arc::new(err)
        });

        if index == 0
            && !self.shared.has_transparency()
            && self.shared.claim_first_frame_check()
            && canvas::has_transparent_pixel(&canvas)
        {
            trace!("frame 0 shows the backdrop, marking session transparent");
            self.shared.mark_transparent();
        }

        CachedFrame {
            canvas,
            backup,
            failure,
        }
    }

    /// Run frame `prev_index`'s disposal on its own canvas.
    fn dispose(&self, prev_index: usize, prev: CachedFrame) -> Arc<RgbaImage> {
        let prev_frame = &self.container.frames[prev_index];
        let mut canvas = prev.canvas;

        match prev_frame.disposal {
            DisposalMethod::Unspecified | DisposalMethod::DoNotDispose => {}
            DisposalMethod::RestoreBackground => {
                canvas::clear_frame(Arc::make_mut(&mut canvas), prev_frame);
            }
            DisposalMethod::RestorePrevious => {
                if let Some(backup) = prev.backup {
                    canvas = backup;
                }
            }
        }

        canvas
    }

    fn decode(&self, frame: &Frame) -> std::result::Result<RgbaImage, DecodeError> {
        let container = &self.container;
        let standalone = encode_standalone(&container.header, &container.palette, frame);
        self.decoder.decode(&standalone)
    }
}

fn finish(index: usize, state: CachedFrame) -> Result<Arc<RgbaImage>> {
    match state.failure {
        Some(source) => Err(Error::frame_decode(index, source)),
        None => Ok(state.canvas),
    }
}
