use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use serde::Serialize;
use tracing::debug;

use crate::decoder::FrameDecoder;
use crate::error::Result;
use crate::frame::Frame;
use crate::options::TimelineOptions;
use crate::parser::{parse, Container, Header};
use crate::render::{CompositeEngine, RenderPass, RenderShared, Retention};
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct CanvasSize {
    pub width: u16,
    pub height: u16,
}

/// One loaded animation: its parsed container, the shared frame cache
/// and a timeline to scrub it with.
///
/// Sessions are independent of each other. Dropping one releases its
/// cache once any render pass spawned from it has finished or been
/// cancelled.
pub struct Session {
    container: Arc<Container>,
    decoder: Arc<dyn FrameDecoder>,
    shared: Arc<RenderShared>,
    options: TimelineOptions,
    timeline: Timeline,
}

impl Session {
    /// Parse `bytes` and get ready to composite. Fails only when the
    /// container itself is malformed; broken frame data surfaces later,
    /// per frame.
    pub fn load(
        bytes: &[u8],
        decoder: Arc<dyn FrameDecoder>,
        options: TimelineOptions,
    ) -> Result<Self> {
        let container = Arc::new(parse(bytes)?);
        let shared = RenderShared::new(container.assumes_transparency);

        debug!(
            "loaded {}x{} animation with {} frames",
            container.header.width,
            container.header.height,
            container.frames.len()
        );

        let engine = CompositeEngine::new(
            container.clone(),
            decoder.clone(),
            shared.clone(),
            options.retention,
            options.key_frame_interval,
        );
        let timeline = Timeline::new(engine, &options);

        Ok(Self {
            container,
            decoder,
            shared,
            options,
            timeline,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.container.frames.len()
    }

    pub fn frame_delay(&self, index: usize) -> Option<Duration> {
        self.container.frames.get(index).map(|frame| frame.delay)
    }

    pub fn canvas_size(&self) -> CanvasSize {
        let (width, height) = self.container.canvas_size();
        CanvasSize { width, height }
    }

    /// Composite frame `index` and move the timeline there.
    pub fn get_frame(&mut self, index: usize) -> Result<Arc<RgbaImage>> {
        self.timeline.seek(index)
    }

    /// Whether the backdrop can show through. Set up front for animations
    /// that restore to background, otherwise decided by frame 0.
    pub fn has_transparency(&self) -> bool {
        self.shared.has_transparency()
    }

    /// Composite every frame in the background. Frames the pass retains
    /// land in this session's cache.
    pub fn prerender(&self, retention: Retention) -> Result<RenderPass> {
        let engine = CompositeEngine::new(
            self.container.clone(),
            self.decoder.clone(),
            self.shared.clone(),
            retention,
            self.options.key_frame_interval,
        );
        RenderPass::spawn(engine)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.container.frames
    }

    pub fn header(&self) -> &Header {
        &self.container.header
    }

    pub fn palette(&self) -> &[u8] {
        &self.container.palette
    }

    pub fn options(&self) -> &TimelineOptions {
        &self.options
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }
}
