//! Background rendering of a whole animation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel as chan;
use image::RgbaImage;
use poll_promise::Promise;
use tracing::{debug, error};

use crate::decoder::DecodeError;
use crate::error::{Error, Result};
use crate::render::engine::CompositeEngine;

/// Emitted once per frame, in order, as the pass gets through it
#[derive(Debug, Clone)]
pub enum PassEvent {
    Rendered {
        index: usize,
        canvas: Arc<RgbaImage>,
    },

    /// `canvas` is the state the broken frame was drawn over
    Failed {
        index: usize,
        canvas: Arc<RgbaImage>,
        error: Arc<DecodeError>,
    },
}

impl PassEvent {
    pub fn index(&self) -> usize {
        match self {
            PassEvent::Rendered { index, .. } | PassEvent::Failed { index, .. } => *index,
        }
    }

    pub fn canvas(&self) -> &Arc<RgbaImage> {
        match self {
            PassEvent::Rendered { canvas, .. } | PassEvent::Failed { canvas, .. } => canvas,
        }
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct PassReport {
    pub rendered: usize,
    pub failures: Vec<usize>,
    pub cancelled: bool,
}

/// Composites every frame front to back on a worker thread.
///
/// The worker owns its own engine but writes into the session's shared
/// cache, so frames it retains are immediately available to seeks made
/// from the foreground.
pub struct RenderPass {
    total: usize,
    cancel: Arc<AtomicBool>,
    progress: Arc<AtomicUsize>,
    events: chan::Receiver<PassEvent>,
    /// Taken by [`RenderPass::block_until_done`]
    report: Option<Promise<PassReport>>,
}

impl RenderPass {
    pub fn spawn(mut engine: CompositeEngine) -> Result<Self> {
        let total = engine.frame_count();
        let cancel = Arc::new(AtomicBool::new(false));
        let progress = Arc::new(AtomicUsize::new(0));
        let (event_tx, events) = chan::unbounded();
        let (sender, report) = Promise::new();

        let worker_cancel = cancel.clone();
        let worker_progress = progress.clone();
        thread::Builder::new()
            .name("scrubber-render-pass".to_owned())
            .spawn(move || {
                let report = run(&mut engine, &worker_cancel, &worker_progress, &event_tx);
                debug!(
                    "render pass done: {} rendered, {} failed, cancelled={}",
                    report.rendered,
                    report.failures.len(),
                    report.cancelled
                );
                sender.send(report);
            })
            .map_err(Error::Io)?;

        Ok(Self {
            total,
            cancel,
            progress,
            events,
            report: Some(report),
        })
    }

    /// Ask the worker to stop. It finishes the frame it is on first.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub fn frame_count(&self) -> usize {
        self.total
    }

    /// Frames processed so far
    pub fn completed(&self) -> usize {
        self.progress.load(Ordering::Acquire)
    }

    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed() as f32 / self.total as f32
    }

    pub fn events(&self) -> &chan::Receiver<PassEvent> {
        &self.events
    }

    pub fn try_report(&self) -> Option<&PassReport> {
        self.report.as_ref().and_then(Promise::ready)
    }

    pub fn is_done(&self) -> bool {
        self.try_report().is_some()
    }

    pub fn block_until_done(mut self) -> PassReport {
        self.report
            .take()
            .map(Promise::block_and_take)
            .unwrap_or_default()
    }
}

/// A dropped pass stops at the next frame boundary and releases the
/// session's cache and decoder.
impl Drop for RenderPass {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run(
    engine: &mut CompositeEngine,
    cancel: &AtomicBool,
    progress: &AtomicUsize,
    events: &chan::Sender<PassEvent>,
) -> PassReport {
    let mut report = PassReport::default();

    for index in 0..engine.frame_count() {
        if cancel.load(Ordering::Acquire) {
            report.cancelled = true;
            break;
        }

        let event = match engine.composite(index) {
            Ok(canvas) => {
                report.rendered += 1;
                PassEvent::Rendered { index, canvas }
            }
            Err(Error::FrameDecode { source, .. }) => {
                report.failures.push(index);
                let Some((_, canvas)) = engine.canvas() else {
                    break;
                };
                PassEvent::Failed {
                    index,
                    canvas: canvas.clone(),
                    error: source,
                }
            }
            Err(err) => {
                error!("render pass stopped at frame {index}: {err}");
                break;
            }
        };

        progress.store(index + 1, Ordering::Release);
        // nobody listening is fine, the cache still fills
        let _ = events.send(event);
    }

    report
}
