use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use tracing::trace;

use crate::error::{Boundary, Error, Result};
use crate::options::TimelineOptions;
use crate::render::CompositeEngine;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A cursor over the animation's frames, backed by a composite engine.
pub struct Timeline {
    engine: CompositeEngine,
    cursor: usize,
    looping: bool,
    speed: f32,
}

impl Timeline {
    pub fn new(engine: CompositeEngine, options: &TimelineOptions) -> Self {
        Self {
            engine,
            cursor: 0,
            looping: options.looping,
            speed: options.speed,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn frame_count(&self) -> usize {
        self.engine.frame_count()
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn engine(&self) -> &CompositeEngine {
        &self.engine
    }

    /// Move the cursor to `index`, clamped to the last frame, and
    /// composite it.
    ///
    /// The cursor moves even when the frame fails to decode. The canvas it
    /// was drawn over is then available from [`Timeline::canvas`].
    pub fn seek(&mut self, index: usize) -> Result<Arc<RgbaImage>> {
        self.cursor = index.min(self.frame_count().saturating_sub(1));
        self.engine.composite(self.cursor)
    }

    /// Seek to a position on a scrub bar, `0.0` being the first frame and
    /// `1.0` the end.
    pub fn seek_fraction(&mut self, fraction: f32) -> Result<Arc<RgbaImage>> {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let index = (fraction * self.frame_count() as f32).floor() as usize;
        self.seek(index)
    }

    /// Move one frame. Running off either end wraps when looping, and
    /// otherwise fails with [`Error::BoundaryReached`] leaving the cursor
    /// where it was.
    pub fn step(&mut self, direction: Direction) -> Result<Arc<RgbaImage>> {
        let last = self.frame_count().saturating_sub(1);

        let next = match direction {
            Direction::Forward if self.cursor >= last => {
                if !self.looping {
                    return Err(Error::BoundaryReached(Boundary::End));
                }
                0
            }
            Direction::Forward => self.cursor + 1,
            Direction::Backward if self.cursor == 0 => {
                if !self.looping {
                    return Err(Error::BoundaryReached(Boundary::Start));
                }
                last
            }
            Direction::Backward => self.cursor - 1,
        };

        trace!("step {direction:?} {} -> {next}", self.cursor);
        self.seek(next)
    }

    /// Playback tick: step in the direction of the speed. A paused
    /// timeline recomposites the current frame.
    pub fn advance(&mut self) -> Result<Arc<RgbaImage>> {
        if self.speed > 0.0 {
            self.step(Direction::Forward)
        } else if self.speed < 0.0 {
            self.step(Direction::Backward)
        } else {
            self.seek(self.cursor)
        }
    }

    /// How long the current frame stays up at the current speed. `None`
    /// while paused.
    pub fn current_delay(&self) -> Option<Duration> {
        let speed = self.speed.abs();
        if speed == 0.0 || speed.is_nan() {
            return None;
        }

        let delay = self.engine.container().frames.get(self.cursor)?.delay;
        Duration::try_from_secs_f64(delay.as_secs_f64() / f64::from(speed)).ok()
    }

    /// Drop composites at or after `index`, frame 0 excepted.
    pub fn invalidate_from(&mut self, index: usize) {
        self.engine.invalidate_from(index);
    }

    pub fn canvas(&self) -> Option<&Arc<RgbaImage>> {
        self.engine.canvas().map(|(_, canvas)| canvas)
    }
}
