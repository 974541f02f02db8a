use serde::{Deserialize, Serialize};

use crate::render::Retention;

pub const DEFAULT_KEY_FRAME_INTERVAL: usize = 15;
const DEFAULT_SPEED: f32 = 1.0;
const DEFAULT_LOOPING: bool = false;

/// Playback and caching knobs for a [`crate::Session`]
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct TimelineOptions {
    #[serde(default = "default_key_frame_interval")]
    pub key_frame_interval: usize,
    #[serde(default)]
    pub looping: bool,
    /// Playback rate. Negative plays backwards, zero pauses.
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub retention: Retention,
}

fn default_key_frame_interval() -> usize {
    DEFAULT_KEY_FRAME_INTERVAL
}

fn default_speed() -> f32 {
    DEFAULT_SPEED
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            key_frame_interval: default_key_frame_interval(),
            looping: DEFAULT_LOOPING,
            speed: default_speed(),
            retention: Retention::default(),
        }
    }
}

impl TimelineOptions {
    pub fn key_frame_interval(mut self, interval: usize) -> Self {
        self.key_frame_interval = interval.max(1);
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }
}
