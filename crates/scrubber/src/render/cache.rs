use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::decoder::DecodeError;

/// Which composited frames survive after being rendered
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Retention {
    /// Only every `key_frame_interval`-th frame (frame 0 included) stays
    /// cached. Everything else is recomputed from the nearest keyframe.
    #[default]
    KeyFrames,

    /// Every composited frame stays cached
    All,
}

impl Retention {
    pub fn retains(self, index: usize, key_frame_interval: usize) -> bool {
        match self {
            Retention::KeyFrames => index % key_frame_interval.max(1) == 0,
            Retention::All => true,
        }
    }
}

/// Canvas state right after a frame was drawn
#[derive(Debug, Clone)]
pub struct CachedFrame {
    pub canvas: Arc<RgbaImage>,
    /// Canvas before this frame was drawn. Only kept for frames that
    /// restore to previous, the next frame consumes it.
    pub backup: Option<Arc<RgbaImage>>,
    /// The frame failed to decode, `canvas` is the state it was drawn over
    pub failure: Option<Arc<DecodeError>>,
}

/// Composited frames keyed by index
#[derive(Debug, Default)]
pub struct FrameCache {
    frames: BTreeMap<usize, CachedFrame>,
}

impl FrameCache {
    pub fn get(&self, index: usize) -> Option<&CachedFrame> {
        self.frames.get(&index)
    }

    /// The closest cached frame at or before `index`
    pub fn nearest(&self, index: usize) -> Option<(usize, &CachedFrame)> {
        self.frames
            .range(..=index)
            .next_back()
            .map(|(i, frame)| (*i, frame))
    }

    pub fn insert(&mut self, index: usize, frame: CachedFrame) {
        self.frames.insert(index, frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames.keys().copied()
    }

    /// Drop frames at or after `index`. Frame 0 always stays.
    pub fn invalidate_from(&mut self, index: usize) {
        self.frames.retain(|i, _| *i < index || *i == 0);
    }
}

/// State shared by every engine working on one session: the foreground
/// timeline and any background render pass.
#[derive(Debug, Default)]
pub struct RenderShared {
    cache: RwLock<FrameCache>,
    has_transparency: AtomicBool,
    first_frame_checked: AtomicBool,
}

impl RenderShared {
    pub fn new(assume_transparency: bool) -> Arc<Self> {
        Arc::new(Self {
            cache: RwLock::new(FrameCache::default()),
            has_transparency: AtomicBool::new(assume_transparency),
            first_frame_checked: AtomicBool::new(false),
        })
    }

    pub fn cache(&self) -> RwLockReadGuard<'_, FrameCache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cache_mut(&self) -> RwLockWriteGuard<'_, FrameCache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn has_transparency(&self) -> bool {
        self.has_transparency.load(Ordering::Acquire)
    }

    pub(crate) fn mark_transparent(&self) {
        self.has_transparency.store(true, Ordering::Release);
    }

    /// Returns true exactly once, for whoever inspects frame 0 first
    pub(crate) fn claim_first_frame_check(&self) -> bool {
        !self.first_frame_checked.swap(true, Ordering::AcqRel)
    }
}
