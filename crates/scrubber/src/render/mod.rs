pub mod cache;
pub mod canvas;
mod engine;
mod pass;

pub use cache::{CachedFrame, FrameCache, RenderShared, Retention};
pub use engine::CompositeEngine;
pub use pass::{PassEvent, PassReport, RenderPass};
