use std::path::Path;

use crate::caption::domain::caption_spec::CaptionSpec;
use crate::shared::error::OverlayError;

/// Called with `(frames_done, total_frames)` while a target renders.
/// `total_frames` is 0 when the source does not report a frame count.
pub type ProgressCallback = Box<dyn FnMut(usize, usize)>;

/// Turns a source video and its captions into something that can be written.
///
/// Implementations differ in how the text reaches the pixels: composited
/// in-process or handed to an external encoder as a filter graph. Both must
/// show each caption over the same time window at the same place.
pub trait OverlayBackend {
    fn build_overlay(
        &self,
        video: &Path,
        captions: &[CaptionSpec],
    ) -> Result<Box<dyn RenderTarget>, OverlayError>;
}

/// A prepared overlay, consumed by writing it to disk.
pub trait RenderTarget {
    /// Frame rate of the source, reproduced in the output.
    fn fps(&self) -> f64;

    fn write(
        self: Box<Self>,
        output: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), OverlayError>;
}
