use std::path::PathBuf;

/// Stream properties of a source video, as probed by a [`VideoReader`].
///
/// [`VideoReader`]: crate::video::domain::video_reader::VideoReader
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Exact frame rate as `(numerator, denominator)`; `fps` is its decimal form.
    pub frame_rate: (i32, i32),
    pub duration: f64,
    pub total_frames: usize,
    pub codec: String,
    pub has_audio: bool,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Presentation time of the frame at `index`, assuming constant frame rate.
    pub fn frame_time(&self, index: usize) -> f64 {
        if self.fps > 0.0 {
            index as f64 / self.fps
        } else {
            0.0
        }
    }
}
