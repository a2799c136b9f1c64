use std::path::Path;

use crate::shared::audio_segment::AudioSegment;

/// Decodes the audio track of a video file.
pub trait AudioReader {
    /// Decodes the best audio stream at its native rate and channel count.
    /// Returns `None` if the file has no audio.
    fn read_audio(&self, path: &Path) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>>;
}
