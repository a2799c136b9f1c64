use std::path::Path;

use crate::shared::audio_segment::AudioSegment;

/// Encodes audio and muxes it into an existing video file.
pub trait AudioWriter {
    /// Replaces `video_path` with a copy carrying `audio` as its audio track.
    fn write_audio(
        &self,
        video_path: &Path,
        audio: &AudioSegment,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
