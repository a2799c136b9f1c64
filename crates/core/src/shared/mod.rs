pub mod audio_segment;
pub mod constants;
pub mod error;
pub mod frame;
pub mod video_metadata;
