use std::path::Path;

use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::Sample;

use crate::shared::audio_segment::AudioSegment;
use crate::video::domain::audio_reader::AudioReader;

/// Decodes the audio track of a file to interleaved f32 with ffmpeg-next.
pub struct FfmpegAudioReader;

impl AudioReader for FfmpegAudioReader {
    fn read_audio(&self, path: &Path) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;
        let Some(stream) = ictx.streams().best(ffmpeg_next::media::Type::Audio) else {
            return Ok(None);
        };
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().audio()?;

        let channels = decoder.channels().max(1) as u16;
        let layout = if decoder.channel_layout().is_empty() {
            ffmpeg_next::ChannelLayout::default(channels as i32)
        } else {
            decoder.channel_layout()
        };
        let rate = decoder.rate();

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            layout,
            rate,
            Sample::F32(SampleType::Packed),
            layout,
            rate,
        )?;

        let mut samples: Vec<f32> = Vec::new();
        let mut decoded = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled = ffmpeg_next::util::frame::audio::Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                resampler.run(&decoded, &mut resampled)?;
                append_packed(&resampled, channels, &mut samples);
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler.run(&decoded, &mut resampled)?;
            append_packed(&resampled, channels, &mut samples);
        }
        if let Ok(Some(delay)) = resampler.flush(&mut resampled) {
            if delay.output > 0 {
                append_packed(&resampled, channels, &mut samples);
            }
        }

        Ok(Some(AudioSegment::new(samples, rate, channels)))
    }
}

fn append_packed(frame: &ffmpeg_next::util::frame::audio::Audio, channels: u16, out: &mut Vec<f32>) {
    let count = frame.samples() * channels as usize;
    if count == 0 {
        return;
    }
    let bytes = &frame.data(0)[..count * 4];
    out.extend(
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]])),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_video, create_test_video_with_audio};

    #[test]
    fn test_read_audio_nonexistent_file() {
        let result = FfmpegAudioReader.read_audio(Path::new("/nonexistent/file.mp4"));
        assert!(result.is_err());
    }

    #[test]
    fn test_video_without_audio_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silent.mp4");
        create_test_video(&path, 3, 64, 48, 25);
        assert!(FfmpegAudioReader.read_audio(&path).unwrap().is_none());
    }

    #[test]
    fn test_reads_stereo_track() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.mp4");
        create_test_video_with_audio(&path, 25, 64, 48, 25);

        let audio = FfmpegAudioReader.read_audio(&path).unwrap().unwrap();
        assert_eq!(audio.channels(), 2);
        assert_eq!(audio.sample_rate(), 44_100);
        assert!((audio.duration() - 1.0).abs() < 0.1, "{}", audio.duration());
        assert!(audio.samples().iter().any(|s| s.abs() > 0.1));
    }
}
