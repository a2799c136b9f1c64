use std::path::Path;

use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::Sample;

use crate::shared::audio_segment::AudioSegment;
use crate::video::domain::audio_writer::AudioWriter;

/// Encodes audio to AAC and muxes it next to the existing video stream.
///
/// The video stream is copied into a sibling temp file together with the
/// new audio, which then replaces the original.
pub struct FfmpegAudioWriter;

impl AudioWriter for FfmpegAudioWriter {
    fn write_audio(
        &self,
        video_path: &Path,
        audio: &AudioSegment,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let temp_path = sibling_temp(video_path, "aac");
        let result = mux_with_aac(video_path, &temp_path, audio);
        if result.is_err() {
            let _ = std::fs::remove_file(&temp_path);
        }
        result?;
        std::fs::rename(&temp_path, video_path)?;
        Ok(())
    }
}

/// `clip.mp4` → `clip.<tag>.mp4`, keeping the container extension.
pub(crate) fn sibling_temp(path: &Path, tag: &str) -> std::path::PathBuf {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("mp4");
    path.with_extension(format!("{tag}.{ext}"))
}

fn mux_with_aac(
    video_path: &Path,
    temp_path: &Path,
    audio: &AudioSegment,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ictx = ffmpeg_next::format::input(video_path)?;
    let mut octx = ffmpeg_next::format::output(temp_path)?;
    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let video_stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or("No video stream in source file")?;
    let video_src_idx = video_stream.index();
    let video_in_tb = video_stream.time_base();

    let mut ost_video = octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
    ost_video.set_parameters(video_stream.parameters());
    unsafe {
        (*ost_video.parameters().as_mut_ptr()).codec_tag = 0;
    }
    let video_ost_idx = ost_video.index();

    let aac = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::AAC)
        .ok_or("AAC encoder not found")?;
    let mut ost_audio = octx.add_stream(Some(aac))?;
    let audio_ost_idx = ost_audio.index();

    let layout = ffmpeg_next::ChannelLayout::default(audio.channels() as i32);
    let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(aac)
        .encoder()
        .audio()?;
    encoder_ctx.set_rate(audio.sample_rate() as i32);
    encoder_ctx.set_channel_layout(layout);
    encoder_ctx.set_format(Sample::F32(SampleType::Planar));
    encoder_ctx.set_time_base(ffmpeg_next::Rational(1, audio.sample_rate() as i32));
    if global_header {
        encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }
    let mut encoder = encoder_ctx.open_as(aac)?;
    ost_audio.set_parameters(&encoder);

    octx.write_header()?;

    let ost_video_tb = octx
        .stream(video_ost_idx)
        .ok_or("output video stream missing")?
        .time_base();
    for (stream, mut packet) in ictx.packets() {
        if stream.index() != video_src_idx {
            continue;
        }
        packet.rescale_ts(video_in_tb, ost_video_tb);
        packet.set_position(-1);
        packet.set_stream(video_ost_idx);
        packet.write_interleaved(&mut octx)?;
    }

    let mut sink = PacketSink {
        octx: &mut octx,
        stream_idx: audio_ost_idx,
        enc_time_base: encoder.time_base(),
    };
    encode_segment(&mut encoder, audio, layout, &mut sink)?;

    octx.write_trailer()?;
    Ok(())
}

struct PacketSink<'a> {
    octx: &'a mut ffmpeg_next::format::context::Output,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
}

impl PacketSink<'_> {
    fn drain(
        &mut self,
        encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let ost_tb = self
            .octx
            .stream(self.stream_idx)
            .ok_or("output audio stream missing")?
            .time_base();
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.stream_idx);
            encoded.rescale_ts(self.enc_time_base, ost_tb);
            encoded.write_interleaved(self.octx)?;
        }
        Ok(())
    }
}

/// Feeds the segment to the encoder in encoder-sized planar chunks.
fn encode_segment(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    audio: &AudioSegment,
    layout: ffmpeg_next::ChannelLayout,
    sink: &mut PacketSink<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    let chunk = match encoder.frame_size() as usize {
        0 => 1024,
        n => n,
    };

    let mut offset = 0;
    while offset < audio.frame_count() {
        let planes = audio.planes(offset, chunk);
        let len = planes.first().map_or(0, Vec::len);

        let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
            Sample::F32(SampleType::Planar),
            len,
            layout,
        );
        frame.set_rate(audio.sample_rate());
        frame.set_pts(Some(offset as i64));
        for (ch, plane) in planes.iter().enumerate() {
            let dst = frame.data_mut(ch);
            for (i, sample) in plane.iter().enumerate() {
                dst[i * 4..i * 4 + 4].copy_from_slice(&sample.to_ne_bytes());
            }
        }

        encoder.send_frame(&frame)?;
        sink.drain(encoder)?;
        offset += len;
    }

    encoder.send_eof()?;
    sink.drain(encoder)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_audio_nonexistent_file() {
        let audio = AudioSegment::new(vec![0.0; 16000], 16000, 1);
        let result = FfmpegAudioWriter.write_audio(Path::new("/nonexistent/file.mp4"), &audio);
        assert!(result.is_err());
    }

    #[test]
    fn test_sibling_temp_keeps_extension() {
        assert_eq!(
            sibling_temp(Path::new("/out/clip.mov"), "aac"),
            Path::new("/out/clip.aac.mov")
        );
        assert_eq!(
            sibling_temp(Path::new("noext"), "video"),
            Path::new("noext.video.mp4")
        );
    }
}
