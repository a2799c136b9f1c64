use std::path::{Path, PathBuf};

use crate::shared::constants::{H264_ENCODER_NAME, H264_PRESET};
use crate::shared::frame::{Frame, CHANNELS};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::audio_reader::AudioReader;
use crate::video::domain::audio_writer::AudioWriter;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use crate::video::infrastructure::ffmpeg_audio_writer::{sibling_temp, FfmpegAudioWriter};

/// Encodes H.264 video through ffmpeg-next, then attaches the source audio.
///
/// Frames go to a video-only intermediate next to the output
/// (`clip.video.mp4`). On `close` the intermediate gets the source's audio,
/// stream-copied when it is AAC and re-encoded to AAC otherwise, and is
/// then renamed onto the output. A leftover intermediate is removed on drop.
pub struct FfmpegWriter {
    output_path: Option<PathBuf>,
    intermediate: Option<PathBuf>,
    source: Option<PathBuf>,
    session: Option<EncodeSession>,
    frame_count: usize,
}

struct EncodeSession {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    time_base: ffmpeg_next::Rational,
    width: u32,
    height: u32,
}

impl EncodeSession {
    fn drain(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let ost_time_base = self
            .octx
            .stream(0)
            .ok_or("output video stream missing")?
            .time_base();
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }
}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            output_path: None,
            intermediate: None,
            source: None,
            session: None,
            frame_count: 0,
        }
    }

    /// Path of the video-only file frames are currently written to.
    pub fn intermediate_path(&self) -> Option<&Path> {
        self.intermediate.as_deref()
    }

    /// Gives the intermediate its audio track, then renames it onto
    /// `output`. The output path is only touched by that final rename.
    fn attach_audio(&self, output: &Path, intermediate: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(source) = self.source.as_deref() {
            match source_audio_codec(source)? {
                None => {}
                Some(ffmpeg_next::codec::Id::AAC) => {
                    log::debug!("copying AAC audio from {}", source.display());
                    let muxed = sibling_temp(intermediate, "aac");
                    let result = copy_audio_stream(intermediate, source, &muxed);
                    if result.is_err() {
                        let _ = std::fs::remove_file(&muxed);
                    }
                    result?;
                    std::fs::rename(&muxed, intermediate)?;
                }
                Some(other) => {
                    log::info!("re-encoding {other:?} audio to AAC");
                    if let Some(audio) = FfmpegAudioReader.read_audio(source)? {
                        FfmpegAudioWriter.write_audio(intermediate, &audio)?;
                    }
                }
            }
        }
        std::fs::rename(intermediate, output)?;
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        self.session = None;
        if let Some(intermediate) = self.intermediate.take() {
            if intermediate.exists() {
                let _ = std::fs::remove_file(intermediate);
            }
        }
    }
}

/// Picks libx264 when available, else whatever H.264 encoder the build has.
fn find_h264() -> Option<ffmpeg_next::Codec> {
    ffmpeg_next::encoder::find_by_name(H264_ENCODER_NAME)
        .or_else(|| ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::H264))
}

fn output_rate(metadata: &VideoMetadata) -> ffmpeg_next::Rational {
    let (num, den) = metadata.frame_rate;
    if num > 0 && den > 0 {
        ffmpeg_next::Rational(num, den)
    } else {
        log::warn!("source frame rate unknown, encoding at 30 fps");
        ffmpeg_next::Rational(30, 1)
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let intermediate = sibling_temp(path, "video");
        let mut octx = ffmpeg_next::format::output(&intermediate)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = find_h264().ok_or("H.264 encoder not found")?;
        let rate = output_rate(metadata);
        let time_base = rate.invert();

        let mut ost = octx.add_stream(Some(codec))?;
        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(rate));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut options = ffmpeg_next::Dictionary::new();
        options.set("preset", H264_PRESET);
        let encoder = encoder_ctx.open_with(options)?;
        ost.set_parameters(&encoder);
        ost.set_time_base(time_base);
        ost.set_avg_frame_rate(rate);
        ost.set_rate(rate);

        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "encoding {}x{} at {}/{} fps with {}",
            metadata.width,
            metadata.height,
            rate.numerator(),
            rate.denominator(),
            codec.name()
        );

        self.output_path = Some(path.to_path_buf());
        self.intermediate = Some(intermediate);
        self.source = metadata
            .source_path
            .clone()
            .filter(|_| metadata.has_audio);
        self.session = Some(EncodeSession {
            octx,
            encoder,
            scaler,
            time_base,
            width: metadata.width,
            height: metadata.height,
        });
        self.frame_count = 0;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let session = self.session.as_mut().ok_or("FfmpegWriter: not opened")?;
        if frame.width() != session.width || frame.height() != session.height {
            return Err(format!(
                "frame is {}x{}, encoder expects {}x{}",
                frame.width(),
                frame.height(),
                session.width,
                session.height
            )
            .into());
        }

        let mut rgb = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            session.width,
            session.height,
        );
        let stride = rgb.stride(0);
        let row_bytes = session.width as usize * CHANNELS;
        let dst = rgb.data_mut(0);
        for (row, src) in frame.data().chunks_exact(row_bytes).enumerate() {
            dst[row * stride..row * stride + row_bytes].copy_from_slice(src);
        }

        let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
        session.scaler.run(&rgb, &mut yuv)?;
        yuv.set_pts(Some(self.frame_count as i64));

        session.encoder.send_frame(&yuv)?;
        session.drain()?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        session.encoder.send_eof()?;
        session.drain()?;
        session.octx.write_trailer()?;
        drop(session);

        if let (Some(output), Some(intermediate)) = (self.output_path.take(), self.intermediate.take()) {
            let result = self.attach_audio(&output, &intermediate);
            if result.is_err() && intermediate.exists() {
                let _ = std::fs::remove_file(&intermediate);
            }
            result?;
            log::debug!("wrote {} frames to {}", self.frame_count, output.display());
        }
        Ok(())
    }
}

fn source_audio_codec(
    source: &Path,
) -> Result<Option<ffmpeg_next::codec::Id>, Box<dyn std::error::Error>> {
    let ictx = ffmpeg_next::format::input(source)?;
    Ok(ictx
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .map(|s| s.parameters().id()))
}

/// Muxes the video of `video` and the audio of `source` into `output`
/// without re-encoding either.
fn copy_audio_stream(
    video: &Path,
    source: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ictx_video = ffmpeg_next::format::input(video)?;
    let mut ictx_source = ffmpeg_next::format::input(source)?;
    let mut octx = ffmpeg_next::format::output(output)?;

    let video_in = ictx_video
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or("intermediate has no video stream")?;
    let video_idx = video_in.index();
    let video_tb = video_in.time_base();
    let video_rate = video_in.avg_frame_rate();
    let mut ost = octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
    ost.set_parameters(video_in.parameters());
    ost.set_avg_frame_rate(video_rate);
    unsafe {
        (*ost.parameters().as_mut_ptr()).codec_tag = 0;
    }

    let audio_in = ictx_source
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .ok_or("source has no audio stream")?;
    let audio_idx = audio_in.index();
    let audio_tb = audio_in.time_base();
    let mut ost = octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
    ost.set_parameters(audio_in.parameters());
    unsafe {
        (*ost.parameters().as_mut_ptr()).codec_tag = 0;
    }

    octx.write_header()?;

    let video_out_tb = octx.stream(0).ok_or("output video stream missing")?.time_base();
    let audio_out_tb = octx.stream(1).ok_or("output audio stream missing")?.time_base();

    for (stream, mut packet) in ictx_video.packets() {
        if stream.index() != video_idx {
            continue;
        }
        packet.rescale_ts(video_tb, video_out_tb);
        packet.set_position(-1);
        packet.set_stream(0);
        packet.write_interleaved(&mut octx)?;
    }

    for (stream, mut packet) in ictx_source.packets() {
        if stream.index() != audio_idx {
            continue;
        }
        packet.rescale_ts(audio_tb, audio_out_tb);
        packet.set_position(-1);
        packet.set_stream(1);
        packet.write_interleaved(&mut octx)?;
    }

    octx.write_trailer()?;
    Ok(())
}
