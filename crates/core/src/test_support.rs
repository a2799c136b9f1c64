//! Synthetic media for tests.

use std::path::Path;

use crate::shared::audio_segment::AudioSegment;
use crate::video::domain::audio_writer::AudioWriter;
use crate::video::infrastructure::ffmpeg_audio_writer::FfmpegAudioWriter;

/// Encodes `num_frames` grey-ramp frames as MPEG-4 video.
pub fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: i32) {
    ffmpeg_next::init().unwrap();

    let mut octx = ffmpeg_next::format::output(path).unwrap();
    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
    let mut ost = octx.add_stream(Some(codec)).unwrap();

    let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
        .encoder()
        .video()
        .unwrap();
    encoder_ctx.set_width(width);
    encoder_ctx.set_height(height);
    encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
    encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
    encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
    if global_header {
        encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }

    let mut encoder = encoder_ctx
        .open_with(ffmpeg_next::Dictionary::new())
        .unwrap();
    ost.set_parameters(&encoder);
    ost.set_time_base(ffmpeg_next::Rational(1, fps));
    ost.set_avg_frame_rate(ffmpeg_next::Rational(fps, 1));
    octx.write_header().unwrap();
    let ost_time_base = octx.stream(0).unwrap().time_base();

    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        ffmpeg_next::format::Pixel::YUV420P,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .unwrap();

    let drain = |encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
                     octx: &mut ffmpeg_next::format::context::Output| {
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
            encoded.write_interleaved(octx).unwrap();
        }
    };

    for i in 0..num_frames {
        let mut rgb = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
        );
        let stride = rgb.stride(0);
        let value = ((i * 40) % 200 + 20) as u8;
        let data = rgb.data_mut(0);
        for row in 0..height as usize {
            data[row * stride..row * stride + width as usize * 3].fill(value);
        }

        let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb, &mut yuv).unwrap();
        yuv.set_pts(Some(i as i64));
        encoder.send_frame(&yuv).unwrap();
        drain(&mut encoder, &mut octx);
    }

    encoder.send_eof().unwrap();
    drain(&mut encoder, &mut octx);
    octx.write_trailer().unwrap();
}

/// Same as [`create_test_video`], with a stereo 440 Hz AAC track.
pub fn create_test_video_with_audio(
    path: &Path,
    num_frames: usize,
    width: u32,
    height: u32,
    fps: i32,
) {
    create_test_video(path, num_frames, width, height, fps);
    let sample_rate = 44_100u32;
    let seconds = num_frames as f64 / fps as f64;
    let frames = (seconds * sample_rate as f64) as usize;
    let samples = (0..frames)
        .flat_map(|i| {
            let v = (i as f32 * 440.0 * std::f32::consts::TAU / sample_rate as f32).sin() * 0.3;
            [v, v]
        })
        .collect();
    FfmpegAudioWriter
        .write_audio(path, &AudioSegment::new(samples, sample_rate, 2))
        .unwrap();
}
