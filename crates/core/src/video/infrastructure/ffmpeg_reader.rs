use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Decodes video frames to RGB24 via ffmpeg-next.
pub struct FfmpegReader {
    state: Option<DecodeState>,
}

struct DecodeState {
    ictx: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { state: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads stream properties without setting up a decoder pipeline.
pub fn probe(path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;
    let ictx = ffmpeg_next::format::input(path)?;
    let (metadata, _) = read_metadata(&ictx, path)?;
    Ok(metadata)
}

fn read_metadata(
    ictx: &Input,
    path: &Path,
) -> Result<(VideoMetadata, ffmpeg_next::decoder::Video), Box<dyn std::error::Error>> {
    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or("No video stream found")?;

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
    let decoder = codec_ctx.decoder().video()?;

    let rate = [stream.avg_frame_rate(), stream.rate()]
        .into_iter()
        .find(|r| r.numerator() > 0 && r.denominator() > 0)
        .map(|r| (r.numerator(), r.denominator()))
        .unwrap_or((0, 1));
    let fps = rate.0 as f64 / rate.1 as f64;
    if fps == 0.0 {
        log::warn!("{} reports no frame rate", path.display());
    }

    let duration = if ictx.duration() > 0 {
        ictx.duration() as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64
    } else {
        let tb = stream.time_base();
        stream.duration().max(0) as f64 * tb.numerator() as f64 / tb.denominator().max(1) as f64
    };

    let metadata = VideoMetadata {
        width: decoder.width(),
        height: decoder.height(),
        fps,
        frame_rate: rate,
        duration,
        total_frames: stream.frames().max(0) as usize,
        codec: decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_default(),
        has_audio: ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .is_some(),
        source_path: Some(path.to_path_buf()),
    };
    Ok((metadata, decoder))
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;
        let (metadata, decoder) = read_metadata(&ictx, path)?;
        let stream_index = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .map(|s| s.index())
            .ok_or("No video stream found")?;

        let scaler = scaling::Context::get(
            decoder.format(),
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            scaling::Flags::BILINEAR,
        )?;

        self.state = Some(DecodeState {
            ictx,
            decoder,
            scaler,
            stream_index,
            width: metadata.width,
            height: metadata.height,
        });
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        match self.state.as_mut() {
            Some(state) => Box::new(FrameIter {
                state,
                next_index: 0,
                draining: false,
                done: false,
            }),
            None => Box::new(std::iter::once(Err("FfmpegReader: not opened".into()))),
        }
    }

    fn close(&mut self) {
        self.state = None;
    }
}

/// Decodes lazily, one frame per `next()`.
struct FrameIter<'a> {
    state: &'a mut DecodeState,
    next_index: usize,
    draining: bool,
    done: bool,
}

impl FrameIter<'_> {
    fn receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        self.state.decoder.receive_frame(&mut decoded).ok()?;

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.state.scaler.run(&decoded, &mut rgb) {
            return Some(Err(Box::new(e)));
        }
        let pixels = packed_rgb(&rgb, self.state.width, self.state.height);
        let frame = Frame::new(pixels, self.state.width, self.state.height, self.next_index);
        self.next_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for FrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(result) = self.receive() {
            return Some(result);
        }
        if self.draining {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.state.ictx.packets().next() else {
                self.draining = true;
                if let Err(e) = self.state.decoder.send_eof() {
                    self.done = true;
                    return Some(Err(Box::new(e)));
                }
                let result = self.receive();
                self.done = result.is_none();
                return result;
            };

            if stream.index() != self.state.stream_index {
                continue;
            }
            if let Err(e) = self.state.decoder.send_packet(&packet) {
                log::debug!("skipping undecodable packet: {e}");
                continue;
            }
            if let Some(result) = self.receive() {
                return Some(result);
            }
        }
    }
}

/// Copies an RGB24 ffmpeg frame into a contiguous buffer, dropping row padding.
fn packed_rgb(frame: &ffmpeg_next::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
