use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::caption::domain::caption_spec::CaptionSpec;
use crate::overlay::domain::filter_graph::build_filter_graph;
use crate::overlay::domain::overlay_backend::{OverlayBackend, ProgressCallback, RenderTarget};
use crate::shared::constants::{H264_ENCODER_NAME, H264_PRESET};
use crate::shared::error::{EngineStage, OverlayError};
use crate::video::infrastructure::ffmpeg_reader::probe;

const STDERR_TAIL_LINES: usize = 20;

/// Burns captions by running the `ffmpeg` executable with a `drawtext` chain.
pub struct FfmpegProcessBackend {
    program: PathBuf,
    font: PathBuf,
}

impl FfmpegProcessBackend {
    pub fn new(program: impl Into<PathBuf>, font: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            font: font.into(),
        }
    }
}

/// Finds the encoder binary: the configured path or name, else `ffmpeg` on `PATH`.
pub fn locate_ffmpeg(configured: Option<&Path>) -> Result<PathBuf, OverlayError> {
    let wanted = configured.unwrap_or(Path::new("ffmpeg"));
    if configured.is_some() && wanted.is_file() {
        return Ok(wanted.to_path_buf());
    }
    which::which(wanted).map_err(|e| OverlayError::Spawn {
        program: wanted.to_path_buf(),
        source: io::Error::new(io::ErrorKind::NotFound, e.to_string()),
    })
}

/// Arguments for one encode: input, filter chain, H.264 video, copied audio.
pub fn encode_args(input: &Path, filter: &str, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
    args.extend(
        [
            "-vf",
            filter,
            "-c:v",
            H264_ENCODER_NAME,
            "-preset",
            H264_PRESET,
            "-c:a",
            "copy",
        ]
        .map(OsString::from),
    );
    args.push(output.into());
    args
}

impl OverlayBackend for FfmpegProcessBackend {
    fn build_overlay(
        &self,
        video: &Path,
        captions: &[CaptionSpec],
    ) -> Result<Box<dyn RenderTarget>, OverlayError> {
        let metadata =
            probe(video).map_err(|e| OverlayError::engine(EngineStage::LoadVideo, e))?;
        let filter = build_filter_graph(captions, &self.font);
        log::debug!("filter graph: {filter}");

        Ok(Box::new(FilterGraphTarget {
            program: self.program.clone(),
            input: video.to_path_buf(),
            filter,
            fps: metadata.fps,
            total_frames: metadata.total_frames,
        }))
    }
}

struct FilterGraphTarget {
    program: PathBuf,
    input: PathBuf,
    filter: String,
    fps: f64,
    total_frames: usize,
}

impl RenderTarget for FilterGraphTarget {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn write(
        self: Box<Self>,
        output: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), OverlayError> {
        let args = encode_args(&self.input, &self.filter, output);
        log::info!("Running {} on {}", self.program.display(), self.input.display());

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| OverlayError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(OverlayError::Encoder {
                code: result.status.code(),
                stderr: tail(&String::from_utf8_lossy(&result.stderr), STDERR_TAIL_LINES),
            });
        }

        if let Some(mut callback) = on_progress {
            callback(self.total_frames, self.total_frames);
        }
        log::info!("Wrote {}", output.display());
        Ok(())
    }
}

/// Last `lines` non-empty lines of `text`, joined with `" | "`.
fn tail(text: &str, lines: usize) -> String {
    let kept: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    kept[kept.len().saturating_sub(lines)..].join(" | ")
}
