use std::path::{Path, PathBuf};

use crate::caption::domain::caption_spec::{CaptionSpec, CaptionStyle};
use crate::caption::domain::position::Position;
use crate::caption::domain::text_color::TextColor;
use crate::caption::domain::time_parser::parse_multi_caption;
use crate::overlay::domain::overlay_backend::{OverlayBackend, ProgressCallback};
use crate::shared::error::OverlayError;

pub const DEFAULT_DURATION: f64 = 4.0;
pub const DEFAULT_FONTSIZE: i64 = 50;
pub const DEFAULT_PADDING: u32 = 50;

/// Everything one `addtext` invocation asks for, before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct AddTextRequest {
    pub video: PathBuf,
    pub text: Option<String>,
    /// `"text,start,duration"` specs, rendered after the primary caption.
    pub multi_text: Vec<String>,
    pub start_time: f64,
    pub end_time: Option<f64>,
    pub duration: f64,
    pub position: String,
    pub fontsize: i64,
    pub padding: u32,
    pub stroke_width: Option<u32>,
    pub sticker: bool,
    pub color: String,
}

impl AddTextRequest {
    pub fn new(video: impl Into<PathBuf>) -> Self {
        Self {
            video: video.into(),
            text: None,
            multi_text: Vec::new(),
            start_time: 0.0,
            end_time: None,
            duration: DEFAULT_DURATION,
            position: Position::Bottom.keyword().to_string(),
            fontsize: DEFAULT_FONTSIZE,
            padding: DEFAULT_PADDING,
            stroke_width: None,
            sticker: false,
            color: "white".to_string(),
        }
    }

    /// Checks the request and turns it into captions, primary first.
    ///
    /// Rules run in a fixed order: input file, caption mode, timing,
    /// font size, position. Nothing is decoded or written.
    pub fn validate(&self) -> Result<Vec<CaptionSpec>, OverlayError> {
        if !self.video.is_file() {
            return Err(OverlayError::VideoNotFound(self.video.clone()));
        }

        match (&self.text, self.multi_text.is_empty()) {
            (Some(_), false) => return Err(OverlayError::ConflictingCaptionModes),
            (None, true) => return Err(OverlayError::MissingCaption),
            _ => {}
        }

        let start = self.start_time;
        let end = self.end_time.unwrap_or(start + self.duration);
        let bad_end = self.end_time.is_some_and(|e| e < 0.0 || e <= start);
        if start < 0.0 || bad_end || !start.is_finite() || !end.is_finite() {
            return Err(OverlayError::InvalidTiming { start, end });
        }

        let fontsize = u32::try_from(self.fontsize)
            .ok()
            .filter(|size| *size > 0)
            .ok_or(OverlayError::InvalidFontSize(self.fontsize))?;

        let style = CaptionStyle {
            position: self.position.parse()?,
            fontsize,
            padding: self.padding,
            stroke_width: self.stroke_width,
            color: self.color.parse::<TextColor>()?,
            sticker: self.sticker,
        };

        let mut captions = Vec::with_capacity(1 + self.multi_text.len());
        if let Some(text) = &self.text {
            captions.push(CaptionSpec::new(text, start, end - start, style.clone())?);
        }
        for spec in &self.multi_text {
            let (text, start, duration) = parse_multi_caption(spec)?;
            captions.push(CaptionSpec::new(text, start, duration, style.clone())?);
        }
        Ok(captions)
    }
}

/// `<dir>/<stem>_text.mp4` next to the input.
pub fn default_output_path(video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    video.with_file_name(format!("{stem}_text.mp4"))
}

/// Runs one overlay job through the configured backend.
///
/// Single use: the progress callback is handed to the render target.
pub struct AddTextUseCase {
    backend: Box<dyn OverlayBackend>,
    on_progress: Option<ProgressCallback>,
}

impl AddTextUseCase {
    pub fn new(backend: Box<dyn OverlayBackend>, on_progress: Option<ProgressCallback>) -> Self {
        Self {
            backend,
            on_progress,
        }
    }

    /// Builds the overlay and writes it; returns the frame rate used.
    pub fn execute(
        &mut self,
        video: &Path,
        captions: &[CaptionSpec],
        output: &Path,
    ) -> Result<f64, OverlayError> {
        log::info!(
            "Adding {} caption(s) to {}",
            captions.len(),
            video.display()
        );
        let target = self.backend.build_overlay(video, captions)?;
        let fps = target.fps();
        target.write(output, self.on_progress.take())?;
        log::info!("Saved {} at {fps:.3} fps", output.display());
        Ok(fps)
    }
}
