use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::caption::infrastructure::font_resolver::FontResolver;
use crate::overlay::domain::overlay_backend::OverlayBackend;
use crate::shared::error::{EngineStage, OverlayError};

use super::composite_backend::CompositeBackend;
use super::ffmpeg_process_backend::{locate_ffmpeg, FfmpegProcessBackend};
use super::fontdue_renderer::FontdueRenderer;

/// Renderer preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendChoice {
    #[default]
    Composite,
    Ffmpeg,
}

impl BackendChoice {
    pub fn name(self) -> &'static str {
        match self {
            BackendChoice::Composite => "composite",
            BackendChoice::Ffmpeg => "ffmpeg",
        }
    }
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendChoice {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "composite" => Ok(BackendChoice::Composite),
            "ffmpeg" => Ok(BackendChoice::Ffmpeg),
            other => Err(OverlayError::InvalidBackend(other.to_string())),
        }
    }
}

/// Creates the requested backend with its font resolved up front.
///
/// The ffmpeg backend additionally needs the encoder binary, taken from
/// `ffmpeg` when given and looked up on `PATH` otherwise.
pub fn create_backend(
    choice: BackendChoice,
    fonts: &FontResolver,
    ffmpeg: Option<&Path>,
) -> Result<Box<dyn OverlayBackend>, OverlayError> {
    let font = fonts.resolve()?;
    log::info!("Using font {}", font.display());

    match choice {
        BackendChoice::Composite => {
            let renderer = FontdueRenderer::from_file(&font)
                .map_err(|e| OverlayError::engine(EngineStage::CreateTextLayer, e))?;
            log::info!("Using compositing backend");
            Ok(Box::new(CompositeBackend::new(Box::new(renderer))))
        }
        BackendChoice::Ffmpeg => {
            let program = locate_ffmpeg(ffmpeg)?;
            log::info!("Using ffmpeg backend ({})", program.display());
            Ok(Box::new(FfmpegProcessBackend::new(program, font)))
        }
    }
}
