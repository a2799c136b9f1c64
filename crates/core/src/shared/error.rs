use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::caption::domain::position::Position;

/// Stage of the compositing engine a failure happened in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineStage {
    LoadVideo,
    CreateTextLayer,
    SetLayerProperties,
    Combine,
    Write,
}

impl fmt::Display for EngineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            EngineStage::LoadVideo => "Error loading video file",
            EngineStage::CreateTextLayer => "Error creating text clip",
            EngineStage::SetLayerProperties => "Error setting properties on text clip",
            EngineStage::Combine => "Error combining clips",
            EngineStage::Write => "Error writing video file",
        };
        f.write_str(message)
    }
}

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Video file not found: {}", .0.display())]
    VideoNotFound(PathBuf),
    #[error("--text and --multi-text are mutually exclusive")]
    ConflictingCaptionModes,
    #[error("No caption given: use --text or --multi-text")]
    MissingCaption,
    #[error("Invalid start or end time (start={start}, end={end})")]
    InvalidTiming { start: f64, end: f64 },
    #[error("Font size must be positive, got {0}")]
    InvalidFontSize(i64),
    #[error("Invalid position '{0}', expected one of: {keywords}", keywords = Position::keywords().join(", "))]
    InvalidPosition(String),
    #[error("Caption text must not be empty")]
    EmptyText,
    #[error("Invalid time format: '{0}'")]
    TimeFormat(String),
    #[error("Invalid multi-text format: '{0}'. Use -mt \"text,start,duration\"")]
    MultiCaptionFormat(String),
    #[error("Invalid color '{0}', expected a color name or #rrggbb")]
    InvalidColor(String),
    #[error("Unknown backend '{0}', expected 'composite' or 'ffmpeg'")]
    InvalidBackend(String),
    #[error("Font file not found: {}", .0.display())]
    FontMissing(PathBuf),
    #[error("No usable font found; pass --font or set {}", crate::shared::constants::FONT_ENV_VAR)]
    FontNotFound,
    #[error("{stage}: {source}")]
    Engine {
        stage: EngineStage,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("failed to launch {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ffmpeg exited with {}: {stderr}", exit_label(*.code))]
    Encoder { code: Option<i32>, stderr: String },
}

impl OverlayError {
    pub fn engine(stage: EngineStage, source: impl Into<Box<dyn std::error::Error>>) -> Self {
        OverlayError::Engine {
            stage,
            source: source.into(),
        }
    }

    /// Exit code the process should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            OverlayError::Encoder {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_is_prefixed_with_stage() {
        let err = OverlayError::engine(EngineStage::CreateTextLayer, "bad font");
        assert_eq!(err.to_string(), "Error creating text clip: bad font");
    }

    #[test]
    fn test_engine_error_exposes_source() {
        use std::error::Error;
        let err = OverlayError::engine(EngineStage::Write, "disk full");
        assert_eq!(err.source().unwrap().to_string(), "disk full");
    }

    #[test]
    fn test_invalid_position_lists_keywords() {
        let msg = OverlayError::InvalidPosition("diagonal".into()).to_string();
        assert!(msg.contains("'diagonal'"));
        assert!(msg.contains("top-left"));
        assert!(msg.contains("bottom"));
    }

    #[test]
    fn test_encoder_exit_code_is_propagated() {
        let err = OverlayError::Encoder {
            code: Some(234),
            stderr: "boom".into(),
        };
        assert_eq!(err.exit_code(), 234);
        assert!(err.to_string().contains("status 234"));
    }

    #[test]
    fn test_other_errors_exit_with_one() {
        assert_eq!(OverlayError::MissingCaption.exit_code(), 1);
        let killed = OverlayError::Encoder {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(killed.exit_code(), 1);
    }
}
