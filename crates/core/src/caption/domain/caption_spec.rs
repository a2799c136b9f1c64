use crate::shared::constants::{DEFAULT_STROKE_WIDTH, STICKER_STROKE_WIDTH};
use crate::shared::error::OverlayError;

use super::fade_window::FadeWindow;
use super::position::Position;
use super::text_color::TextColor;

/// Visual style shared by every caption of one invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionStyle {
    pub position: Position,
    pub fontsize: u32,
    pub padding: u32,
    /// Explicit outline width; `None` derives it from `sticker`.
    pub stroke_width: Option<u32>,
    pub color: TextColor,
    /// Sticker captions get a much heavier outline by default.
    pub sticker: bool,
}

impl CaptionStyle {
    pub fn effective_stroke_width(&self) -> u32 {
        match self.stroke_width {
            Some(width) => width,
            None if self.sticker => STICKER_STROKE_WIDTH,
            None => DEFAULT_STROKE_WIDTH,
        }
    }

    /// Distance from a text layer's edge to its glyphs.
    pub fn text_inset(&self) -> u32 {
        self.padding + self.effective_stroke_width()
    }
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            position: Position::Bottom,
            fontsize: 50,
            padding: 50,
            stroke_width: None,
            color: TextColor::default(),
            sticker: false,
        }
    }
}

/// One text overlay, shown from `start` for `duration` seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionSpec {
    text: String,
    start: f64,
    duration: f64,
    style: CaptionStyle,
}

impl CaptionSpec {
    pub fn new(
        text: impl Into<String>,
        start: f64,
        duration: f64,
        style: CaptionStyle,
    ) -> Result<Self, OverlayError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(OverlayError::EmptyText);
        }
        let end = start + duration;
        if !start.is_finite() || !end.is_finite() || start < 0.0 || duration <= 0.0 {
            return Err(OverlayError::InvalidTiming { start, end });
        }
        if style.fontsize == 0 {
            return Err(OverlayError::InvalidFontSize(0));
        }
        Ok(Self {
            text,
            start,
            duration,
            style,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn style(&self) -> &CaptionStyle {
        &self.style
    }

    pub fn fade_window(&self) -> FadeWindow {
        FadeWindow::with_default_fade(self.start, self.duration)
    }
}
