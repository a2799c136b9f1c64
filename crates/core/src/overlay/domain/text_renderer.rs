use image::RgbaImage;

use crate::caption::domain::caption_spec::CaptionSpec;

/// Rasterises a caption's text and outline into a transparent layer.
///
/// The returned image carries `padding` pixels of empty margin on every
/// side around the outlined text.
pub trait TextRenderer {
    fn render(&self, caption: &CaptionSpec) -> Result<RgbaImage, Box<dyn std::error::Error>>;
}
