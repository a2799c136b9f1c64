use std::path::Path;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};

use crate::caption::domain::caption_spec::CaptionSpec;
use crate::overlay::domain::text_renderer::TextRenderer;
use crate::shared::constants::STROKE_COLOR;

/// Renders captions with a TrueType/OpenType font via fontdue.
///
/// The outline is the glyph coverage dilated by a disc of the stroke width,
/// drawn in black underneath the fill.
pub struct FontdueRenderer {
    font: Font,
}

impl FontdueRenderer {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("failed to read font {}: {e}", path.display()))?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| format!("failed to parse font {}: {e}", path.display()))?;
        log::debug!("loaded font {}", path.display());
        Ok(Self { font })
    }

    fn coverage(&self, text: &str, px: f32) -> Mask {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[&self.font], &TextStyle::new(text, px, 0));

        let width = layout
            .glyphs()
            .iter()
            .map(|g| (g.x.max(0.0) + g.width as f32).ceil() as usize)
            .max()
            .unwrap_or(0)
            .max(1);
        let height = (layout.height().ceil() as usize).max(1);
        let mut mask = Mask::new(width, height);

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (_, bitmap) = self.font.rasterize_config(glyph.key);
            let gx = glyph.x.round() as i64;
            let gy = glyph.y.round() as i64;
            for row in 0..glyph.height {
                for col in 0..glyph.width {
                    let value = bitmap[row * glyph.width + col] as f32 / 255.0;
                    mask.max_at(gx + col as i64, gy + row as i64, value);
                }
            }
        }
        mask
    }
}

impl TextRenderer for FontdueRenderer {
    fn render(&self, caption: &CaptionSpec) -> Result<RgbaImage, Box<dyn std::error::Error>> {
        let style = caption.style();
        let stroke = style.effective_stroke_width() as usize;
        let padding = style.padding;

        let fill = self.coverage(caption.text(), style.fontsize as f32).expanded(stroke);
        let outline = fill.dilate(stroke);

        let width = u32::try_from(fill.width)? + 2 * padding;
        let height = u32::try_from(fill.height)? + 2 * padding;
        let mut image = RgbaImage::new(width, height);

        let color = style.color.rgb();
        for y in 0..fill.height {
            for x in 0..fill.width {
                let fa = fill.get(x, y);
                let sa = if stroke > 0 { outline.get(x, y) } else { 0.0 };
                let pixel = over(color, fa, STROKE_COLOR, sa);
                image.put_pixel(x as u32 + padding, y as u32 + padding, pixel);
            }
        }

        log::debug!(
            "rendered '{}' as {}x{} layer (stroke {stroke}, padding {padding})",
            caption.text(),
            width,
            height
        );
        Ok(image)
    }
}

/// `fill` at coverage `fa` composited over `stroke` at coverage `sa`.
fn over(fill: [u8; 3], fa: f32, stroke: [u8; 3], sa: f32) -> Rgba<u8> {
    let alpha = fa + sa * (1.0 - fa);
    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut rgb = [0u8; 3];
    for c in 0..3 {
        let value = (fill[c] as f32 * fa + stroke[c] as f32 * sa * (1.0 - fa)) / alpha;
        rgb[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    Rgba([rgb[0], rgb[1], rgb[2], (alpha * 255.0).round() as u8])
}

/// Greyscale coverage in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
struct Mask {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Mask {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    fn max_at(&mut self, x: i64, y: i64, value: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let cell = &mut self.data[y as usize * self.width + x as usize];
        *cell = cell.max(value);
    }

    /// Copy with `margin` empty pixels added on every side.
    fn expanded(&self, margin: usize) -> Mask {
        let mut out = Mask::new(self.width + 2 * margin, self.height + 2 * margin);
        for y in 0..self.height {
            let src = &self.data[y * self.width..(y + 1) * self.width];
            let start = (y + margin) * out.width + margin;
            out.data[start..start + self.width].copy_from_slice(src);
        }
        out
    }

    /// Morphological dilation with a disc of `radius`.
    fn dilate(&self, radius: usize) -> Mask {
        if radius == 0 {
            return self.clone();
        }
        let r = radius as i64;
        let offsets: Vec<(i64, i64)> = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
            .collect();

        let mut out = Mask::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let value = self.get(x, y);
                if value <= 0.0 {
                    continue;
                }
                for &(dx, dy) in &offsets {
                    out.max_at(x as i64 + dx, y as i64 + dy, value);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::domain::caption_spec::CaptionStyle;
    use crate::caption::infrastructure::font_resolver::system_font;

    fn renderer() -> Option<FontdueRenderer> {
        let font = system_font()?;
        Some(FontdueRenderer::from_file(&font).unwrap())
    }

    fn caption(style: CaptionStyle) -> CaptionSpec {
        CaptionSpec::new("Hi", 0.0, 1.0, style).unwrap()
    }

    #[test]
    fn test_from_file_rejects_missing_and_garbage() {
        assert!(FontdueRenderer::from_file(Path::new("/nonexistent/font.ttf")).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(FontdueRenderer::from_file(&path).is_err());
    }

    #[test]
    fn test_dilate_grows_a_point_into_a_disc() {
        let mut mask = Mask::new(7, 7);
        mask.max_at(3, 3, 1.0);
        let grown = mask.dilate(2);
        assert_eq!(grown.get(3, 3), 1.0);
        assert_eq!(grown.get(5, 3), 1.0);
        assert_eq!(grown.get(3, 1), 1.0);
        assert_eq!(grown.get(5, 5), 0.0);
        assert_eq!(grown.get(0, 0), 0.0);
    }

    #[test]
    fn test_expanded_offsets_content() {
        let mut mask = Mask::new(2, 1);
        mask.max_at(1, 0, 0.5);
        let out = mask.expanded(3);
        assert_eq!((out.width, out.height), (8, 7));
        assert_eq!(out.get(4, 3), 0.5);
        assert_eq!(out.data.iter().filter(|v| **v > 0.0).count(), 1);
    }

    #[test]
    fn test_over_blends_fill_on_stroke() {
        assert_eq!(over([255; 3], 1.0, [0; 3], 1.0), Rgba([255, 255, 255, 255]));
        assert_eq!(over([255; 3], 0.0, [0; 3], 1.0), Rgba([0, 0, 0, 255]));
        assert_eq!(over([255; 3], 0.0, [0; 3], 0.0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_render_keeps_padding_transparent() {
        let Some(renderer) = renderer() else { return };
        let style = CaptionStyle {
            padding: 12,
            ..CaptionStyle::default()
        };
        let image = renderer.render(&caption(style)).unwrap();

        assert!(image.width() > 24 && image.height() > 24);
        for x in 0..image.width() {
            assert_eq!(image.get_pixel(x, 0).0[3], 0);
            assert_eq!(image.get_pixel(x, image.height() - 1).0[3], 0);
        }
        for y in 0..image.height() {
            assert_eq!(image.get_pixel(0, y).0[3], 0);
        }
    }

    #[test]
    fn test_render_draws_fill_and_black_outline() {
        let Some(renderer) = renderer() else { return };
        let style = CaptionStyle {
            fontsize: 64,
            padding: 0,
            stroke_width: Some(4),
            ..CaptionStyle::default()
        };
        let image = renderer.render(&caption(style)).unwrap();

        let opaque: Vec<_> = image.pixels().filter(|p| p.0[3] == 255).collect();
        assert!(opaque.iter().any(|p| p.0[..3] == [255, 255, 255]));
        assert!(opaque.iter().any(|p| p.0[..3] == [0, 0, 0]));
    }

    #[test]
    fn test_sticker_layer_is_larger() {
        let Some(renderer) = renderer() else { return };
        let plain = renderer.render(&caption(CaptionStyle::default())).unwrap();
        let sticker = renderer
            .render(&caption(CaptionStyle {
                sticker: true,
                ..CaptionStyle::default()
            }))
            .unwrap();
        assert_eq!(sticker.width(), plain.width() + 16);
        assert_eq!(sticker.height(), plain.height() + 16);
    }
}
