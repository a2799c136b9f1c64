use image::RgbaImage;

use crate::caption::domain::fade_window::FadeWindow;
use crate::caption::domain::position::Anchor;
use crate::shared::frame::Frame;

/// A rendered caption placed on the frame and bound to its fade window.
#[derive(Clone, Debug)]
pub struct TextLayer {
    image: RgbaImage,
    anchor: Anchor,
    window: FadeWindow,
}

impl TextLayer {
    pub fn new(image: RgbaImage, anchor: Anchor, window: FadeWindow) -> Result<Self, String> {
        if image.width() == 0 || image.height() == 0 {
            return Err("text layer is empty".to_string());
        }
        if window.end() <= window.start() {
            return Err(format!(
                "layer ends at {}s, before it starts at {}s",
                window.end(),
                window.start()
            ));
        }
        Ok(Self {
            image,
            anchor,
            window,
        })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Top-left corner of the layer on a `width` x `height` frame.
    pub fn origin(&self, width: u32, height: u32) -> (i64, i64) {
        self.anchor
            .origin((width, height), (self.image.width(), self.image.height()))
    }

    /// Blends the layer into `frame` at its opacity for time `t`.
    /// Returns whether anything was drawn.
    pub fn apply(&self, frame: &mut Frame, t: f64) -> bool {
        let opacity = self.window.opacity_at(t);
        if opacity <= 0.0 {
            return false;
        }
        let origin = self.origin(frame.width(), frame.height());
        blend(frame, &self.image, origin, opacity);
        true
    }
}

/// Source-over blend of `layer` onto `frame` with its top-left at `origin`,
/// scaled by `opacity`. Parts outside the frame are clipped.
pub fn blend(frame: &mut Frame, layer: &RgbaImage, origin: (i64, i64), opacity: f64) {
    let (fw, fh) = (frame.width() as i64, frame.height() as i64);
    let (lw, lh) = (layer.width() as i64, layer.height() as i64);

    let x0 = origin.0.max(0);
    let y0 = origin.1.max(0);
    let x1 = (origin.0 + lw).min(fw);
    let y1 = (origin.1 + lh).min(fh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let opacity = opacity.clamp(0.0, 1.0) as f32;
    let mut pixels = frame.as_ndarray_mut();
    for y in y0..y1 {
        for x in x0..x1 {
            let src = layer.get_pixel((x - origin.0) as u32, (y - origin.1) as u32).0;
            let alpha = src[3] as f32 / 255.0 * opacity;
            if alpha <= 0.0 {
                continue;
            }
            for c in 0..3 {
                let dst = &mut pixels[[y as usize, x as usize, c]];
                let mixed = *dst as f32 * (1.0 - alpha) + src[c] as f32 * alpha;
                *dst = mixed.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// All caption layers of one render, applied in order (later on top).
#[derive(Clone, Debug, Default)]
pub struct Composition {
    layers: Vec<TextLayer>,
}

impl Composition {
    pub fn new(layers: Vec<TextLayer>) -> Self {
        Self { layers }
    }

    /// Draws every layer visible at `t`; returns how many were drawn.
    pub fn apply(&self, frame: &mut Frame, t: f64) -> usize {
        self.layers
            .iter()
            .filter(|layer| layer.apply(frame, t))
            .count()
    }
}
