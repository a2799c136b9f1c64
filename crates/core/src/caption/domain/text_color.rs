use std::str::FromStr;

use crate::shared::error::OverlayError;

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("white", [255, 255, 255]),
    ("black", [0, 0, 0]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("orange", [255, 165, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
];

/// Caption fill colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextColor([u8; 3]);

impl TextColor {
    pub const WHITE: TextColor = TextColor([255, 255, 255]);

    pub fn rgb(&self) -> [u8; 3] {
        self.0
    }

    /// `0xRRGGBB`, the form `drawtext` accepts for `fontcolor`.
    pub fn ffmpeg_literal(&self) -> String {
        let [r, g, b] = self.0;
        format!("0x{r:02X}{g:02X}{b:02X}")
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for TextColor {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OverlayError::InvalidColor(s.to_string());
        let lower = s.trim().to_ascii_lowercase();

        if let Some((_, rgb)) = NAMED_COLORS.iter().find(|(name, _)| *name == lower) {
            return Ok(TextColor(*rgb));
        }

        let hex = lower
            .strip_prefix('#')
            .or_else(|| lower.strip_prefix("0x"))
            .ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(TextColor([channel(0)?, channel(2)?, channel(4)?]))
    }
}
