/// Length of the fade-in and fade-out ramps on every caption, in seconds.
pub const FADE_SECONDS: f64 = 0.5;

pub const DEFAULT_STROKE_WIDTH: u32 = 2;
pub const STICKER_STROKE_WIDTH: u32 = 10;

pub const STROKE_COLOR: [u8; 3] = [0, 0, 0];
pub const STROKE_COLOR_NAME: &str = "black";

/// x264 speed/quality preset used by both backends.
pub const H264_PRESET: &str = "veryfast";
pub const H264_ENCODER_NAME: &str = "libx264";

pub const FONT_ENV_VAR: &str = "TEXTBURN_FONT";
pub const FFMPEG_ENV_VAR: &str = "TEXTBURN_FFMPEG";

/// Directory (next to the executable) searched for a bundled default font.
pub const BUNDLED_FONT_DIR: &str = "fonts";
pub const BUNDLED_FONT_NAME: &str = "DejaVuSans.ttf";

pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];
