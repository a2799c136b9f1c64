pub mod caption_spec;
pub mod fade_window;
pub mod position;
pub mod text_color;
pub mod time_parser;
