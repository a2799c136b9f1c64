pub mod font_resolver;
