pub mod filter_graph;
pub mod overlay_backend;
pub mod text_layer;
pub mod text_renderer;
