pub mod backend_factory;
pub mod composite_backend;
pub mod ffmpeg_process_backend;
pub mod fontdue_renderer;
