use std::path::Path;

use crate::caption::domain::caption_spec::CaptionSpec;
use crate::caption::domain::position::{resolve, BackendKind, Placement};
use crate::overlay::domain::overlay_backend::{OverlayBackend, ProgressCallback, RenderTarget};
use crate::overlay::domain::text_layer::{Composition, TextLayer};
use crate::overlay::domain::text_renderer::TextRenderer;
use crate::shared::error::{EngineStage, OverlayError};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

pub type ReaderFactory = Box<dyn Fn() -> Box<dyn VideoReader>>;
pub type WriterFactory = Box<dyn Fn() -> Box<dyn VideoWriter>>;

/// Burns captions in-process: decode, composite text layers, encode.
pub struct CompositeBackend {
    renderer: Box<dyn TextRenderer>,
    new_reader: ReaderFactory,
    new_writer: WriterFactory,
}

impl CompositeBackend {
    /// Backend decoding and encoding through ffmpeg-next.
    pub fn new(renderer: Box<dyn TextRenderer>) -> Self {
        Self::with_io(
            renderer,
            Box::new(|| -> Box<dyn VideoReader> { Box::new(FfmpegReader::new()) }),
            Box::new(|| -> Box<dyn VideoWriter> { Box::new(FfmpegWriter::new()) }),
        )
    }

    pub fn with_io(
        renderer: Box<dyn TextRenderer>,
        new_reader: ReaderFactory,
        new_writer: WriterFactory,
    ) -> Self {
        Self {
            renderer,
            new_reader,
            new_writer,
        }
    }

    fn build_layer(&self, caption: &CaptionSpec) -> Result<TextLayer, OverlayError> {
        let image = self
            .renderer
            .render(caption)
            .map_err(|e| OverlayError::engine(EngineStage::CreateTextLayer, e))?;

        let style = caption.style();
        let Placement::Anchor(anchor) =
            resolve(style.position, BackendKind::Composite, style.text_inset())
        else {
            return Err(OverlayError::engine(
                EngineStage::SetLayerProperties,
                format!("no anchor for position {}", style.position),
            ));
        };
        TextLayer::new(image, anchor, caption.fade_window())
            .map_err(|e| OverlayError::engine(EngineStage::SetLayerProperties, e))
    }
}

impl OverlayBackend for CompositeBackend {
    fn build_overlay(
        &self,
        video: &Path,
        captions: &[CaptionSpec],
    ) -> Result<Box<dyn RenderTarget>, OverlayError> {
        let mut reader = (self.new_reader)();
        let metadata = reader
            .open(video)
            .map_err(|e| OverlayError::engine(EngineStage::LoadVideo, e))?;
        log::info!(
            "Loaded {} ({}x{}, {:.3} fps, {:.2}s)",
            video.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.duration
        );

        let mut layers = Vec::with_capacity(captions.len());
        for caption in captions {
            let layer = self.build_layer(caption)?;
            log::debug!(
                "layer '{}': {}x{} at {:?}, visible {:.2}s..{:.2}s",
                caption.text(),
                layer.image().width(),
                layer.image().height(),
                layer.origin(metadata.width, metadata.height),
                caption.start(),
                caption.end()
            );
            if metadata.duration > 0.0 && caption.start() >= metadata.duration {
                log::warn!(
                    "caption '{}' starts at {:.2}s, after the video ends at {:.2}s",
                    caption.text(),
                    caption.start(),
                    metadata.duration
                );
            }
            layers.push(layer);
        }

        if metadata.width == 0 || metadata.height == 0 {
            return Err(OverlayError::engine(
                EngineStage::Combine,
                "source video has no picture",
            ));
        }

        Ok(Box::new(CompositeTarget {
            reader,
            writer: (self.new_writer)(),
            metadata,
            composition: Composition::new(layers),
        }))
    }
}

/// Source video opened for decoding, plus the layers to burn into it.
struct CompositeTarget {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    metadata: VideoMetadata,
    composition: Composition,
}

impl CompositeTarget {
    fn render(
        &mut self,
        output: &Path,
        report: &mut dyn FnMut(usize, usize),
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.writer.open(output, &self.metadata)?;

        let total = self.metadata.total_frames;
        let mut done = 0;
        for frame in self.reader.frames() {
            let mut frame = frame?;
            let t = self.metadata.frame_time(frame.index());
            self.composition.apply(&mut frame, t);
            self.writer.write(&frame)?;
            done += 1;
            report(done, total);
        }

        self.writer.close()?;
        log::info!("Wrote {done} frames to {}", output.display());
        Ok(())
    }
}

impl RenderTarget for CompositeTarget {
    fn fps(&self) -> f64 {
        self.metadata.fps
    }

    fn write(
        mut self: Box<Self>,
        output: &Path,
        mut on_progress: Option<ProgressCallback>,
    ) -> Result<(), OverlayError> {
        let mut report = |done: usize, total: usize| {
            if let Some(callback) = on_progress.as_mut() {
                callback(done, total);
            }
        };
        let result = self.render(output, &mut report);
        self.reader.close();
        result.map_err(|e| OverlayError::engine(EngineStage::Write, e))
    }
}
