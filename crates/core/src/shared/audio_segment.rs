/// Decoded audio: interleaved PCM samples normalised to [-1.0, 1.0].
#[derive(Clone, Debug)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        debug_assert!(channels > 0, "audio must have at least one channel");
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (one sample per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Splits `frames` sample frames starting at `offset` into one plane per channel.
    pub fn planes(&self, offset: usize, frames: usize) -> Vec<Vec<f32>> {
        let channels = self.channels as usize;
        let end = (offset + frames).min(self.frame_count());
        let start = offset.min(end);
        let mut planes = vec![Vec::with_capacity(end - start); channels];
        for frame in self.samples[start * channels..end * channels].chunks_exact(channels) {
            for (plane, &sample) in planes.iter_mut().zip(frame) {
                plane.push(sample);
            }
        }
        planes
    }
}
