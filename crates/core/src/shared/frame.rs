use ndarray::{ArrayView3, ArrayViewMut3};

/// One decoded video frame: tightly packed RGB24 bytes in row-major order.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// A frame filled with a single colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self::new(data, width, height, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let view = self.as_ndarray();
        let (row, col) = (y as usize, x as usize);
        [
            view[[row, col, 0]],
            view[[row, col, 1]],
            view[[row, col, 2]],
        ]
    }

    /// `(height, width, channel)` view over the pixel buffer.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12];
        let frame = Frame::new(data.clone(), 2, 2, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_solid_fills_every_pixel() {
        let frame = Frame::solid(3, 2, [10, 20, 30], 0);
        assert_eq!(frame.data().len(), 18);
        assert_eq!(frame.pixel(0, 0), [10, 20, 30]);
        assert_eq!(frame.pixel(2, 1), [10, 20, 30]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 0);
    }

    #[test]
    fn test_ndarray_view_is_row_major() {
        let mut data = vec![0u8; 12];
        data[6] = 255; // row=1, col=0, R
        let frame = Frame::new(data, 2, 2, 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 2, 3]);
        assert_eq!(frame.pixel(0, 1), [255, 0, 0]);
    }

    #[test]
    fn test_ndarray_mut_writes_through() {
        let mut frame = Frame::solid(2, 2, [0, 0, 0], 0);
        frame.as_ndarray_mut()[[0, 1, 2]] = 128;
        assert_eq!(frame.pixel(1, 0), [0, 0, 128]);
    }
}
