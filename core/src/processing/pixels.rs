use crate::prelude::Rgba;
use ndarray::{s, Array3};

/// Row-major RGBA raster, `height x width x 4`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    data: Array3<u8>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize, fill: Rgba) -> Self {
        let mut buffer = Self {
            data: Array3::zeros((height, width, 4)),
        };
        buffer.fill(fill);
        buffer
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn fill(&mut self, color: Rgba) {
        for mut pixel in self.data.rows_mut() {
            for (channel, value) in pixel.iter_mut().zip(color) {
                *channel = value;
            }
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let mut out = [0u8; 4];
        for (channel, slot) in out.iter_mut().enumerate() {
            *slot = self.data[[y, x, channel]];
        }
        Some(out)
    }

    /// Paints pixel rows `y` across columns `x0..x1`.
    pub fn fill_span(&mut self, x0: usize, x1: usize, y: usize, color: Rgba) {
        let x1 = x1.min(self.width());
        if x0 >= x1 || y >= self.height() {
            return;
        }
        let mut span = self.data.slice_mut(s![y, x0..x1, ..]);
        for mut pixel in span.rows_mut() {
            for (channel, value) in pixel.iter_mut().zip(color) {
                *channel = value;
            }
        }
    }

    /// Scrolls the raster `columns` pixels left and fills the exposed edge.
    pub fn shift_left(&mut self, columns: usize, fill: Rgba) {
        let width = self.width();
        let columns = columns.min(width);
        if columns == 0 {
            return;
        }
        if columns < width {
            let kept = self.data.slice(s![.., columns.., ..]).to_owned();
            self.data.slice_mut(s![.., ..width - columns, ..]).assign(&kept);
        }
        let height = self.height();
        for y in 0..height {
            self.fill_span(width - columns, width, y, fill);
        }
    }

    /// Raw RGBA bytes in row-major order.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.iter().copied().collect()
    }
}
