/// Flat 2-D buffer used for pipeline color and depth storage.
///
/// Row-major, resized (not reallocated) only when the target resolution
/// actually changes. Out-of-range access is a programmer error and panics in
/// debug via the slice index; rasterization clamps its bounding boxes so the
/// hot path never tests bounds per pixel.
#[derive(Clone, Debug)]
pub struct PixelBuffer<T: Copy> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy> PixelBuffer<T> {
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        PixelBuffer { width, height, data: vec![fill; width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize, fill: T) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.data.clear();
            self.data.resize(width * height, fill);
        }
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.data[y * self.width + x] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_refills_contents() {
        let mut buf = PixelBuffer::new(4, 4, 1.0f32);
        buf.set(2, 2, 0.25);
        buf.resize(8, 2, 1.0);
        assert_eq!(buf.width(), 8);
        assert_eq!(buf.height(), 2);
        assert!(buf.as_slice().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn resize_to_same_dimensions_keeps_contents() {
        let mut buf = PixelBuffer::new(4, 4, 0u8);
        buf.set(1, 3, 7);
        buf.resize(4, 4, 0);
        assert_eq!(buf.get(1, 3), 7);
    }
}
