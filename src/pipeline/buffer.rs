use super::rasterizer::Fragment;
use crate::util::Color;

/// Depth stored in every pixel after a clear. Anything nearer passes the test.
pub const DEPTH_SENTINEL: f32 = 99999.0;

/// Pixel count of a width x height grid, computed without u32 overflow.
fn pixel_count(width: u32, height: u32) -> usize {
    return width as usize * height as usize;
}

/// Flat index of pixel (x, y), computed in usize.
fn pixel_index(x: u32, y: u32, width: u32) -> usize {
    return x as usize + y as usize * width as usize;
}

/// Per-pixel nearest depth accepted so far this frame. Smaller is nearer.
pub struct DepthBuffer {
    pub width: u32,
    pub height: u32,
    values: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        return Self {
            width,
            height,
            values: vec![DEPTH_SENTINEL; pixel_count(width, height)],
        };
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        return Some(x as usize + y as usize * self.width as usize);
    }

    /// Stores z and returns true iff z is strictly nearer than the stored depth.
    /// Out of frame coordinates and non-finite depths never pass.
    pub fn test_and_commit(&mut self, x: i32, y: i32, z: f32) -> bool {
        let Some(index) = self.index(x, y) else {
            return false;
        };
        if !z.is_finite() || z >= self.values[index] {
            return false;
        }
        self.values[index] = z;
        return true;
    }

    /// Same test as `test_and_commit` without storing anything.
    pub fn passes(&self, x: i32, y: i32, z: f32) -> bool {
        return match self.index(x, y) {
            Some(index) => z.is_finite() && z < self.values[index],
            None => false,
        };
    }

    pub fn get(&self, x: i32, y: i32) -> Option<f32> {
        return self.index(x, y).map(|index| self.values[index]);
    }

    pub fn reset(&mut self) {
        self.values.fill(DEPTH_SENTINEL);
    }

    pub fn values(&self) -> &[f32] {
        return &self.values[..];
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        return &mut self.values[..];
    }

    /// Grayscale rgb8 picture of the buffer, near is bright.
    /// Untouched pixels are black, the rest is normalized over the written range.
    pub fn as_depth_data(&self) -> Vec<u8> {
        let written = || self.values.iter().copied().filter(|z| *z < DEPTH_SENTINEL);
        let z_min = written().fold(f32::MAX, f32::min);
        let z_max = written().fold(f32::MIN, f32::max);
        let scale = (z_max - z_min).max(f32::EPSILON);
        let mut depth_data = vec![0; 3 * self.values.len()];
        for (i, z) in self.values.iter().enumerate() {
            if *z >= DEPTH_SENTINEL {
                continue;
            }
            let shade = (255.0 * (1.0 - (z - z_min) / scale)).round().clamp(0.0, 255.0) as u8;
            depth_data[3 * i..3 * i + 3].fill(shade);
        }
        return depth_data;
    }
}

/// rgb8 pixel grid, (0, 0) is the top left corner.
pub struct ColorSurface {
    pub width: u32,
    pub height: u32,
    render_data: Vec<u8>,
}

impl ColorSurface {
    pub fn new(width: u32, height: u32) -> Self {
        return Self {
            width,
            height,
            render_data: vec![0; 3 * pixel_count(width, height)],
        };
    }

    /// Flat rgb8 slice of size 3 * (number of pixels).
    pub fn as_render_data(&self) -> &[u8] {
        return &self.render_data[..];
    }

    pub(crate) fn render_data_mut(&mut self) -> &mut [u8] {
        return &mut self.render_data[..];
    }

    pub fn fill(&mut self, color: Color) {
        let rgb = color.to_rgb8();
        for pixel in self.render_data.chunks_exact_mut(3) {
            pixel.copy_from_slice(&rgb);
        }
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let index = 3 * pixel_index(x, y, self.width);
        return [self.render_data[index], self.render_data[index + 1], self.render_data[index + 2]];
    }

    /// Caller guarantees the coordinate is in bounds.
    fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let index = 3 * pixel_index(x, y, self.width);
        self.render_data[index..index + 3].copy_from_slice(&rgb);
    }
}

/// Color surface and depth buffer of one session. The only place where pixels get written.
pub struct Framebuffer {
    pub color: ColorSurface,
    pub depth: DepthBuffer,
    pub background: Color,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let mut color = ColorSurface::new(width, height);
        color.fill(background);
        return Self {
            color,
            depth: DepthBuffer::new(width, height),
            background,
        };
    }

    pub fn width(&self) -> u32 {
        return self.color.width;
    }

    pub fn height(&self) -> u32 {
        return self.color.height;
    }

    /// Resets depth to the sentinel and color to the background.
    pub fn clear(&mut self) {
        self.depth.reset();
        self.color.fill(self.background);
    }

    /// Writes the fragment color iff it wins the depth test. Returns whether it did.
    pub fn point(&mut self, fragment: &Fragment) -> bool {
        if !self.depth.test_and_commit(fragment.x, fragment.y, fragment.depth) {
            return false;
        }
        self.color.set_pixel(fragment.x as u32, fragment.y as u32, fragment.color.to_rgb8());
        return true;
    }

    /// Depth tested write, that leaves the stored depth as is. Used for the backdrop,
    /// which anything drawn later must cover.
    pub fn backdrop(&mut self, fragment: &Fragment) -> bool {
        if !self.depth.passes(fragment.x, fragment.y, fragment.depth) {
            return false;
        }
        self.color.set_pixel(fragment.x as u32, fragment.y as u32, fragment.color.to_rgb8());
        return true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_computed_in_usize() {
        assert_eq!(pixel_count(70_000, 70_000), 4_900_000_000);
        assert_eq!(pixel_index(69_999, 69_999, 70_000), 4_899_999_999);
    }
    use crate::util::Color;

    #[test]
    fn commit_is_monotonic_and_strict() {
        let mut depth = DepthBuffer::new(4, 4);
        let sequence = [5.0, 7.0, 5.0, 4.5, 99999.5, 0.25, 0.25, -1.0];
        let mut stored = DEPTH_SENTINEL;
        for z in sequence {
            let passed = depth.test_and_commit(1, 2, z);
            let now = depth.get(1, 2).unwrap();
            assert!(now <= stored);
            assert_eq!(passed, now < stored);
            assert_eq!(passed, z < stored);
            stored = now;
        }
        assert_eq!(stored, -1.0);
    }

    #[test]
    fn rejects_out_of_frame_and_nan() {
        let mut depth = DepthBuffer::new(4, 4);
        assert!(!depth.test_and_commit(-1, 0, 0.5));
        assert!(!depth.test_and_commit(0, 4, 0.5));
        assert!(!depth.test_and_commit(0, 0, f32::NAN));
        assert_eq!(depth.get(0, 0), Some(DEPTH_SENTINEL));
    }

    #[test]
    fn point_writes_only_nearer_fragments() {
        let mut framebuffer = Framebuffer::new(8, 8, Color::new(0.0, 0.0, 0.0));
        let red = Fragment::point(3, 3, 0.8, Color::new(1.0, 0.0, 0.0));
        let green = Fragment::point(3, 3, 0.2, Color::new(0.0, 1.0, 0.0));
        assert!(framebuffer.point(&red));
        assert!(framebuffer.point(&green));
        assert!(!framebuffer.point(&red));
        assert_eq!(framebuffer.color.get_pixel(3, 3), [0, 255, 0]);
        assert_eq!(framebuffer.depth.get(3, 3), Some(0.2));
    }

    #[test]
    fn clear_restores_background_and_sentinel() {
        let background = Color::from_rgb8(10, 20, 30);
        let mut framebuffer = Framebuffer::new(4, 2, background);
        framebuffer.point(&Fragment::point(1, 1, 0.1, Color::new(1.0, 1.0, 1.0)));
        framebuffer.clear();
        assert!(framebuffer.depth.values().iter().all(|z| *z == DEPTH_SENTINEL));
        assert_eq!(framebuffer.color.get_pixel(1, 1), [10, 20, 30]);
    }

    #[test]
    fn backdrop_does_not_commit_depth() {
        let mut framebuffer = Framebuffer::new(4, 4, Color::new(0.0, 0.0, 0.0));
        assert!(framebuffer.backdrop(&Fragment::point(2, 2, 50.0, Color::new(1.0, 1.0, 1.0))));
        assert_eq!(framebuffer.depth.get(2, 2), Some(DEPTH_SENTINEL));
        assert_eq!(framebuffer.color.get_pixel(2, 2), [255, 255, 255]);
        assert!(framebuffer.point(&Fragment::point(2, 2, 60.0, Color::new(1.0, 0.0, 0.0))));
        assert_eq!(framebuffer.color.get_pixel(2, 2), [255, 0, 0]);
    }

    #[test]
    fn depth_picture_marks_near_pixels_bright() {
        let mut depth = DepthBuffer::new(3, 1);
        depth.test_and_commit(0, 0, 0.1);
        depth.test_and_commit(1, 0, 0.9);
        let data = depth.as_depth_data();
        assert_eq!(&data[0..3], &[255, 255, 255]);
        assert_eq!(&data[3..6], &[0, 0, 0]);
        assert_eq!(&data[6..9], &[0, 0, 0]);
    }
}
