/// Rectangular region of an image for focused analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ImageRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full_image(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Square of side `2 * radius` centred on `(cx, cy)`, clipped to the image.
    pub fn around(cx: i64, cy: i64, radius: i64, max_w: u32, max_h: u32) -> Self {
        Self::from_signed(cx - radius, cy - radius, 2 * radius, 2 * radius, max_w, max_h)
    }

    /// Builds a region from possibly negative or oversized coordinates,
    /// clipping it to `[0, max_w) x [0, max_h)`.
    pub fn from_signed(x: i64, y: i64, width: i64, height: i64, max_w: u32, max_h: u32) -> Self {
        let x1 = x.clamp(0, max_w as i64);
        let y1 = y.clamp(0, max_h as i64);
        let x2 = (x + width).clamp(0, max_w as i64);
        let y2 = (y + height).clamp(0, max_h as i64);
        Self::new(
            x1 as u32,
            y1 as u32,
            (x2 - x1).max(0) as u32,
            (y2 - y1).max(0) as u32,
        )
    }

    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }
}
