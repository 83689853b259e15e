/// Axis-aligned pixel rectangle: origin plus size.
///
/// Width and height may be zero or negative when built from external
/// geometry; use [`PixelRect::clamped_to`] before touching pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box of a (possibly rotated) quadrilateral.
    pub fn from_points(points: &[(f64, f64); 4]) -> Self {
        let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let x = min_x as i32;
        let y = min_y as i32;
        Self {
            x,
            y,
            width: max_x as i32 - x,
            height: max_y as i32 - y,
        }
    }

    /// Multiplies every component by `factor`, truncating toward zero.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x: (self.x as f64 * factor) as i32,
            y: (self.y as f64 * factor) as i32,
            width: (self.width as f64 * factor) as i32,
            height: (self.height as f64 * factor) as i32,
        }
    }

    /// Intersection with a `frame_w` × `frame_h` frame, or `None` when the
    /// visible part is empty.
    pub fn clamped_to(&self, frame_w: u32, frame_h: u32) -> Option<Self> {
        let x0 = self.x.max(0) as i64;
        let y0 = self.y.max(0) as i64;
        let x1 = (self.x as i64 + self.width as i64).min(frame_w as i64);
        let y1 = (self.y as i64 + self.height as i64).min(frame_h as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0) as i32,
            height: (y1 - y0) as i32,
        })
    }
}

/// A text box found by one detection cycle, in the coordinate space of the
/// frame it was detected from.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedRegion {
    pub text: String,
    pub rect: PixelRect,
    /// Normalised to `[0, 1]`.
    pub confidence: f64,
}

/// A detected region together with its translation. Geometry is always the
/// detection geometry; translation never resizes it.
#[derive(Clone, Debug, PartialEq)]
pub struct TranslatedRegion {
    pub region: DetectedRegion,
    pub translated: String,
}

impl TranslatedRegion {
    pub fn text(&self) -> &str {
        &self.region.text
    }

    pub fn rect(&self) -> PixelRect {
        self.region.rect
    }
}

/// Output of one completed translate cycle.
///
/// Built entirely off the render path and published as a single
/// `Arc<ResultSet>`, so readers never observe a partial set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    pub regions: Vec<TranslatedRegion>,
    /// Resolution of the frame the regions were detected in.
    pub source_width: u32,
    pub source_height: u32,
    /// Sequence number of the cycle that produced this set (0 = none yet).
    pub cycle: u64,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Scale factor mapping detection coordinates onto a display of
    /// `display_width` pixels. Returns 1.0 when no source size is known.
    pub fn scale_for(&self, display_width: u32) -> f64 {
        if self.source_width == 0 {
            return 1.0;
        }
        display_width as f64 / self.source_width as f64
    }
}
