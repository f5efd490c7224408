/// A detection in source-image pixel coordinates.
///
/// Corners are inclusive-exclusive in the usual image sense and expected to
/// satisfy `x_min <= x_max`, `y_min <= y_max` once decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
    /// Class score in `[0, 1]`.
    pub confidence: f32,
    pub class_id: usize,
}

impl BoundingBox {
    pub fn width(&self) -> i64 {
        self.x_max as i64 - self.x_min as i64
    }

    pub fn height(&self) -> i64 {
        self.y_max as i64 - self.y_min as i64
    }

    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }

    /// Intersection-over-union with `other`.
    ///
    /// Returns `0.0` when the union is empty, e.g. two zero-area boxes clamped
    /// onto the same image edge.
    pub fn iou(&self, other: &Self) -> f32 {
        let x1 = self.x_min.max(other.x_min) as i64;
        let y1 = self.y_min.max(other.y_min) as i64;
        let x2 = self.x_max.min(other.x_max) as i64;
        let y2 = self.y_max.min(other.y_max) as i64;

        let intersection = (x2 - x1).max(0) * (y2 - y1).max(0);
        let union = self.area() + other.area() - intersection;

        if union <= 0 {
            return 0.0;
        }
        intersection as f32 / union as f32
    }
}
