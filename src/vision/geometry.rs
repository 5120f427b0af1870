use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixel coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Eye boxes in detector output order: faces in order, eyes per face in order.
pub type EyeSet = Vec<BoundingBox>;

impl BoundingBox {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f64 {
        f64::from(self.x) + f64::from(self.width) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        f64::from(self.y) + f64::from(self.height) / 2.0
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center_x(), self.center_y())
    }

    /// Euclidean distance between the two box centers.
    pub fn center_distance(&self, other: &BoundingBox) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }

    /// Top `height / 2` rows of this box (integer division).
    pub fn upper_half(&self) -> BoundingBox {
        BoundingBox {
            height: self.height / 2,
            ..*self
        }
    }

    /// Shifts a box expressed relative to `origin` back into frame coordinates.
    pub fn translated_by(&self, origin: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x: self.x.saturating_add(origin.x),
            y: self.y.saturating_add(origin.y),
            ..*self
        }
    }
}
