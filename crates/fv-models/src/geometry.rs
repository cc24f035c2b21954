//! Face geometry models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A fractional bounding box (0.0 to 1.0) relative to the source image.
///
/// This is the shape the vision service reports for detected faces:
/// `left`/`top` locate the upper-left corner, `width`/`height` extend
/// toward the lower-right. Values may exceed the unit square for faces
/// clipped at an image edge, so consumers clamp before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// Distance from the top edge (0.0 = top, 1.0 = bottom)
    pub top: f64,
    /// Distance from the left edge (0.0 = left, 1.0 = right)
    pub left: f64,
    /// Width of the box (0.0 to 1.0)
    pub width: f64,
    /// Height of the box (0.0 to 1.0)
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// A single facial landmark point in fractional image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

/// Pixel dimensions of a source image.
///
/// Stored as floats because upstream metadata can carry non-integer or
/// missing values; validity is checked by [`ImageDimensions::is_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageDimensions {
    pub width: f64,
    pub height: f64,
}

impl ImageDimensions {
    /// Create new image dimensions.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True if both dimensions are finite and positive.
    pub fn is_valid(&self) -> bool {
        let product = self.width * self.height;
        product.is_finite() && product > 0.0
    }
}

/// A crop rectangle in whole pixels, ready for the resize unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CropDimensions {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_validity() {
        assert!(ImageDimensions::new(1000.0, 500.0).is_valid());
        assert!(!ImageDimensions::new(0.0, 500.0).is_valid());
        assert!(!ImageDimensions::new(f64::NAN, 500.0).is_valid());
        assert!(!ImageDimensions::new(-100.0, 500.0).is_valid());
    }
}
