//! Face-crop geometry.
//!
//! Computes the pixel rectangle the resize unit should cut out of a
//! source image to produce a person thumbnail. Bounds come either from
//! landmark points (tightest enclosing box) or from the detection
//! bounding box, are expanded by 10% and squared up, then clamped to
//! the image.

use fv_models::{BoundingBox, CropDimensions, ImageDimensions, Landmark, Person};

/// Growth factor applied to the larger crop side.
const CROP_EXPANSION: f64 = 1.1;

/// Fallback crop when image dimensions are missing or invalid.
pub const DEFAULT_CROP: CropDimensions = CropDimensions {
    left: 0,
    top: 0,
    width: 200,
    height: 200,
};

/// The geometry inputs of one crop computation.
///
/// Built from a [`Person`] (key-face bounding box) or assembled directly
/// when landmark points are available for the face.
#[derive(Debug, Clone, Default)]
pub struct CropSubject {
    pub bounding_box: Option<BoundingBox>,
    pub landmarks: Vec<Landmark>,
    pub image_dimensions: Option<ImageDimensions>,
}

impl CropSubject {
    /// Subject from a bounding box.
    pub fn from_bounding_box(bounding_box: BoundingBox, dims: Option<ImageDimensions>) -> Self {
        Self {
            bounding_box: Some(bounding_box),
            landmarks: Vec::new(),
            image_dimensions: dims,
        }
    }

    /// Subject from landmark points.
    pub fn from_landmarks(landmarks: Vec<Landmark>, dims: Option<ImageDimensions>) -> Self {
        Self {
            bounding_box: None,
            landmarks,
            image_dimensions: dims,
        }
    }
}

impl From<&Person> for CropSubject {
    fn from(person: &Person) -> Self {
        Self {
            bounding_box: person.bounding_box,
            landmarks: Vec::new(),
            image_dimensions: person.image_dimensions,
        }
    }
}

/// Fractional bounds in [0,1] image space.
struct Bounds {
    top: f64,
    left: f64,
    right: f64,
    bottom: f64,
}

/// Blob-store key of a person's face thumbnail.
pub fn person_thumbnail_key(user_identity_id: &str, person_id: &str) -> String {
    format!("{}/faces/{}.jpg", user_identity_id, person_id)
}

/// Compute the crop rectangle for a face thumbnail.
///
/// Landmark points take priority over the bounding box; with neither,
/// or with missing/invalid image dimensions, the fixed [`DEFAULT_CROP`]
/// is returned.
pub fn compute_crop_dimensions(subject: &CropSubject) -> CropDimensions {
    let dims = match subject.image_dimensions {
        Some(d) if d.is_valid() => d,
        _ => return DEFAULT_CROP,
    };

    let bounds = match fractional_bounds(subject) {
        Some(b) => b,
        None => return DEFAULT_CROP,
    };

    let mut left = bounds.left * dims.width;
    let mut top = bounds.top * dims.height;
    let width = (bounds.right - bounds.left) * dims.width;
    let height = (bounds.bottom - bounds.top) * dims.height;

    // Expand by 10% of the larger side and square up, re-centering on
    // the original box. Clamping can make the expansion asymmetric near
    // image edges.
    let expanded = (width.max(height) * CROP_EXPANSION).round();
    left = (left - (expanded - width) / 2.0).max(0.0);
    top = (top - (expanded - height) / 2.0).max(0.0);

    CropDimensions {
        left: left.round() as u32,
        top: top.round() as u32,
        width: expanded.min(dims.width).round() as u32,
        height: expanded.min(dims.height).round() as u32,
    }
}

fn fractional_bounds(subject: &CropSubject) -> Option<Bounds> {
    if !subject.landmarks.is_empty() {
        // Tightest box around all landmarks, folded from an inverted
        // seed so each point can only widen it.
        let mut bounds = Bounds {
            top: 1.0,
            left: 1.0,
            right: 0.0,
            bottom: 0.0,
        };
        for point in &subject.landmarks {
            let x = point.x.clamp(0.0, 1.0);
            let y = point.y.clamp(0.0, 1.0);
            bounds.left = bounds.left.min(x);
            bounds.top = bounds.top.min(y);
            bounds.right = bounds.right.max(x);
            bounds.bottom = bounds.bottom.max(y);
        }
        return Some(bounds);
    }

    subject.bounding_box.map(|b| Bounds {
        top: b.top.max(0.0),
        left: b.left.max(0.0),
        right: (b.left + b.width).min(1.0),
        bottom: (b.top + b.height).min(1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_from_bounding_box() {
        // Worked example: 0.3x0.5 box in a 1000x500 image expands to a
        // 330px square re-centered on the face.
        let subject = CropSubject::from_bounding_box(
            BoundingBox::new(0.2, 0.2, 0.3, 0.5),
            Some(ImageDimensions::new(1000.0, 500.0)),
        );

        let crop = compute_crop_dimensions(&subject);
        assert_eq!(
            crop,
            CropDimensions {
                left: 185,
                top: 60,
                width: 330,
                height: 330,
            }
        );
    }

    #[test]
    fn test_crop_from_landmarks() {
        let subject = CropSubject::from_landmarks(
            vec![
                Landmark { x: 0.4, y: 0.4 },
                Landmark { x: 0.6, y: 0.5 },
                Landmark { x: 0.5, y: 0.6 },
            ],
            Some(ImageDimensions::new(1000.0, 1000.0)),
        );

        let crop = compute_crop_dimensions(&subject);
        // Landmark box is 200x200 px, expanded to 220 and re-centered.
        assert_eq!(crop.width, 220);
        assert_eq!(crop.height, 220);
        assert_eq!(crop.left, 390);
        assert_eq!(crop.top, 390);
    }

    #[test]
    fn test_landmarks_clamped_to_unit_square() {
        let subject = CropSubject::from_landmarks(
            vec![Landmark { x: -0.2, y: 0.1 }, Landmark { x: 1.4, y: 0.9 }],
            Some(ImageDimensions::new(100.0, 100.0)),
        );

        let crop = compute_crop_dimensions(&subject);
        // Full-width box clamps to the image on both axes.
        assert_eq!(crop.width, 100);
        assert_eq!(crop.height, 100);
    }

    #[test]
    fn test_expansion_clamped_at_origin() {
        let subject = CropSubject::from_bounding_box(
            BoundingBox::new(0.0, 0.0, 0.2, 0.2),
            Some(ImageDimensions::new(1000.0, 1000.0)),
        );

        let crop = compute_crop_dimensions(&subject);
        // Re-centering would push left/top negative; both clamp to 0.
        assert_eq!(crop.left, 0);
        assert_eq!(crop.top, 0);
        assert_eq!(crop.width, 220);
    }

    #[test]
    fn test_missing_dimensions_falls_back_to_default() {
        let subject = CropSubject::from_bounding_box(BoundingBox::new(0.2, 0.2, 0.3, 0.5), None);
        assert_eq!(compute_crop_dimensions(&subject), DEFAULT_CROP);
    }

    #[test]
    fn test_nan_dimensions_falls_back_to_default() {
        let subject = CropSubject::from_bounding_box(
            BoundingBox::new(0.2, 0.2, 0.3, 0.5),
            Some(ImageDimensions::new(f64::NAN, 500.0)),
        );
        assert_eq!(compute_crop_dimensions(&subject), DEFAULT_CROP);
    }

    #[test]
    fn test_no_geometry_falls_back_to_default() {
        let subject = CropSubject {
            bounding_box: None,
            landmarks: Vec::new(),
            image_dimensions: Some(ImageDimensions::new(1000.0, 1000.0)),
        };
        assert_eq!(compute_crop_dimensions(&subject), DEFAULT_CROP);
    }

    #[test]
    fn test_thumbnail_key() {
        assert_eq!(
            person_thumbnail_key("identity-1", "person-2"),
            "identity-1/faces/person-2.jpg"
        );
    }
}
