/// The Photo record and instant-print geometry
///
/// A Photo is the data model shared by the capture session, the wall
/// collection, the persistence store and the renderer. Only `position`
/// and `development` ever change after creation; the filter and the
/// cosmetic tilt are fixed forever at capture time.

use cgmath::{Deg, Matrix2, Point2, Vector2};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::still::JpegPayload;
use crate::develop::{DevelopmentState, FilterKind};

/// Outer size of an instant print, in logical pixels
pub const PRINT_WIDTH: f32 = 170.0;
pub const PRINT_HEIGHT: f32 = 200.0;

/// Photo area inside the print frame (square, inset from the top-left)
pub const PHOTO_INSET: f32 = 10.0;
pub const PHOTO_SIZE: f32 = 150.0;

/// Maximum cosmetic tilt either way, in degrees
const MAX_TILT_DEG: i32 = 6;

/// A captured still and everything needed to pin it to the wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Unique id (replaces the coarse time-based scheme of old walls)
    pub id: Uuid,
    /// Encoded unfiltered raster
    pub image_data: JpegPayload,
    /// Printed on the caption strip
    pub captured_at: DateTime<Local>,
    /// Top-left anchor in wall space; meaningless until placed
    pub position: Point2<f32>,
    /// Cosmetic tilt, fixed at creation
    pub rotation_deg: f32,
    /// Color grading target, fixed at creation
    pub filter: FilterKind,
    /// Serialized as "instant": reloaded photos render as finished prints
    pub development: DevelopmentState,
}

impl Photo {
    /// Create a freshly captured, undeveloped photo.
    ///
    /// The tilt is derived from the id so photo creation stays
    /// deterministic per id (and needs no extra randomness source).
    pub fn new(image_data: JpegPayload, filter: FilterKind) -> Self {
        let id = Uuid::new_v4();
        let spread = (2 * MAX_TILT_DEG + 1) as f32;
        let rotation_deg = (id.as_bytes()[0] as f32 * spread / 256.0).floor() - MAX_TILT_DEG as f32;
        Self {
            id,
            image_data,
            captured_at: Local::now(),
            position: Point2::new(0.0, 0.0),
            rotation_deg,
            filter,
            development: DevelopmentState::Developing(0),
        }
    }

    /// Caption text for the print's bottom strip
    pub fn caption(&self) -> String {
        self.captured_at.format("%d %b %Y, %H:%M").to_string()
    }

    /// Center of the print for a given top-left anchor
    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            self.position.x + PRINT_WIDTH / 2.0,
            self.position.y + PRINT_HEIGHT / 2.0,
        )
    }

    /// Rotation-aware containment test in wall space
    pub fn contains(&self, point: Point2<f32>) -> bool {
        let center = self.center();
        // Rotate the point back into the print's local frame
        let local = Matrix2::from_angle(Deg(-self.rotation_deg))
            * Vector2::new(point.x - center.x, point.y - center.y);
        local.x.abs() <= PRINT_WIDTH / 2.0 && local.y.abs() <= PRINT_HEIGHT / 2.0
    }
}

/// Top-left anchor for a print grabbed at `grab`: the hand lands half a
/// print-width in and a quarter print-height down, so the print hangs
/// naturally under the cursor.
pub fn grab_position(grab: Point2<f32>) -> Point2<f32> {
    Point2::new(grab.x - PRINT_WIDTH / 2.0, grab.y - PRINT_HEIGHT / 4.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_photo(filter: FilterKind) -> Photo {
        Photo::new(JpegPayload(vec![0xff, 0xd8, 0xff, 0xd9]), filter)
    }

    #[test]
    fn test_new_photo_is_undeveloped_with_small_tilt() {
        let photo = test_photo(FilterKind::Warm);
        assert_eq!(photo.development, DevelopmentState::Developing(0));
        assert_eq!(photo.filter, FilterKind::Warm);
        assert!(photo.rotation_deg.abs() <= MAX_TILT_DEG as f32);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = test_photo(FilterKind::Normal);
        let b = test_photo(FilterKind::Normal);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_grab_position_offset_rule() {
        // Grab at (100, 200) with half-width 85 -> anchor at (15, 150)
        let anchor = grab_position(Point2::new(100.0, 200.0));
        assert_eq!(anchor, Point2::new(100.0 - 85.0, 200.0 - 50.0));
    }

    #[test]
    fn test_contains_respects_rotation() {
        let mut photo = test_photo(FilterKind::Normal);
        photo.position = Point2::new(0.0, 0.0);
        photo.rotation_deg = 45.0;

        assert!(photo.contains(photo.center()));
        // The unrotated corner is outside a 45-degree-rotated print
        assert!(!photo.contains(Point2::new(1.0, 1.0)));
    }

    #[test]
    fn test_serde_round_trip_normalizes_development() {
        let mut photo = test_photo(FilterKind::Sepia);
        photo.development = DevelopmentState::Developing(37);
        photo.position = Point2::new(12.5, -3.0);

        let json = serde_json::to_string(&photo).unwrap();
        let restored: Photo = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id, photo.id);
        assert_eq!(restored.image_data, photo.image_data);
        assert_eq!(restored.position, photo.position);
        assert_eq!(restored.rotation_deg, photo.rotation_deg);
        assert_eq!(restored.filter, photo.filter);
        assert_eq!(restored.development, DevelopmentState::Instant);
    }
}
