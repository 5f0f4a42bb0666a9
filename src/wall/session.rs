/// Capture session state machine
///
/// Tracks the single in-flight photo between the shutter press and the
/// moment the user grabs the print off the camera. At most one photo is
/// ever in flight; capture requests while one is pending are silent
/// no-ops, not errors.
///
/// Lifecycle: Idle -> Capturing -> Ejecting -> ReadyToGrab -> (handed to
/// the wall, back to Idle).

use std::time::Duration;

use crate::wall::photo::Photo;

/// How long the mechanical eject animation runs before the print
/// becomes grabbable
pub const EJECT_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Default, PartialEq)]
pub enum CaptureSession {
    /// Nothing in flight
    #[default]
    Idle,
    /// Shutter pressed, still being produced (encode in progress)
    Capturing,
    /// Print visible and sliding out; not yet draggable
    Ejecting(Photo),
    /// Eject finished; first grab hands the print to the wall
    ReadyToGrab(Photo),
}

impl CaptureSession {
    /// A new capture may only start from Idle
    pub fn can_capture(&self) -> bool {
        matches!(self, CaptureSession::Idle)
    }

    /// Whether a photo (or a pending still) is in flight
    pub fn is_pending(&self) -> bool {
        !matches!(self, CaptureSession::Idle)
    }

    /// Claim the capture slot. Returns false (and changes nothing) if a
    /// capture or eject is already in flight.
    pub fn begin_capture(&mut self) -> bool {
        if !self.can_capture() {
            return false;
        }
        *self = CaptureSession::Capturing;
        true
    }

    /// The still was produced; start ejecting it
    pub fn still_ready(&mut self, photo: Photo) {
        if matches!(self, CaptureSession::Capturing) {
            *self = CaptureSession::Ejecting(photo);
        }
    }

    /// The still could not be produced; free the capture slot
    pub fn abort_capture(&mut self) {
        if matches!(self, CaptureSession::Capturing) {
            *self = CaptureSession::Idle;
        }
    }

    /// Eject animation finished; the print becomes grabbable
    pub fn finish_eject(&mut self) {
        match std::mem::take(self) {
            CaptureSession::Ejecting(photo) => *self = CaptureSession::ReadyToGrab(photo),
            other => *self = other,
        }
    }

    /// First grab: hand the print over (to the wall) and free the slot.
    /// Returns None while the print is still ejecting.
    pub fn take_for_grab(&mut self) -> Option<Photo> {
        match std::mem::take(self) {
            CaptureSession::ReadyToGrab(photo) => Some(photo),
            other => {
                *self = other;
                None
            }
        }
    }

    /// The in-flight photo, if one is visible
    pub fn photo(&self) -> Option<&Photo> {
        match self {
            CaptureSession::Ejecting(photo) | CaptureSession::ReadyToGrab(photo) => Some(photo),
            _ => None,
        }
    }

    /// Mutable access for development ticking
    pub fn photo_mut(&mut self) -> Option<&mut Photo> {
        match self {
            CaptureSession::Ejecting(photo) | CaptureSession::ReadyToGrab(photo) => Some(photo),
            _ => None,
        }
    }

    /// Whether the print can be grabbed yet
    pub fn is_grabbable(&self) -> bool {
        matches!(self, CaptureSession::ReadyToGrab(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::still::JpegPayload;
    use crate::develop::FilterKind;

    fn photo() -> Photo {
        Photo::new(JpegPayload(vec![1, 2, 3]), FilterKind::Normal)
    }

    #[test]
    fn test_full_lifecycle() {
        let mut session = CaptureSession::default();
        assert!(session.can_capture());

        assert!(session.begin_capture());
        let shot = photo();
        let id = shot.id;
        session.still_ready(shot);
        assert!(matches!(session, CaptureSession::Ejecting(_)));

        // Not grabbable before the eject delay elapses
        assert!(session.take_for_grab().is_none());
        assert!(matches!(session, CaptureSession::Ejecting(_)));

        session.finish_eject();
        assert!(session.is_grabbable());

        let grabbed = session.take_for_grab().unwrap();
        assert_eq!(grabbed.id, id);
        assert!(session.can_capture());
    }

    #[test]
    fn test_grab_handoff_positions_print_under_cursor() {
        use crate::wall::collection::WallCollection;
        use crate::wall::photo::grab_position;
        use cgmath::Point2;

        let mut session = CaptureSession::default();
        assert!(session.begin_capture());
        session.still_ready(photo());
        session.finish_eject();

        // Grab at (100, 200): anchor lands half a width in, a quarter
        // height down
        let mut grabbed = session.take_for_grab().unwrap();
        grabbed.position = grab_position(Point2::new(100.0, 200.0));
        let id = grabbed.id;

        let wall = WallCollection::default().add_front(grabbed);
        let placed = wall.get(id).unwrap();
        assert_eq!(placed.position, Point2::new(15.0, 150.0));
        assert!(session.can_capture());
    }

    #[test]
    fn test_second_capture_is_rejected_while_pending() {
        let mut session = CaptureSession::default();
        assert!(session.begin_capture());
        session.still_ready(photo());

        // Second request while ejecting: silent no-op, state unchanged
        let before = session.clone();
        assert!(!session.begin_capture());
        assert_eq!(session, before);
        assert!(session.photo().is_some());
    }

    #[test]
    fn test_abort_frees_the_slot() {
        let mut session = CaptureSession::default();
        assert!(session.begin_capture());
        session.abort_capture();
        assert!(session.can_capture());
    }

    #[test]
    fn test_finish_eject_only_applies_to_ejecting() {
        let mut session = CaptureSession::Idle;
        session.finish_eject();
        assert_eq!(session, CaptureSession::Idle);

        session = CaptureSession::Capturing;
        session.finish_eject();
        assert_eq!(session, CaptureSession::Capturing);
    }
}
