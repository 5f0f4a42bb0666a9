/// The wall canvas
///
/// Draws the whole scene in z-order (placed prints, the ejecting print
/// sliding out of the camera slot, the shutter flash) and turns mouse
/// events into lifecycle messages. Drag state only exists between a
/// button press that hit a print and the matching release, so no global
/// listener outlives a drag.

use std::collections::HashMap;

use cgmath::Point2;
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Program};
use iced::widget::image::Handle;
use iced::{Color, Point, Rectangle, Renderer, Size, Theme, Vector};
use uuid::Uuid;

use crate::wall::collection::WallCollection;
use crate::wall::photo::{Photo, PHOTO_INSET, PHOTO_SIZE, PRINT_HEIGHT, PRINT_WIDTH};
use crate::wall::session::CaptureSession;
use crate::Message;

/// Where ejected prints appear, in wall space (just under the control
/// panel, which doubles as the "camera body")
pub const EJECT_SLOT: Point2<f32> = Point2 { x: 48.0, y: 392.0 };

/// Eject takes ~1s = 20 development ticks; used to animate the slide-out
const EJECT_TICKS: f32 = 20.0;

const WALL_COLOR: Color = Color::from_rgb(0.64, 0.55, 0.44);
const PRINT_FRAME_COLOR: Color = Color::from_rgb(0.97, 0.96, 0.94);
const UNDEVELOPED_COLOR: Color = Color::from_rgb(0.16, 0.15, 0.14);
const CAPTION_COLOR: Color = Color::from_rgb(0.35, 0.33, 0.30);
const SLOT_COLOR: Color = Color::from_rgb(0.13, 0.13, 0.14);

pub struct WallCanvas<'a> {
    pub wall: &'a WallCollection,
    pub session: &'a CaptureSession,
    /// Developed pixels per photo id, kept current by the app
    pub developed: &'a HashMap<Uuid, Handle>,
    /// Shutter flash opacity, purely cosmetic
    pub flash: f32,
}

/// Per-drag interaction state; cleared on every release
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
}

impl WallCanvas<'_> {
    /// Hit area of the ejected print (drawn unrotated in the slot)
    fn ejected_rect(&self) -> Rectangle {
        Rectangle::new(
            Point::new(EJECT_SLOT.x, EJECT_SLOT.y),
            Size::new(PRINT_WIDTH, PRINT_HEIGHT),
        )
    }

    fn hovering_grabbable(&self, point: Point) -> bool {
        (self.session.is_grabbable() && self.ejected_rect().contains(point))
            || self
                .wall
                .hit_test(Point2::new(point.x, point.y))
                .is_some()
    }

    /// Draw one print with its tilt, developed pixels and caption
    fn draw_print(&self, frame: &mut canvas::Frame, photo: &Photo, center: Point, rotated: bool) {
        frame.with_save(|frame| {
            frame.translate(Vector::new(center.x, center.y));
            if rotated {
                frame.rotate(photo.rotation_deg.to_radians());
            }

            frame.fill_rectangle(
                Point::new(-PRINT_WIDTH / 2.0, -PRINT_HEIGHT / 2.0),
                Size::new(PRINT_WIDTH, PRINT_HEIGHT),
                PRINT_FRAME_COLOR,
            );

            let photo_area = Rectangle::new(
                Point::new(
                    -PRINT_WIDTH / 2.0 + PHOTO_INSET,
                    -PRINT_HEIGHT / 2.0 + PHOTO_INSET,
                ),
                Size::new(PHOTO_SIZE, PHOTO_SIZE),
            );

            match self.developed.get(&photo.id) {
                Some(handle) => {
                    frame.draw_image(photo_area, canvas::Image::new(handle.clone()));
                }
                None => frame.fill_rectangle(photo_area.position(), photo_area.size(), UNDEVELOPED_COLOR),
            }

            frame.fill_text(canvas::Text {
                content: photo.caption(),
                position: Point::new(0.0, PRINT_HEIGHT / 2.0 - 24.0),
                color: CAPTION_COLOR,
                size: 11.0.into(),
                horizontal_alignment: iced::alignment::Horizontal::Center,
                vertical_alignment: iced::alignment::Vertical::Top,
                ..canvas::Text::default()
            });
        });
    }
}

impl Program<Message> for WallCanvas<'_> {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        frame.fill_rectangle(Point::ORIGIN, bounds.size(), WALL_COLOR);

        // Placed prints, bottom to top
        for photo in self.wall.iter() {
            let center = photo.center();
            self.draw_print(&mut frame, photo, Point::new(center.x, center.y), true);
        }

        // The in-flight print slides down out of the slot; it is drawn
        // unrotated until the user pins it to the wall
        if let Some(photo) = self.session.photo() {
            let rise = (photo.development.progress() as f32 / EJECT_TICKS).min(1.0);
            let top = EJECT_SLOT.y - PRINT_HEIGHT * (1.0 - rise);
            let center = Point::new(
                EJECT_SLOT.x + PRINT_WIDTH / 2.0,
                top + PRINT_HEIGHT / 2.0,
            );
            self.draw_print(&mut frame, photo, center, false);

            // Slot lip masking the part still inside the camera
            frame.fill_rectangle(
                Point::new(EJECT_SLOT.x - 12.0, EJECT_SLOT.y - 10.0),
                Size::new(PRINT_WIDTH + 24.0, 10.0),
                SLOT_COLOR,
            );
        }

        // Cosmetic shutter flash on top of everything
        if self.flash > 0.01 {
            frame.fill_rectangle(
                Point::ORIGIN,
                bounds.size(),
                Color::from_rgba(1.0, 1.0, 1.0, self.flash),
            );
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(point) = cursor.position_in(bounds) {
                    // The ejected print wins over wall prints under it
                    if self.session.is_grabbable() && self.ejected_rect().contains(point) {
                        state.is_dragging = true;
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::GrabEjected(Point2::new(point.x, point.y))),
                        );
                    }
                    if let Some(photo) = self.wall.hit_test(Point2::new(point.x, point.y)) {
                        state.is_dragging = true;
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::GrabPlaced(photo.id, Point2::new(point.x, point.y))),
                        );
                    }
                }
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                // Only interpreted while a drag is in progress
                if state.is_dragging {
                    if let Some(point) = cursor.position_in(bounds) {
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::DragTo(Point2::new(point.x, point.y))),
                        );
                    }
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    return (canvas::event::Status::Captured, Some(Message::ReleaseDrag));
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Right)) => {
                if let Some(point) = cursor.position_in(bounds) {
                    if let Some(photo) = self.wall.hit_test(Point2::new(point.x, point.y)) {
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::DeletePhoto(photo.id)),
                        );
                    }
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.is_dragging {
            return mouse::Interaction::Grabbing;
        }
        if let Some(point) = cursor.position_in(bounds) {
            if self.hovering_grabbable(point) {
                return mouse::Interaction::Grab;
            }
        }
        mouse::Interaction::default()
    }
}
