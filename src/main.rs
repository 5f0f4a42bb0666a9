use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use cgmath::{Point2, Vector2};
use iced::widget::image::Handle as ImageHandle;
use iced::widget::{button, canvas, column, container, row, stack, text};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};
use image::{imageops, RgbaImage};
use tracing::{info, warn};
use uuid::Uuid;

mod camera;
mod develop;
mod errors;
mod export;
mod ui;
mod wall;

use camera::source::{CameraFeed, FeedStatus};
use camera::still::{self, JpegPayload};
use develop::{DevelopmentState, FilterKind};
use errors::ExportError;
use export::PrintLayer;
use ui::wall_canvas::WallCanvas;
use wall::collection::WallCollection;
use wall::photo::{self, Photo, PRINT_HEIGHT, PRINT_WIDTH};
use wall::session::{CaptureSession, EJECT_DELAY};
use wall::store::WallStore;

/// Viewfinder refresh cadence (~15 fps is plenty for a preview)
const PREVIEW_INTERVAL: Duration = Duration::from_millis(66);

/// Flash overlay opacity lost per preview tick
const FLASH_DECAY: f32 = 0.12;

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// Refresh the viewfinder and fade the flash
    PreviewTick,
    /// One development progress unit for every developing photo
    DevelopTick,
    /// User pressed the shutter button
    Shutter,
    /// Background still capture completed
    StillReady(Result<JpegPayload, String>),
    /// The mechanical eject delay elapsed
    EjectDone,
    /// First grab of the ejected print, which pins it to the wall
    GrabEjected(Point2<f32>),
    /// Grab of a print already on the wall
    GrabPlaced(Uuid, Point2<f32>),
    /// Pointer moved during an active drag
    DragTo(Point2<f32>),
    /// Drag ended
    ReleaseDrag,
    /// Right-click delete of a placed print
    DeletePhoto(Uuid),
    SelectFilter(FilterKind),
    ClearWall,
    ExportWall,
    ExportDone(Result<PathBuf, ExportError>),
}

/// Active drag: which print, and where inside it the user grabbed
struct DragContext {
    id: Uuid,
    offset: Vector2<f32>,
}

/// Main application state
struct Polawall {
    /// Live camera feed (worker thread + latest-frame slot)
    feed: CameraFeed,
    /// The single in-flight capture, if any
    session: CaptureSession,
    /// Placed photos, back to front
    wall: WallCollection,
    /// Durable snapshot of the wall
    store: WallStore,
    /// Filter applied to the *next* capture
    selected_filter: FilterKind,
    /// Mirrored viewfinder frame
    preview: Option<ImageHandle>,
    /// Decoded unfiltered stills by photo id (session photo included)
    bases: HashMap<Uuid, RgbaImage>,
    /// Developed pixels at each photo's current progress
    developed: HashMap<Uuid, ImageHandle>,
    drag: Option<DragContext>,
    /// Shutter flash overlay opacity
    flash: f32,
    /// An export task is in flight
    exporting: bool,
    /// Status message to display to the user
    status: String,
}

impl Polawall {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let store = WallStore::at_default_location();
        let wall = store.load();

        let mut app = Polawall {
            feed: CameraFeed::new(),
            session: CaptureSession::default(),
            wall,
            store,
            selected_filter: FilterKind::default(),
            preview: None,
            bases: HashMap::new(),
            developed: HashMap::new(),
            drag: None,
            flash: 0.0,
            exporting: false,
            status: String::new(),
        };

        // Reloaded photos render as finished prints right away
        let reloaded: Vec<Photo> = app.wall.iter().cloned().collect();
        for photo in &reloaded {
            app.register_photo(photo);
        }

        app.feed.start();
        app.status = format!("Ready. {} photos on the wall.", app.wall.len());
        info!(photos = app.wall.len(), "Wall loaded");

        (app, Task::none())
    }

    /// Decode a photo's still and cache its developed look at the
    /// photo's current progress
    fn register_photo(&mut self, photo: &Photo) {
        match photo.image_data.decode() {
            Ok(base) => {
                self.developed
                    .insert(photo.id, developed_handle(&base, photo));
                self.bases.insert(photo.id, base);
            }
            Err(e) => {
                warn!(id = %photo.id, error = %e, "Cannot decode stored still");
            }
        }
    }

    /// Re-render the pixels of every photo whose development is still
    /// running; called once per development tick
    fn refresh_developing(&mut self) {
        let mut moving: Vec<Photo> = self
            .wall
            .iter()
            .filter(|p| matches!(p.development, DevelopmentState::Developing(_)))
            .cloned()
            .collect();
        if let Some(photo) = self.session.photo() {
            if matches!(photo.development, DevelopmentState::Developing(_)) {
                moving.push(photo.clone());
            }
        }

        for photo in moving {
            if let Some(base) = self.bases.get(&photo.id) {
                self.developed
                    .insert(photo.id, developed_handle(base, &photo));
            }
        }
    }

    /// Drop cached pixels for photos that no longer exist anywhere
    fn prune_caches(&mut self) {
        let wall = &self.wall;
        let session = &self.session;
        let alive =
            |id: &Uuid| wall.get(*id).is_some() || session.photo().is_some_and(|p| p.id == *id);
        self.bases.retain(|id, _| alive(id));
        self.developed.retain(|id, _| alive(id));
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PreviewTick => {
                self.flash = (self.flash - FLASH_DECAY).max(0.0);
                if let Some(frame) = self.feed.latest_frame() {
                    // Selfie convention: the viewfinder is mirrored
                    let mirrored = imageops::flip_horizontal(&frame);
                    self.preview = Some(ImageHandle::from_rgba(
                        mirrored.width(),
                        mirrored.height(),
                        mirrored.into_raw(),
                    ));
                }
                Task::none()
            }

            Message::Shutter => {
                // Silent no-op while a capture is pending or the feed is
                // down; the inline camera error already explains the latter
                if !self.feed.is_live() || !self.session.begin_capture() {
                    return Task::none();
                }
                let Some(frame) = self.feed.latest_frame() else {
                    self.session.abort_capture();
                    return Task::none();
                };
                self.flash = 1.0;
                Task::perform(
                    async move {
                        tokio::task::spawn_blocking(move || {
                            still::capture_still(&frame).map_err(|e| e.to_string())
                        })
                        .await
                        .map_err(|e| e.to_string())?
                    },
                    Message::StillReady,
                )
            }

            Message::StillReady(Ok(payload)) => {
                let photo = Photo::new(payload, self.selected_filter);
                self.register_photo(&photo);
                self.session.still_ready(photo);
                self.status = "Developing...".to_string();
                Task::perform(tokio::time::sleep(EJECT_DELAY), |_| Message::EjectDone)
            }

            Message::StillReady(Err(e)) => {
                warn!(error = %e, "Still capture failed");
                self.session.abort_capture();
                self.status = "Could not capture a still.".to_string();
                Task::none()
            }

            Message::EjectDone => {
                self.session.finish_eject();
                if self.session.is_grabbable() {
                    self.status = "Grab your print and pin it to the wall.".to_string();
                }
                Task::none()
            }

            Message::DevelopTick => {
                if let Some(photo) = self.session.photo_mut() {
                    photo.development = photo.development.tick();
                }
                self.wall = self.wall.tick_development();
                self.refresh_developing();
                Task::none()
            }

            Message::GrabEjected(point) => {
                if let Some(mut grabbed) = self.session.take_for_grab() {
                    grabbed.position = photo::grab_position(point);
                    self.drag = Some(DragContext {
                        id: grabbed.id,
                        offset: Vector2::new(PRINT_WIDTH / 2.0, PRINT_HEIGHT / 4.0),
                    });
                    self.wall = self.wall.add_front(grabbed);
                    self.store.save(&self.wall);
                    self.status = format!("{} photos on the wall.", self.wall.len());
                }
                Task::none()
            }

            Message::GrabPlaced(id, point) => {
                self.wall = self.wall.bring_to_front(id);
                if let Some(grabbed) = self.wall.get(id) {
                    self.drag = Some(DragContext {
                        id,
                        offset: Vector2::new(
                            point.x - grabbed.position.x,
                            point.y - grabbed.position.y,
                        ),
                    });
                }
                self.store.save(&self.wall);
                Task::none()
            }

            Message::DragTo(point) => {
                if let Some(drag) = &self.drag {
                    self.wall = self.wall.move_to(
                        drag.id,
                        Point2::new(point.x - drag.offset.x, point.y - drag.offset.y),
                    );
                }
                Task::none()
            }

            Message::ReleaseDrag => {
                if self.drag.take().is_some() {
                    // The completed move is the persisted mutation
                    self.store.save(&self.wall);
                }
                Task::none()
            }

            Message::DeletePhoto(id) => {
                if self.drag.as_ref().is_some_and(|d| d.id == id) {
                    self.drag = None;
                }
                self.wall = self.wall.remove(id);
                self.prune_caches();
                self.store.save(&self.wall);
                self.status = format!("{} photos on the wall.", self.wall.len());
                Task::none()
            }

            Message::SelectFilter(filter) => {
                self.selected_filter = filter;
                Task::none()
            }

            Message::ClearWall => {
                self.drag = None;
                self.wall = self.wall.clear();
                self.prune_caches();
                self.store.save(&self.wall);
                self.status = "Wall cleared.".to_string();
                Task::none()
            }

            Message::ExportWall => {
                if self.exporting || self.wall.is_empty() {
                    return Task::none();
                }
                let prints: Vec<PrintLayer> = self
                    .wall
                    .iter()
                    .filter_map(|p| {
                        let base = self.bases.get(&p.id)?;
                        let params = develop::render(p.development.progress(), p.filter);
                        Some(PrintLayer {
                            position: p.position,
                            rotation_deg: p.rotation_deg,
                            pixels: ui::render::develop_image(base, &params),
                        })
                    })
                    .collect();
                self.exporting = true;
                self.status = "Exporting wall...".to_string();
                Task::perform(export::export_wall(prints), Message::ExportDone)
            }

            Message::ExportDone(result) => {
                self.exporting = false;
                self.status = match result {
                    Ok(path) => format!("Wall exported to {}.", path.display()),
                    Err(ExportError::Cancelled) => "Export cancelled.".to_string(),
                    Err(e) => {
                        warn!(error = %e, "Wall export failed");
                        format!("Export failed: {e}")
                    }
                };
                Task::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subs = vec![iced::time::every(PREVIEW_INTERVAL).map(|_| Message::PreviewTick)];

        // The development ticker self-terminates: it only runs while
        // some photo still has progress to gain
        let developing = self.wall.any_developing()
            || self
                .session
                .photo()
                .is_some_and(|p| p.development.is_developing());
        if developing {
            subs.push(iced::time::every(develop::TICK_INTERVAL).map(|_| Message::DevelopTick));
        }

        Subscription::batch(subs)
    }

    /// Build the user interface: the wall canvas fills the window, the
    /// camera panel floats over its top-left corner
    fn view(&self) -> Element<Message> {
        let wall_canvas = canvas(WallCanvas {
            wall: &self.wall,
            session: &self.session,
            developed: &self.developed,
            flash: self.flash,
        })
        .width(Length::Fill)
        .height(Length::Fill);

        stack![wall_canvas, container(self.camera_panel()).padding(16)].into()
    }

    fn camera_panel(&self) -> Element<Message> {
        let viewfinder: Element<Message> = match self.feed.status() {
            FeedStatus::Loading => text("Starting camera...").size(14).into(),
            FeedStatus::Failed(e) => text(format!("{e}. Capture is disabled.")).size(14).into(),
            FeedStatus::Idle => text("Camera off.").size(14).into(),
            FeedStatus::Live { .. } => match &self.preview {
                Some(handle) => iced::widget::image(handle.clone())
                    .width(Length::Fixed(240.0))
                    .into(),
                None => text("Waiting for frames...").size(14).into(),
            },
        };

        let filters = FilterKind::ALL
            .into_iter()
            .fold(row![].spacing(4), |filter_row, filter| {
                let style = if filter == self.selected_filter {
                    button::primary
                } else {
                    button::secondary
                };
                filter_row.push(
                    button(text(filter.display_name()).size(12))
                        .style(style)
                        .padding(4)
                        .on_press(Message::SelectFilter(filter)),
                )
            });

        let can_snap = self.feed.is_live() && self.session.can_capture();
        let shutter = button(text("Snap").size(16))
            .padding(8)
            .on_press_maybe(can_snap.then_some(Message::Shutter));

        let actions = row![
            button(text("Clear wall").size(12))
                .style(button::secondary)
                .padding(4)
                .on_press_maybe((!self.wall.is_empty()).then_some(Message::ClearWall)),
            button(text("Export").size(12))
                .style(button::secondary)
                .padding(4)
                .on_press_maybe(
                    (!self.exporting && !self.wall.is_empty()).then_some(Message::ExportWall)
                ),
        ]
        .spacing(8);

        column![
            viewfinder,
            filters,
            shutter,
            actions,
            text(&self.status).size(12),
        ]
        .spacing(10)
        .align_x(Alignment::Start)
        .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Render a photo's developed look into an image handle
fn developed_handle(base: &RgbaImage, photo: &Photo) -> ImageHandle {
    let params = develop::render(photo.development.progress(), photo.filter);
    let developed = ui::render::develop_image(base, &params);
    ImageHandle::from_rgba(developed.width(), developed.height(), developed.into_raw())
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("polawall=info")),
        )
        .init();

    iced::application("Polawall", Polawall::update, Polawall::view)
        .theme(Polawall::theme)
        .subscription(Polawall::subscription)
        .antialiasing(true)
        .run_with(Polawall::new)
}
