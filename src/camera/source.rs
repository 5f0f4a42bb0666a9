/// Live camera feed
///
/// Owns the webcam on a dedicated worker thread and publishes the most
/// recent frame into a shared slot (last write wins). The UI polls the
/// slot on its preview tick; nothing else ever blocks on the camera.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use image::RgbaImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use tracing::{info, warn};

use crate::errors::CameraError;

/// Preferred capture resolution; the backend picks the closest match
const PREFERRED_WIDTH: u32 = 1280;
const PREFERRED_HEIGHT: u32 = 720;
const PREFERRED_FPS: u32 = 30;

/// Where the feed currently is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// Not started (or stopped)
    Idle,
    /// Device is being opened; shutter disabled, spinner shown
    Loading,
    /// Frames are flowing
    Live { width: u32, height: u32 },
    /// Terminal for this session; user may call start() again
    Failed(CameraError),
}

struct Shared {
    frame: Mutex<Option<RgbaImage>>,
    status: Mutex<FeedStatus>,
    stop: AtomicBool,
}

/// Handle to the live camera feed.
///
/// `start()` is asynchronous in effect: it returns immediately and the
/// status moves Loading -> Live (or Failed) as the worker opens the
/// device. `stop()` (also called on drop) releases the hardware so no
/// camera-active indicator is leaked.
pub struct CameraFeed {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl CameraFeed {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                frame: Mutex::new(None),
                status: Mutex::new(FeedStatus::Idle),
                stop: AtomicBool::new(false),
            }),
            worker: None,
        }
    }

    /// Open the default camera on a worker thread. No-op while a worker
    /// is already running. No automatic retry on failure.
    pub fn start(&mut self) {
        // A failed worker has already exited; reap it so restart works
        if matches!(self.status(), FeedStatus::Failed(_)) {
            if let Some(handle) = self.worker.take() {
                let _ = handle.join();
            }
        }
        if self.worker.is_some() {
            return;
        }
        self.shared.stop.store(false, Ordering::Relaxed);
        self.set_status(FeedStatus::Loading);

        let shared = Arc::clone(&self.shared);
        self.worker = Some(std::thread::spawn(move || capture_loop(shared)));
    }

    /// Release the camera. Blocks briefly until the worker exits.
    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.set_status(FeedStatus::Idle);
        if let Ok(mut slot) = self.shared.frame.lock() {
            *slot = None;
        }
    }

    pub fn status(&self) -> FeedStatus {
        self.shared
            .status
            .lock()
            .map(|s| s.clone())
            .unwrap_or(FeedStatus::Idle)
    }

    pub fn is_loading(&self) -> bool {
        self.status() == FeedStatus::Loading
    }

    pub fn is_live(&self) -> bool {
        matches!(self.status(), FeedStatus::Live { .. })
    }

    /// Clone of the most recent frame, if any
    pub fn latest_frame(&self) -> Option<RgbaImage> {
        self.shared.frame.lock().ok().and_then(|slot| slot.clone())
    }

    fn set_status(&self, status: FeedStatus) {
        if let Ok(mut s) = self.shared.status.lock() {
            *s = status;
        }
    }
}

impl Drop for CameraFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker thread: open the device, then pump frames into the shared slot
/// until asked to stop.
fn capture_loop(shared: Arc<Shared>) {
    let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
        CameraFormat::new(
            Resolution::new(PREFERRED_WIDTH, PREFERRED_HEIGHT),
            FrameFormat::MJPEG,
            PREFERRED_FPS,
        ),
    ));

    let mut camera = match Camera::new(CameraIndex::Index(0), format) {
        Ok(camera) => camera,
        Err(e) => {
            warn!(error = %e, "Could not open camera");
            fail(&shared, CameraError::Unavailable(e.to_string()));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        warn!(error = %e, "Could not start camera stream");
        fail(&shared, CameraError::Unavailable(e.to_string()));
        return;
    }

    let resolution = camera.resolution();
    info!(
        width = resolution.width(),
        height = resolution.height(),
        "Camera stream opened"
    );
    if let Ok(mut status) = shared.status.lock() {
        *status = FeedStatus::Live {
            width: resolution.width(),
            height: resolution.height(),
        };
    }

    while !shared.stop.load(Ordering::Relaxed) {
        match camera.frame().and_then(|buffer| buffer.decode_image::<RgbFormat>()) {
            Ok(rgb) => {
                let rgba = image::DynamicImage::ImageRgb8(rgb).to_rgba8();
                if let Ok(mut slot) = shared.frame.lock() {
                    *slot = Some(rgba);
                }
            }
            Err(e) => {
                warn!(error = %e, "Camera stream failed");
                fail(&shared, CameraError::StreamFailed(e.to_string()));
                break;
            }
        }
    }

    let _ = camera.stop_stream();
    info!("Camera released");
}

fn fail(shared: &Shared, error: CameraError) {
    if let Ok(mut status) = shared.status.lock() {
        *status = FeedStatus::Failed(error);
    }
}
