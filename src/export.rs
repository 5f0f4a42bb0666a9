/// Wall export: composite the current wall into a PNG
///
/// Optional collaborator: anything that goes wrong here (dismissed
/// dialog, unwritable target) becomes a status message, never a crash
/// and never a wall mutation.

use std::path::PathBuf;

use cgmath::{Deg, Matrix2, Point2, Vector2};
use chrono::Local;
use image::{Rgba, RgbaImage};

use crate::errors::ExportError;
use crate::wall::photo::{PHOTO_INSET, PHOTO_SIZE, PRINT_HEIGHT, PRINT_WIDTH};

/// Empty space around the outermost prints in the exported image
const MARGIN: f32 = 48.0;

/// Minimum export canvas, so an almost-empty wall still looks like one
const MIN_SIZE: (u32, u32) = (640, 480);

/// Wall background in the exported image (matches the canvas color)
const WALL_RGBA: Rgba<u8> = Rgba([163, 140, 112, 255]);
const FRAME_RGBA: Rgba<u8> = Rgba([247, 245, 240, 255]);

/// One print to composite: wall-space anchor, tilt, developed pixels
#[derive(Debug, Clone)]
pub struct PrintLayer {
    pub position: Point2<f32>,
    pub rotation_deg: f32,
    pub pixels: RgbaImage,
}

/// Pick a target via the save dialog, then composite and write the PNG
/// on the blocking pool. Returns the written path.
pub async fn export_wall(prints: Vec<PrintLayer>) -> Result<PathBuf, ExportError> {
    let default_name = format!("polawall-{}.png", Local::now().format("%Y%m%d-%H%M%S"));

    let target = rfd::AsyncFileDialog::new()
        .set_title("Export wall")
        .set_file_name(default_name)
        .add_filter("PNG image", &["png"])
        .save_file()
        .await
        .ok_or(ExportError::Cancelled)?;
    let path = target.path().to_path_buf();

    let written = path.clone();
    tokio::task::spawn_blocking(move || {
        let wall = compose(&prints);
        wall.save(&path)
            .map_err(|e| ExportError::Write(e.to_string()))
    })
    .await
    .map_err(|e| ExportError::Task(e.to_string()))??;

    Ok(written)
}

/// Composite the prints, in z-order, onto a wall-colored canvas sized to
/// fit them all (plus margin).
pub fn compose(prints: &[PrintLayer]) -> RgbaImage {
    let (offset, width, height) = canvas_bounds(prints);
    let mut canvas = RgbaImage::from_pixel(width, height, WALL_RGBA);

    for print in prints {
        blit_print(&mut canvas, print, offset);
    }
    canvas
}

/// Bounding box of all rotated prints -> (wall->canvas offset, w, h)
fn canvas_bounds(prints: &[PrintLayer]) -> (Vector2<f32>, u32, u32) {
    let mut min = Point2::new(f32::MAX, f32::MAX);
    let mut max = Point2::new(f32::MIN, f32::MIN);

    for print in prints {
        for corner in rotated_corners(print) {
            min.x = min.x.min(corner.x);
            min.y = min.y.min(corner.y);
            max.x = max.x.max(corner.x);
            max.y = max.y.max(corner.y);
        }
    }

    if prints.is_empty() {
        return (Vector2::new(0.0, 0.0), MIN_SIZE.0, MIN_SIZE.1);
    }

    let offset = Vector2::new(MARGIN - min.x, MARGIN - min.y);
    let width = ((max.x - min.x + 2.0 * MARGIN).ceil() as u32).max(MIN_SIZE.0);
    let height = ((max.y - min.y + 2.0 * MARGIN).ceil() as u32).max(MIN_SIZE.1);
    (offset, width, height)
}

fn rotated_corners(print: &PrintLayer) -> [Point2<f32>; 4] {
    let center = Point2::new(
        print.position.x + PRINT_WIDTH / 2.0,
        print.position.y + PRINT_HEIGHT / 2.0,
    );
    let rot = Matrix2::from_angle(Deg(print.rotation_deg));
    let half = Vector2::new(PRINT_WIDTH / 2.0, PRINT_HEIGHT / 2.0);

    [
        Vector2::new(-half.x, -half.y),
        Vector2::new(half.x, -half.y),
        Vector2::new(half.x, half.y),
        Vector2::new(-half.x, half.y),
    ]
    .map(|corner| center + rot * corner)
}

/// Rotation-aware blit: walk the print's bounding box on the canvas and
/// inverse-rotate each pixel into print-local space (nearest neighbour).
fn blit_print(canvas: &mut RgbaImage, print: &PrintLayer, offset: Vector2<f32>) {
    let center = Point2::new(
        print.position.x + PRINT_WIDTH / 2.0 + offset.x,
        print.position.y + PRINT_HEIGHT / 2.0 + offset.y,
    );
    let inverse = Matrix2::from_angle(Deg(-print.rotation_deg));

    // Conservative AABB of the rotated print, clipped to the canvas
    let radius = (PRINT_WIDTH.hypot(PRINT_HEIGHT)) / 2.0 + 1.0;
    let x0 = ((center.x - radius).floor().max(0.0)) as u32;
    let y0 = ((center.y - radius).floor().max(0.0)) as u32;
    let x1 = ((center.x + radius).ceil() as u32).min(canvas.width());
    let y1 = ((center.y + radius).ceil() as u32).min(canvas.height());

    let scale = print.pixels.width() as f32 / PHOTO_SIZE;

    for y in y0..y1 {
        for x in x0..x1 {
            let local = inverse
                * Vector2::new(x as f32 + 0.5 - center.x, y as f32 + 0.5 - center.y);
            let (lx, ly) = (local.x + PRINT_WIDTH / 2.0, local.y + PRINT_HEIGHT / 2.0);

            if lx < 0.0 || ly < 0.0 || lx >= PRINT_WIDTH || ly >= PRINT_HEIGHT {
                continue;
            }

            // Inside the photo window, sample the developed still;
            // everywhere else it is print frame
            let (px, py) = (lx - PHOTO_INSET, ly - PHOTO_INSET);
            let color = if px >= 0.0 && py >= 0.0 && px < PHOTO_SIZE && py < PHOTO_SIZE {
                let sx = ((px * scale) as u32).min(print.pixels.width() - 1);
                let sy = ((py * scale) as u32).min(print.pixels.height() - 1);
                *print.pixels.get_pixel(sx, sy)
            } else {
                FRAME_RGBA
            };
            canvas.put_pixel(x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print_at(x: f32, y: f32, rotation_deg: f32) -> PrintLayer {
        PrintLayer {
            position: Point2::new(x, y),
            rotation_deg,
            pixels: RgbaImage::from_pixel(320, 320, Rgba([10, 200, 30, 255])),
        }
    }

    #[test]
    fn test_empty_wall_exports_at_minimum_size() {
        let out = compose(&[]);
        assert_eq!(out.dimensions(), MIN_SIZE);
        assert_eq!(*out.get_pixel(0, 0), WALL_RGBA);
    }

    #[test]
    fn test_print_center_shows_photo_pixels() {
        let prints = vec![print_at(100.0, 100.0, 0.0)];
        let (offset, _, _) = canvas_bounds(&prints);
        let out = compose(&prints);

        // Center of the photo window
        let cx = (100.0 + PHOTO_INSET + PHOTO_SIZE / 2.0 + offset.x) as u32;
        let cy = (100.0 + PHOTO_INSET + PHOTO_SIZE / 2.0 + offset.y) as u32;
        assert_eq!(*out.get_pixel(cx, cy), Rgba([10, 200, 30, 255]));

        // Caption strip below the photo window is frame-colored
        let sy = (100.0 + PRINT_HEIGHT - 10.0 + offset.y) as u32;
        assert_eq!(*out.get_pixel(cx, sy), FRAME_RGBA);
    }

    #[test]
    fn test_negative_positions_are_shifted_into_frame() {
        // A print dragged past the top-left corner must still export
        let prints = vec![print_at(-120.0, -150.0, 8.0)];
        let out = compose(&prints);
        assert!(out.width() >= MIN_SIZE.0);
        assert!(out.height() >= MIN_SIZE.1);
    }

    #[test]
    fn test_rotated_print_stays_inside_computed_bounds() {
        let prints = vec![print_at(0.0, 0.0, 45.0), print_at(400.0, 300.0, -30.0)];
        let out = compose(&prints);
        // No panic while blitting = clipping held; corners stay wall-colored
        assert_eq!(*out.get_pixel(0, 0), WALL_RGBA);
        assert_eq!(
            *out.get_pixel(out.width() - 1, out.height() - 1),
            WALL_RGBA
        );
    }
}
