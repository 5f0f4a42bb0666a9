/// Frame capture: live video frame -> compact square still
///
/// The still is the *unfiltered* pixel data. Filters are never baked in
/// here; they are applied at render time so the development animation can
/// work from the original pixels.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, RgbaImage};
use serde::{Deserialize, Serialize};

/// Side length of the captured square still, in pixels.
/// Chosen to balance visual fidelity against snapshot size: every still
/// is embedded in the persisted wall snapshot.
pub const OUTPUT_SIZE: u32 = 320;

/// JPEG quality for the encoded still (0-100)
const JPEG_QUALITY: u8 = 70;

/// Largest centered square crop of a frame.
/// Returns (side, x offset, y offset).
pub fn crop_geometry(width: u32, height: u32) -> (u32, u32, u32) {
    let side = width.min(height);
    (side, (width - side) / 2, (height - side) / 2)
}

/// An encoded still, as stored inside a Photo.
///
/// Opaque JPEG bytes; serialized as base64 so the wall snapshot stays a
/// single JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegPayload(pub Vec<u8>);

impl JpegPayload {
    /// Decode back to raw pixels for rendering
    pub fn decode(&self) -> Result<RgbaImage, ImageError> {
        Ok(image::load_from_memory(&self.0)?.to_rgba8())
    }
}

impl Serialize for JpegPayload {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for JpegPayload {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map(JpegPayload)
            .map_err(serde::de::Error::custom)
    }
}

/// Produce a still from a live frame:
/// 1. Largest centered square crop
/// 2. Horizontal mirror (selfie convention, matches the mirrored preview)
/// 3. Scale to OUTPUT_SIZE x OUTPUT_SIZE
/// 4. Encode as JPEG at a fixed quality
///
/// Pure transformation; CPU-bound, so callers run it on a blocking task.
pub fn capture_still(frame: &RgbaImage) -> Result<JpegPayload, ImageError> {
    let (side, x, y) = crop_geometry(frame.width(), frame.height());

    let cropped = imageops::crop_imm(frame, x, y, side, side).to_image();
    let mirrored = imageops::flip_horizontal(&cropped);
    let scaled = imageops::resize(&mirrored, OUTPUT_SIZE, OUTPUT_SIZE, FilterType::Triangle);

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgba8(scaled).to_rgb8();

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)?;

    Ok(JpegPayload(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Synthetic frame: left half red, right half blue
    fn synthetic_frame(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn test_crop_geometry_landscape() {
        // 1280x720 -> centered 720px square at (280, 0)
        assert_eq!(crop_geometry(1280, 720), (720, 280, 0));
    }

    #[test]
    fn test_crop_geometry_portrait_and_square() {
        assert_eq!(crop_geometry(720, 1280), (720, 0, 280));
        assert_eq!(crop_geometry(640, 640), (640, 0, 0));
    }

    #[test]
    fn test_still_is_fixed_size() {
        let frame = synthetic_frame(1280, 720);
        let payload = capture_still(&frame).unwrap();
        let decoded = payload.decode().unwrap();
        assert_eq!(decoded.dimensions(), (OUTPUT_SIZE, OUTPUT_SIZE));
    }

    #[test]
    fn test_still_is_mirrored() {
        // Source left half is red; after mirroring, red lands on the
        // *right* of the raster, so a mirrored preview and the still agree.
        let frame = synthetic_frame(1280, 720);
        let decoded = capture_still(&frame).unwrap().decode().unwrap();

        let left = decoded.get_pixel(10, OUTPUT_SIZE / 2);
        let right = decoded.get_pixel(OUTPUT_SIZE - 10, OUTPUT_SIZE / 2);
        assert!(left[2] > left[0], "left of still should be blue, got {left:?}");
        assert!(right[0] > right[2], "right of still should be red, got {right:?}");
    }

    #[test]
    fn test_payload_base64_round_trip() {
        let payload = JpegPayload(vec![1, 2, 3, 250]);
        let json = serde_json::to_string(&payload).unwrap();
        let restored: JpegPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload, restored);
    }
}
