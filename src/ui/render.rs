/// Applies a development parameter vector to raw pixels
///
/// The parameters follow CSS filter-function semantics, so this module
/// implements the W3C filter-effects color matrices (grayscale, sepia,
/// saturate, hue-rotate) and folds brightness/contrast in as a scalar
/// gain and offset. All color operations compose into a single 3x3
/// matrix + offset, applied once per pixel; blur runs first, matching
/// the chain order blur -> brightness -> contrast -> grayscale -> sepia
/// -> saturate -> hue-rotate.

use cgmath::{Matrix3, Vector3};
use image::{imageops, Rgba, RgbaImage};

use crate::develop::DevelopParams;

/// Rec. 709 luma weights used by the W3C filter matrices
const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Build a Matrix3 from row-major values (cgmath stores column-major)
fn from_rows(r0: [f32; 3], r1: [f32; 3], r2: [f32; 3]) -> Matrix3<f32> {
    Matrix3::new(
        r0[0], r1[0], r2[0], // column 0
        r0[1], r1[1], r2[1], // column 1
        r0[2], r1[2], r2[2], // column 2
    )
}

fn identity() -> Matrix3<f32> {
    from_rows([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0])
}

/// Linear blend between two matrices (amount 0 = a, 1 = b)
fn lerp(a: Matrix3<f32>, b: Matrix3<f32>, amount: f32) -> Matrix3<f32> {
    a * (1.0 - amount) + b * amount
}

/// grayscale(amount): blend toward the luma projection
fn grayscale_matrix(amount: f32) -> Matrix3<f32> {
    lerp(identity(), from_rows(LUMA, LUMA, LUMA), amount)
}

/// sepia(amount): blend toward the standard sepia transform
fn sepia_matrix(amount: f32) -> Matrix3<f32> {
    let sepia = from_rows(
        [0.393, 0.769, 0.189],
        [0.349, 0.686, 0.168],
        [0.272, 0.534, 0.131],
    );
    lerp(identity(), sepia, amount)
}

/// saturate(s): 1.0 is identity, 0.0 grayscale, >1.0 oversaturated
fn saturate_matrix(s: f32) -> Matrix3<f32> {
    let [lr, lg, lb] = LUMA;
    from_rows(
        [lr + (1.0 - lr) * s, lg - lg * s, lb - lb * s],
        [lr - lr * s, lg + (1.0 - lg) * s, lb - lb * s],
        [lr - lr * s, lg - lg * s, lb + (1.0 - lb) * s],
    )
}

/// hue-rotate(degrees), per the filter-effects specification
fn hue_rotate_matrix(degrees: f32) -> Matrix3<f32> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    from_rows(
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    )
}

/// Collapse the color part of a parameter vector into one matrix plus a
/// per-channel offset: out = M * (v * gain + offset).
fn color_pipeline(params: &DevelopParams) -> (Matrix3<f32>, f32, f32) {
    let brightness = params.brightness / 100.0;
    let contrast = params.contrast / 100.0;

    // brightness: v * b; contrast: (v - 0.5) * c + 0.5
    let gain = brightness * contrast;
    let offset = 0.5 * (1.0 - contrast);

    let matrix = hue_rotate_matrix(params.hue_rotate_deg)
        * saturate_matrix(params.saturate / 100.0)
        * sepia_matrix(params.sepia / 100.0)
        * grayscale_matrix(params.grayscale / 100.0);

    (matrix, gain, offset)
}

/// Render the developed look of a still for one development state.
/// Alpha passes through untouched.
pub fn develop_image(base: &RgbaImage, params: &DevelopParams) -> RgbaImage {
    let source = if params.blur > 0.05 {
        imageops::fast_blur(base, params.blur)
    } else {
        base.clone()
    };

    let (matrix, gain, offset) = color_pipeline(params);

    let mut out = source;
    for Rgba(px) in out.pixels_mut() {
        let v = Vector3::new(
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
        );
        let adjusted = matrix * (v * gain + Vector3::new(offset, offset, offset));
        px[0] = (adjusted.x.clamp(0.0, 1.0) * 255.0).round() as u8;
        px[1] = (adjusted.y.clamp(0.0, 1.0) * 255.0).round() as u8;
        px[2] = (adjusted.z.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    fn assert_matrix_close(a: Matrix3<f32>, b: Matrix3<f32>) {
        for col in 0..3 {
            for row in 0..3 {
                assert!(
                    (a[col][row] - b[col][row]).abs() < 1e-4,
                    "matrices differ at [{col}][{row}]: {a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn test_neutral_amounts_are_identity() {
        assert_matrix_close(grayscale_matrix(0.0), Matrix3::identity());
        assert_matrix_close(sepia_matrix(0.0), Matrix3::identity());
        assert_matrix_close(saturate_matrix(1.0), Matrix3::identity());
        assert_matrix_close(hue_rotate_matrix(0.0), Matrix3::identity());
    }

    #[test]
    fn test_full_grayscale_projects_to_luma() {
        let m = grayscale_matrix(1.0);
        let gray = m * Vector3::new(1.0, 0.0, 0.0);
        // Pure red maps to its luma on all channels
        assert!((gray.x - 0.2126).abs() < 1e-4);
        assert!((gray.x - gray.y).abs() < 1e-5);
        assert!((gray.y - gray.z).abs() < 1e-5);
    }

    #[test]
    fn test_hue_rotation_preserves_gray() {
        // Neutral gray has no hue to rotate
        let m = hue_rotate_matrix(90.0);
        let v = m * Vector3::new(0.5, 0.5, 0.5);
        assert!((v.x - 0.5).abs() < 1e-3);
        assert!((v.y - 0.5).abs() < 1e-3);
        assert!((v.z - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_undeveloped_params_darken_and_flatten() {
        // progress 0: brightness 50, contrast 50, grayscale 100
        let params = crate::develop::render(0, crate::develop::FilterKind::Normal);
        let base = RgbaImage::from_pixel(8, 8, Rgba([200, 40, 40, 255]));
        let out = develop_image(&base, &params);

        let px = out.get_pixel(4, 4);
        // Fully gray: channels equal
        assert!(px[0].abs_diff(px[1]) <= 1);
        assert!(px[1].abs_diff(px[2]) <= 1);
        // And darker than the source luma
        assert!(px[0] < 120);
        // Alpha untouched
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_black_and_white_target_is_gray() {
        let params = crate::develop::render(100, crate::develop::FilterKind::BlackAndWhite);
        let base = RgbaImage::from_pixel(4, 4, Rgba([10, 200, 60, 255]));
        let out = develop_image(&base, &params);
        let px = out.get_pixel(2, 2);
        assert!(px[0].abs_diff(px[1]) <= 1);
        assert!(px[1].abs_diff(px[2]) <= 1);
    }

    #[test]
    fn test_develop_image_is_deterministic() {
        let params = crate::develop::render(40, crate::develop::FilterKind::Warm);
        let base = RgbaImage::from_fn(16, 16, |x, y| {
            Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255])
        });
        assert_eq!(develop_image(&base, &params), develop_image(&base, &params));
    }
}
