/// The development/filter engine
///
/// A freshly ejected print starts dark, blurry and desaturated, then
/// "develops" over ~5 seconds into its final look. The final look depends
/// on the filter chosen at capture time. Everything here is a pure
/// function of (progress, filter): the rendering layer calls `render`
/// every tick and applies the resulting parameter vector to the
/// unfiltered still.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Development progress saturates here; a photo at MAX_PROGRESS is done
pub const MAX_PROGRESS: u8 = 100;

/// One progress unit per tick
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Color-grading preset chosen at capture time.
/// Immutable once a photo exists; it controls the *target* values the
/// development animation converges to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    #[default]
    Normal,
    BlackAndWhite,
    Sepia,
    Warm,
    Cool,
}

impl FilterKind {
    /// All filters, in picker order
    pub const ALL: [FilterKind; 5] = [
        FilterKind::Normal,
        FilterKind::BlackAndWhite,
        FilterKind::Sepia,
        FilterKind::Warm,
        FilterKind::Cool,
    ];

    /// Display name for the filter picker
    pub fn display_name(self) -> &'static str {
        match self {
            FilterKind::Normal => "Normal",
            FilterKind::BlackAndWhite => "B&W",
            FilterKind::Sepia => "Sepia",
            FilterKind::Warm => "Warm",
            FilterKind::Cool => "Cool",
        }
    }
}

/// Fully-developed target values for one filter.
/// Percentages except `hue_rotate_deg` (degrees) and `brightness_mod`
/// (additive percentage points on top of the base brightness ramp).
struct FilterTargets {
    contrast: f32,
    grayscale: f32,
    sepia: f32,
    saturate: f32,
    hue_rotate_deg: f32,
    brightness_mod: f32,
}

const fn targets(filter: FilterKind) -> FilterTargets {
    match filter {
        FilterKind::Normal => FilterTargets {
            contrast: 105.0,
            grayscale: 0.0,
            sepia: 0.0,
            saturate: 100.0,
            hue_rotate_deg: 0.0,
            brightness_mod: 0.0,
        },
        FilterKind::BlackAndWhite => FilterTargets {
            contrast: 120.0,
            grayscale: 100.0,
            sepia: 0.0,
            saturate: 100.0,
            hue_rotate_deg: 0.0,
            brightness_mod: 0.0,
        },
        FilterKind::Sepia => FilterTargets {
            contrast: 90.0,
            grayscale: 0.0,
            sepia: 80.0,
            saturate: 100.0,
            hue_rotate_deg: 0.0,
            brightness_mod: -5.0,
        },
        FilterKind::Warm => FilterTargets {
            contrast: 110.0,
            grayscale: 0.0,
            sepia: 30.0,
            saturate: 140.0,
            hue_rotate_deg: -10.0,
            brightness_mod: 0.0,
        },
        FilterKind::Cool => FilterTargets {
            contrast: 110.0,
            grayscale: 0.0,
            sepia: 0.0,
            saturate: 90.0,
            hue_rotate_deg: 15.0,
            brightness_mod: 5.0,
        },
    }
}

/// Rendering parameter vector for one development state.
///
/// Same semantics as the CSS filter functions of the same names:
/// percentages where 100 is identity (brightness, contrast, saturate),
/// 0 is identity (grayscale, sepia), `blur` in pixels, hue in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevelopParams {
    pub blur: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub grayscale: f32,
    pub sepia: f32,
    pub saturate: f32,
    pub hue_rotate_deg: f32,
}

/// Map development progress and a filter to the parameter vector.
///
/// Pure and deterministic: same inputs, same outputs, no hidden state.
/// At progress 0 the print is dark (brightness 50), heavily blurred
/// (10px) and fully gray; every parameter then interpolates linearly to
/// the filter's target.
pub fn render(progress: u8, filter: FilterKind) -> DevelopParams {
    let p = progress.min(MAX_PROGRESS) as f32;
    let t = targets(filter);
    DevelopParams {
        blur: (10.0 - p / 10.0).max(0.0),
        brightness: 50.0 + p / 2.0 + p / 100.0 * t.brightness_mod,
        contrast: 50.0 + p / 100.0 * (t.contrast - 50.0),
        grayscale: 100.0 + p / 100.0 * (t.grayscale - 100.0),
        sepia: p / 100.0 * t.sepia,
        saturate: p / 100.0 * t.saturate,
        hue_rotate_deg: p / 100.0 * t.hue_rotate_deg,
    }
}

/// Where a photo is in its one-time development animation.
///
/// `Instant` means fully developed with no further ticking, the state
/// every photo reloaded from the wall snapshot starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevelopmentState {
    /// Fully developed, renders at MAX_PROGRESS forever
    Instant,
    /// Development in progress, counter in [0, MAX_PROGRESS]
    Developing(u8),
}

impl DevelopmentState {
    /// Effective progress for rendering
    pub fn progress(self) -> u8 {
        match self {
            DevelopmentState::Instant => MAX_PROGRESS,
            DevelopmentState::Developing(p) => p.min(MAX_PROGRESS),
        }
    }

    /// Whether the per-photo ticker still has work to do
    pub fn is_developing(self) -> bool {
        matches!(self, DevelopmentState::Developing(p) if p < MAX_PROGRESS)
    }

    /// Advance by one tick, saturating at MAX_PROGRESS
    pub fn tick(self) -> Self {
        match self {
            DevelopmentState::Instant => DevelopmentState::Instant,
            DevelopmentState::Developing(p) => {
                DevelopmentState::Developing((p + 1).min(MAX_PROGRESS))
            }
        }
    }
}

// Development is a one-time animation: the persisted form is always the
// finished print, so serialization normalizes to "instant" and anything
// read back starts fully developed.
impl Serialize for DevelopmentState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("instant")
    }
}

impl<'de> Deserialize<'de> for DevelopmentState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Accept any string; legacy snapshots only ever contain "instant"
        let _ = String::deserialize(deserializer)?;
        Ok(DevelopmentState::Instant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_deterministic() {
        for filter in FilterKind::ALL {
            for progress in 0..=MAX_PROGRESS {
                assert_eq!(render(progress, filter), render(progress, filter));
            }
        }
    }

    #[test]
    fn test_undeveloped_print_is_dark_gray_and_blurred() {
        for filter in FilterKind::ALL {
            let params = render(0, filter);
            assert_eq!(params.blur, 10.0);
            assert_eq!(params.brightness, 50.0);
            assert_eq!(params.contrast, 50.0);
            assert_eq!(params.grayscale, 100.0);
            assert_eq!(params.sepia, 0.0);
            assert_eq!(params.saturate, 0.0);
            assert_eq!(params.hue_rotate_deg, 0.0);
        }
    }

    #[test]
    fn test_developed_print_hits_filter_targets() {
        let normal = render(100, FilterKind::Normal);
        assert_eq!(normal.blur, 0.0);
        assert_eq!(normal.brightness, 100.0);
        assert_eq!(normal.contrast, 105.0);
        assert_eq!(normal.grayscale, 0.0);
        assert_eq!(normal.saturate, 100.0);

        let bw = render(100, FilterKind::BlackAndWhite);
        assert_eq!(bw.grayscale, 100.0);
        assert_eq!(bw.contrast, 120.0);

        let sepia = render(100, FilterKind::Sepia);
        assert_eq!(sepia.sepia, 80.0);
        assert_eq!(sepia.brightness, 95.0);

        let warm = render(100, FilterKind::Warm);
        assert_eq!(warm.saturate, 140.0);
        assert_eq!(warm.hue_rotate_deg, -10.0);

        let cool = render(100, FilterKind::Cool);
        assert_eq!(cool.hue_rotate_deg, 15.0);
        assert_eq!(cool.brightness, 105.0);
    }

    #[test]
    fn test_blur_clears_at_full_development() {
        // blur = max(0, 10 - p/10) reaches exactly zero at p = 100
        assert_eq!(render(100, FilterKind::Normal).blur, 0.0);
        assert!(render(99, FilterKind::Normal).blur > 0.0);
    }

    #[test]
    fn test_progress_above_max_is_clamped() {
        assert_eq!(render(200, FilterKind::Cool), render(100, FilterKind::Cool));
    }

    #[test]
    fn test_development_state_ticks_and_saturates() {
        let mut state = DevelopmentState::Developing(0);
        for _ in 0..MAX_PROGRESS {
            assert!(state.is_developing());
            state = state.tick();
        }
        assert_eq!(state.progress(), MAX_PROGRESS);
        assert!(!state.is_developing());
        // Further ticks are no-ops
        assert_eq!(state.tick().progress(), MAX_PROGRESS);
    }

    #[test]
    fn test_development_state_serializes_as_instant() {
        let json = serde_json::to_string(&DevelopmentState::Developing(42)).unwrap();
        assert_eq!(json, "\"instant\"");

        let restored: DevelopmentState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, DevelopmentState::Instant);
        assert_eq!(restored.progress(), MAX_PROGRESS);
    }
}
