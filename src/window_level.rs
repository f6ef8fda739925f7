use log::debug;
use serde::Deserialize;

use crate::enums::Plane;

/// Minimum display window width. A width below this has no meaningful
/// grayscale scaling.
pub const MIN_WINDOW_WIDTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "RawWindowLevel")]
pub struct WindowLevel {
    center: f64,
    width: f64,
}

#[derive(Deserialize)]
struct RawWindowLevel {
    center: f64,
    width: f64,
}

impl From<RawWindowLevel> for WindowLevel {
    fn from(raw: RawWindowLevel) -> Self {
        WindowLevel::new(raw.center, raw.width)
    }
}

impl WindowLevel {
    /// Width is clamped to [`MIN_WINDOW_WIDTH`]; center is taken as is.
    pub fn new(center: f64, width: f64) -> Self {
        let width = if width.is_nan() {
            MIN_WINDOW_WIDTH
        } else {
            width.max(MIN_WINDOW_WIDTH)
        };
        Self { center, width }
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Map a stored pixel value to an 8 bit gray level using the linear
    /// DICOM VOI function.
    #[inline]
    pub fn map(&self, value: f32) -> u8 {
        let value = value as f64;
        if self.width <= MIN_WINDOW_WIDTH {
            return if value <= self.center - 0.5 { 0 } else { 255 };
        }
        let lower = self.center - 0.5 - (self.width - 1.0) / 2.0;
        let upper = self.center - 0.5 + (self.width - 1.0) / 2.0;
        if value <= lower {
            0
        } else if value > upper {
            255
        } else {
            let normalized = (value - (self.center - 0.5)) / (self.width - 1.0) + 0.5;
            (normalized * 255.0).clamp(0.0, 255.0).round() as u8
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DragOrigin {
    plane: Plane,
    window: WindowLevel,
}

/// Tracks one brightness/contrast drag gesture.
///
/// Each gesture is anchored on the window captured by [`begin_drag`], so
/// repeated `on_drag` calls with cumulative deltas never compound.
///
/// [`begin_drag`]: WindowLevelController::begin_drag
#[derive(Debug, Default)]
pub struct WindowLevelController {
    origin: Option<DragOrigin>,
}

impl WindowLevelController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_drag(&mut self, plane: Plane, current: WindowLevel) {
        debug!("window drag started on {plane} at {current:?}");
        self.origin = Some(DragOrigin {
            plane,
            window: current,
        });
    }

    /// Returns the window to apply for a cumulative drag delta, or `None` when
    /// no gesture is active on `plane`.
    pub fn on_drag(&self, plane: Plane, delta_x: f64, delta_y: f64) -> Option<WindowLevel> {
        let origin = self.origin.filter(|origin| origin.plane == plane)?;
        Some(WindowLevel::new(
            origin.window.center + delta_y,
            origin.window.width + delta_x,
        ))
    }

    pub fn end_drag(&mut self) {
        if let Some(origin) = self.origin.take() {
            debug!("window drag ended on {}", origin.plane);
        }
    }
}
