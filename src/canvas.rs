use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgba, RgbaImage, imageops};
use ndarray::Array2;
use rayon::prelude::*;

use crate::{config::CrosshairStyle, window_level::WindowLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One fixed drawing surface: an image layer plus a transparent overlay
/// layer for the crosshair.
///
/// Layout is modelled explicitly. A hidden canvas measures 0x0. A visible
/// canvas measures its host container if the host fixes one, otherwise the
/// intended size it was shown with. Buffers only follow the measured size
/// on [`Canvas::sync_to_layout`].
#[derive(Debug, Clone)]
pub struct Canvas {
    label: String,
    visible: bool,
    container: Option<Size>,
    intended: Size,
    pixels: RgbaImage,
    overlay: RgbaImage,
}

impl Canvas {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            visible: false,
            container: None,
            intended: Size::ZERO,
            pixels: RgbaImage::new(0, 0),
            overlay: RgbaImage::new(0, 0),
        }
    }

    /// A canvas whose host container lays it out at a fixed size.
    pub fn with_container(label: impl Into<String>, container: Size) -> Self {
        let mut canvas = Self::new(label);
        canvas.container = Some(container);
        canvas
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn show(&mut self, intended: Size) {
        self.visible = true;
        self.intended = intended;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_container(&mut self, container: Option<Size>) {
        self.container = container;
    }

    pub fn bounding_box(&self) -> Size {
        if !self.visible {
            return Size::ZERO;
        }
        self.container.unwrap_or(self.intended)
    }

    /// Size of the drawing buffers.
    pub fn size(&self) -> Size {
        Size::new(self.pixels.width(), self.pixels.height())
    }

    /// Reallocate both layers to the measured bounding box. Returns whether
    /// the buffers were replaced.
    pub fn sync_to_layout(&mut self, force: bool) -> bool {
        let measured = self.bounding_box();
        if !force && measured == self.size() {
            return false;
        }
        self.pixels = RgbaImage::new(measured.width, measured.height);
        self.overlay = RgbaImage::new(measured.width, measured.height);
        true
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.overlay.fill(0);
    }

    pub fn clear_overlay(&mut self) {
        self.overlay.fill(0);
    }

    /// Window the pixel array and stretch it over the image layer.
    pub fn draw_image(&mut self, pixels: &Array2<f32>, window: WindowLevel) {
        let target = self.size();
        if target.is_empty() {
            return;
        }
        let Some(gray) = Self::window_to_gray(pixels, window) else {
            return;
        };
        let scaled = if gray.dimensions() == (target.width, target.height) {
            gray
        } else {
            imageops::resize(
                &gray,
                target.width,
                target.height,
                imageops::FilterType::Triangle,
            )
        };
        self.pixels = DynamicImage::ImageLuma8(scaled).to_rgba8();
    }

    fn window_to_gray(pixels: &Array2<f32>, window: WindowLevel) -> Option<GrayImage> {
        let (rows, columns) = pixels.dim();
        let gray: Vec<u8> = pixels
            .view()
            .into_par_iter()
            .map(|&value| window.map(value))
            .collect();
        ImageBuffer::<Luma<u8>, _>::from_raw(columns as u32, rows as u32, gray)
    }

    pub fn draw_vertical_dashed(&mut self, x: f64, style: &CrosshairStyle) {
        let (width, height) = self.overlay.dimensions();
        for column in Self::line_span(x, style.line_width, width) {
            for y in (0..height).filter(|y| Self::is_dash(*y, style)) {
                self.overlay.put_pixel(column, y, Rgba(style.color));
            }
        }
    }

    pub fn draw_horizontal_dashed(&mut self, y: f64, style: &CrosshairStyle) {
        let (width, height) = self.overlay.dimensions();
        for row in Self::line_span(y, style.line_width, height) {
            for x in (0..width).filter(|x| Self::is_dash(*x, style)) {
                self.overlay.put_pixel(x, row, Rgba(style.color));
            }
        }
    }

    // Pixel rows/columns covered by a line of `line_width` centered on `at`.
    fn line_span(at: f64, line_width: u32, limit: u32) -> std::ops::Range<u32> {
        let start = (at - f64::from(line_width) / 2.0).round().max(0.0) as u32;
        let start = start.min(limit.saturating_sub(line_width));
        start.min(limit)..(start + line_width).min(limit)
    }

    #[inline]
    fn is_dash(offset: u32, style: &CrosshairStyle) -> bool {
        offset % (style.dash + style.gap).max(1) < style.dash
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn overlay(&self) -> &RgbaImage {
        &self.overlay
    }

    /// Image layer with the crosshair overlay drawn on top.
    pub fn composite(&self) -> RgbaImage {
        let mut composed = self.pixels.clone();
        imageops::overlay(&mut composed, &self.overlay, 0, 0);
        composed
    }
}
