use dicom::core::Tag;
use ndarray::Array2;
use std::{collections::HashMap, fmt, rc::Rc};
use thiserror::Error;

use crate::{canvas::Canvas, window_level::WindowLevel};

/// Opaque reference handed out by an [`ImageDecodeService`] on registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Not a decodable image: {0}")]
    NotDecodable(String),

    #[error("Unknown image {0}")]
    UnknownImage(ImageId),

    #[error("Pixel data error: {0}")]
    PixelData(String),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

#[derive(Debug, Error)]
pub enum ViewportError {
    #[error("Viewport {label} has no drawable area ({width}x{height})")]
    ZeroSized {
        label: String,
        width: u32,
        height: u32,
    },

    #[error("Cannot paint: {0}")]
    Decode(#[from] DecodeError),
}

impl ViewportError {
    pub fn zero_sized(canvas: &Canvas) -> Self {
        let measured = canvas.bounding_box();
        ViewportError::ZeroSized {
            label: canvas.label().to_string(),
            width: measured.width,
            height: measured.height,
        }
    }
}

/// A decoded frame together with the spatial fields the decoder could read.
///
/// `raw_tags` holds the unparsed string value of selected attributes, the
/// way they appear in the data set (multi-values joined with `\`).
#[derive(Debug, Clone, Default)]
pub struct DecodedImage {
    pub pixels: Array2<f32>,
    pub rows: Option<u32>,
    pub columns: Option<u32>,
    pub window: Option<WindowLevel>,
    pub position: Option<Vec<f64>>,
    pub spacing: Option<Vec<f64>>,
    pub orientation: Option<Vec<f64>>,
    pub raw_tags: HashMap<Tag, String>,
}

impl DecodedImage {
    pub fn new(pixels: Array2<f32>) -> Self {
        let (rows, columns) = pixels.dim();
        Self {
            pixels,
            rows: Some(rows as u32),
            columns: Some(columns as u32),
            ..Default::default()
        }
    }

    pub fn raw_tag(&self, tag: Tag) -> Option<&str> {
        self.raw_tags.get(&tag).map(String::as_str)
    }
}

/// The image pipeline the viewer drives. Implementations own decoding and any
/// cache; the viewer only holds [`ImageId`]s.
pub trait ImageDecodeService {
    /// Fails if `data` is not a decodable image.
    fn register(&self, data: &[u8]) -> Result<ImageId, DecodeError>;

    fn decode(&self, id: ImageId) -> Result<Rc<DecodedImage>, DecodeError>;

    fn paint(
        &self,
        canvas: &mut Canvas,
        image: &DecodedImage,
        window: WindowLevel,
    ) -> Result<(), ViewportError>;

    fn resize(&self, canvas: &mut Canvas, force: bool) -> Result<(), ViewportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_dictionary_std::tags;

    #[test]
    fn new_reports_array_dimensions() {
        let image = DecodedImage::new(Array2::zeros((3, 5)));
        assert_eq!(image.rows, Some(3));
        assert_eq!(image.columns, Some(5));
        assert!(image.raw_tag(tags::PIXEL_SPACING).is_none());
    }

    #[test]
    fn zero_sized_error_names_the_viewport() {
        let canvas = Canvas::new("axial");
        let message = ViewportError::zero_sized(&canvas).to_string();
        assert_eq!(message, "Viewport axial has no drawable area (0x0)");
    }
}
