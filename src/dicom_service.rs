use crate::{
    canvas::Canvas,
    decode::{DecodeError, DecodedImage, ImageDecodeService, ImageId, ViewportError},
    window_level::WindowLevel,
};

use dicom::{
    core::Tag,
    object::{DefaultDicomObject, from_reader},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use log::debug;
use ndarray::{Array2, s};
use std::{cell::RefCell, collections::HashMap, rc::Rc};

const PREAMBLE_LEN: usize = 128;

/// Attributes kept verbatim for the metadata extractor.
const RAW_TAGS: [Tag; 8] = [
    tags::IMAGE_POSITION_PATIENT,
    tags::PIXEL_SPACING,
    tags::IMAGE_ORIENTATION_PATIENT,
    tags::INSTANCE_NUMBER,
    tags::SLICE_LOCATION,
    tags::SERIES_DESCRIPTION,
    tags::WINDOW_CENTER,
    tags::WINDOW_WIDTH,
];

/// [`ImageDecodeService`] over in-memory DICOM Part 10 files.
///
/// Decoded frames are cached for the lifetime of the service and shared by
/// both planes and every study loaded through it.
#[derive(Default)]
pub struct DicomDecodeService {
    objects: RefCell<Vec<DefaultDicomObject>>,
    cache: RefCell<HashMap<ImageId, Rc<DecodedImage>>>,
}

impl DicomDecodeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_images(&self) -> usize {
        self.cache.borrow().len()
    }

    fn decode_object(object: &DefaultDicomObject) -> Result<DecodedImage, DecodeError> {
        let pixel_data = object
            .decode_pixel_data()
            .map_err(|err| DecodeError::PixelData(err.to_string()))?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::Identity);
        let pixels: Array2<f32> = pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .map_err(|err| DecodeError::PixelData(err.to_string()))?
            .slice_move(s![0, .., .., 0]);

        let raw_tags = RAW_TAGS
            .iter()
            .filter_map(|tag| Some((*tag, Self::text(object, *tag)?)))
            .collect();

        Ok(DecodedImage {
            rows: Self::uint(object, tags::ROWS),
            columns: Self::uint(object, tags::COLUMNS),
            window: Self::window(object),
            position: Self::floats(object, tags::IMAGE_POSITION_PATIENT),
            spacing: Self::floats(object, tags::PIXEL_SPACING),
            orientation: Self::floats(object, tags::IMAGE_ORIENTATION_PATIENT),
            raw_tags,
            pixels,
        })
    }

    fn text(object: &DefaultDicomObject, tag: Tag) -> Option<String> {
        object
            .element(tag)
            .ok()?
            .to_str()
            .ok()
            .map(|value| value.trim_end_matches(['\0', ' ']).to_string())
    }

    fn floats(object: &DefaultDicomObject, tag: Tag) -> Option<Vec<f64>> {
        object.element(tag).ok()?.to_multi_float64().ok()
    }

    fn uint(object: &DefaultDicomObject, tag: Tag) -> Option<u32> {
        object.element(tag).ok()?.to_int::<u32>().ok()
    }

    // Window Center/Width may be multi-valued; the first pair is the default.
    fn window(object: &DefaultDicomObject) -> Option<WindowLevel> {
        let center = Self::floats(object, tags::WINDOW_CENTER)?.first().copied()?;
        let width = Self::floats(object, tags::WINDOW_WIDTH)?.first().copied()?;
        Some(WindowLevel::new(center, width))
    }
}

/// Drop the 128 byte preamble if the buffer carries one.
pub fn strip_preamble(data: &[u8]) -> &[u8] {
    if data.get(PREAMBLE_LEN..PREAMBLE_LEN + 4) == Some(&b"DICM"[..]) {
        &data[PREAMBLE_LEN..]
    } else {
        data
    }
}

impl ImageDecodeService for DicomDecodeService {
    fn register(&self, data: &[u8]) -> Result<ImageId, DecodeError> {
        let object = from_reader(strip_preamble(data))?;
        if object.element(tags::PIXEL_DATA).is_err() {
            return Err(DecodeError::NotDecodable(
                "no Pixel Data element".to_string(),
            ));
        }
        let mut objects = self.objects.borrow_mut();
        let id = ImageId(objects.len() as u64);
        objects.push(object);
        Ok(id)
    }

    fn decode(&self, id: ImageId) -> Result<Rc<DecodedImage>, DecodeError> {
        if let Some(image) = self.cache.borrow().get(&id) {
            return Ok(Rc::clone(image));
        }
        let image = {
            let objects = self.objects.borrow();
            let object = objects
                .get(id.0 as usize)
                .ok_or(DecodeError::UnknownImage(id))?;
            Rc::new(Self::decode_object(object)?)
        };
        debug!("decoded {id} ({:?})", image.pixels.dim());
        self.cache.borrow_mut().insert(id, Rc::clone(&image));
        Ok(image)
    }

    fn paint(
        &self,
        canvas: &mut Canvas,
        image: &DecodedImage,
        window: WindowLevel,
    ) -> Result<(), ViewportError> {
        if canvas.size().is_empty() {
            return Err(ViewportError::zero_sized(canvas));
        }
        canvas.draw_image(&image.pixels, window);
        Ok(())
    }

    fn resize(&self, canvas: &mut Canvas, force: bool) -> Result<(), ViewportError> {
        if canvas.bounding_box().is_empty() {
            return Err(ViewportError::zero_sized(canvas));
        }
        if canvas.sync_to_layout(force) {
            debug!("{} resized to {:?}", canvas.label(), canvas.size());
        }
        Ok(())
    }
}
