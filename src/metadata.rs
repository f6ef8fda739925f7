use dicom::core::Tag;
use dicom_dictionary_std::tags;
use log::warn;

use crate::{
    config::DEFAULT_IMAGE_DIMENSION,
    decode::{DecodedImage, ImageDecodeService},
    stack::ImageHandle,
};

/// Spatial and descriptive fields of one slice. Every field may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceMetadata {
    pub position: Option<[f64; 3]>,
    pub spacing: Option<[f64; 2]>,
    pub orientation: Option<[f64; 6]>,
    pub rows: u32,
    pub columns: u32,
    pub instance_number: Option<i32>,
    pub slice_location: Option<f64>,
    pub series_description: Option<String>,
}

impl Default for SliceMetadata {
    fn default() -> Self {
        Self {
            position: None,
            spacing: None,
            orientation: None,
            rows: DEFAULT_IMAGE_DIMENSION,
            columns: DEFAULT_IMAGE_DIMENSION,
            instance_number: None,
            slice_location: None,
            series_description: None,
        }
    }
}

/// Builds [`SliceMetadata`], filling unreported dimensions with a
/// placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataExtractor {
    placeholder_rows: u32,
    placeholder_columns: u32,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_DIMENSION, DEFAULT_IMAGE_DIMENSION)
    }
}

impl MetadataExtractor {
    pub fn new(placeholder_rows: u32, placeholder_columns: u32) -> Self {
        Self {
            placeholder_rows,
            placeholder_columns,
        }
    }

    /// Extract metadata for a registered image.
    ///
    /// Returns `None` only if the image cannot be decoded. The failure is
    /// logged here; callers keep the `None` in place.
    pub fn extract(
        &self,
        service: &impl ImageDecodeService,
        handle: &ImageHandle,
    ) -> Option<SliceMetadata> {
        match service.decode(handle.id) {
            Ok(image) => Some(self.describe(&image)),
            Err(err) => {
                warn!("metadata extraction failed for {}: {err}", handle.filename);
                None
            }
        }
    }

    pub fn describe(&self, image: &DecodedImage) -> SliceMetadata {
        SliceMetadata {
            position: Self::field(image, tags::IMAGE_POSITION_PATIENT, &image.position),
            spacing: Self::field(image, tags::PIXEL_SPACING, &image.spacing),
            orientation: Self::field(image, tags::IMAGE_ORIENTATION_PATIENT, &image.orientation),
            rows: image.rows.unwrap_or(self.placeholder_rows),
            columns: image.columns.unwrap_or(self.placeholder_columns),
            instance_number: image
                .raw_tag(tags::INSTANCE_NUMBER)
                .and_then(|value| value.trim().parse().ok()),
            slice_location: image
                .raw_tag(tags::SLICE_LOCATION)
                .and_then(|value| value.trim().parse().ok()),
            series_description: image
                .raw_tag(tags::SERIES_DESCRIPTION)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
        }
    }

    // Raw tag first, then the decoder's own parsed vector.
    fn field<const N: usize>(
        image: &DecodedImage,
        tag: Tag,
        native: &Option<Vec<f64>>,
    ) -> Option<[f64; N]> {
        image
            .raw_tag(tag)
            .and_then(parse_multi_value::<N>)
            .or_else(|| native.as_deref().and_then(|values| values.try_into().ok()))
    }
}

/// Parse a backslash delimited numeric value with exactly `N` elements.
pub fn parse_multi_value<const N: usize>(raw: &str) -> Option<[f64; N]> {
    let values = raw
        .split('\\')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    values.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn image_with_tags(entries: &[(Tag, &str)]) -> DecodedImage {
        let mut image = DecodedImage::new(Array2::zeros((4, 6)));
        for (tag, value) in entries {
            image.raw_tags.insert(*tag, value.to_string());
        }
        image
    }

    #[test]
    fn parses_backslash_values() {
        assert_eq!(
            parse_multi_value::<3>("-120.5\\ 33 \\7.25"),
            Some([-120.5, 33.0, 7.25])
        );
        assert_eq!(parse_multi_value::<2>("0.7\\0.7\\1"), None);
        assert_eq!(parse_multi_value::<2>("0.7\\abc"), None);
        assert_eq!(parse_multi_value::<2>(""), None);
    }

    #[test]
    fn raw_tags_populate_spatial_fields() {
        let image = image_with_tags(&[
            (tags::IMAGE_POSITION_PATIENT, "1\\2\\3"),
            (tags::PIXEL_SPACING, "0.5\\0.75"),
            (tags::IMAGE_ORIENTATION_PATIENT, "1\\0\\0\\0\\1\\0"),
        ]);

        let metadata = MetadataExtractor::default().describe(&image);
        assert_eq!(metadata.position, Some([1.0, 2.0, 3.0]));
        assert_eq!(metadata.spacing, Some([0.5, 0.75]));
        assert_eq!(metadata.orientation, Some([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]));
        assert_eq!((metadata.rows, metadata.columns), (4, 6));
    }

    #[test]
    fn wrong_count_degrades_only_that_field() {
        let image = image_with_tags(&[
            (tags::IMAGE_POSITION_PATIENT, "1\\2"),
            (tags::PIXEL_SPACING, "0.5\\0.5"),
        ]);

        let metadata = MetadataExtractor::default().describe(&image);
        assert_eq!(metadata.position, None);
        assert_eq!(metadata.spacing, Some([0.5, 0.5]));
    }

    #[test]
    fn native_fields_fill_in_for_missing_raw_tags() {
        let mut image = image_with_tags(&[(tags::PIXEL_SPACING, "bogus")]);
        image.spacing = Some(vec![0.9, 0.9]);
        image.position = Some(vec![0.0, 0.0]);
        image.orientation = Some(vec![0.0, 1.0, 0.0, 0.0, 0.0, -1.0]);

        let metadata = MetadataExtractor::default().describe(&image);
        assert_eq!(metadata.spacing, Some([0.9, 0.9]));
        assert_eq!(metadata.position, None);
        assert_eq!(metadata.orientation, Some([0.0, 1.0, 0.0, 0.0, 0.0, -1.0]));
    }

    #[test]
    fn missing_dimensions_use_placeholder() {
        let mut image = DecodedImage::default();
        image.raw_tags.insert(tags::INSTANCE_NUMBER, " 12 ".to_string());
        image
            .raw_tags
            .insert(tags::SERIES_DESCRIPTION, "SAG T2".to_string());

        let metadata = MetadataExtractor::default().describe(&image);
        assert_eq!((metadata.rows, metadata.columns), (512, 512));
        assert_eq!(metadata.instance_number, Some(12));
        assert_eq!(metadata.series_description.as_deref(), Some("SAG T2"));
    }

    #[test]
    fn configured_placeholder_replaces_missing_dimensions() {
        let extractor = MetadataExtractor::new(256, 128);

        let missing = extractor.describe(&DecodedImage::default());
        assert_eq!((missing.rows, missing.columns), (256, 128));

        let reported = extractor.describe(&image_with_tags(&[]));
        assert_eq!((reported.rows, reported.columns), (4, 6));
    }
}
