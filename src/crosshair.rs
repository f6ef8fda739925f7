//! Crosshair placement.
//!
//! Positions are proportional to the other plane's cursor index. They assume
//! both stacks are evenly spaced and span the other canvas edge to edge; the
//! patient-space position and orientation vectors in
//! [`SliceMetadata`](crate::metadata::SliceMetadata) are not consulted. This
//! is a known precision limit of the viewer, not a placeholder.

/// Offset along `extent` for `cursor` in a stack of `len` slices, or `None`
/// when the stack has fewer than two slices.
pub fn proportional_offset(cursor: usize, len: usize, extent: u32) -> Option<f64> {
    if len <= 1 {
        return None;
    }
    let cursor = cursor.min(len - 1);
    Some(cursor as f64 * f64::from(extent) / (len - 1) as f64)
}

/// X of the vertical line on the axial canvas.
pub fn axial_vertical_x(
    sagittal_cursor: usize,
    sagittal_len: usize,
    axial_width: u32,
) -> Option<f64> {
    proportional_offset(sagittal_cursor, sagittal_len, axial_width)
}

/// Y of the horizontal line on the sagittal canvas.
pub fn sagittal_horizontal_y(
    axial_cursor: usize,
    axial_len: usize,
    sagittal_height: u32,
) -> Option<f64> {
    proportional_offset(axial_cursor, axial_len, sagittal_height)
}
