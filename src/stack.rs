use crate::{decode::ImageId, metadata::SliceMetadata};

/// A registered image and the filename it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub id: ImageId,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct StackSlice {
    pub handle: ImageHandle,
    pub metadata: Option<SliceMetadata>,
}

/// Sorted slices of one plane. Each handle is stored next to its metadata,
/// so the two sequences can never drift out of alignment.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    slices: Vec<StackSlice>,
}

impl Stack {
    pub fn new(slices: Vec<StackSlice>) -> Self {
        Self { slices }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StackSlice> {
        self.slices.get(index)
    }

    pub fn handle(&self, index: usize) -> Option<&ImageHandle> {
        self.slices.get(index).map(|slice| &slice.handle)
    }

    pub fn handles(&self) -> impl Iterator<Item = &ImageHandle> {
        self.slices.iter().map(|slice| &slice.handle)
    }

    pub fn metadata(&self) -> impl Iterator<Item = Option<&SliceMetadata>> {
        self.slices.iter().map(|slice| slice.metadata.as_ref())
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.handles().map(|handle| handle.filename.as_str()).collect()
    }

    /// Index of the middle slice, `len / 2`.
    pub fn middle_index(&self) -> usize {
        self.len() / 2
    }

    /// Clamp `index` into `[0, len - 1]`. An empty stack clamps to 0.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.len().saturating_sub(1))
    }
}
