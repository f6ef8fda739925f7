use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    #[default]
    Axial,
    Sagittal,
}

impl Plane {
    pub const ALL: [Plane; 2] = [Plane::Axial, Plane::Sagittal];
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plane::Axial => f.write_str("axial"),
            Plane::Sagittal => f.write_str("sagittal"),
        }
    }
}

/// State of a plane's cursor machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No stack loaded.
    Idle,
    /// Cursor points at a valid slice.
    Ready,
}
