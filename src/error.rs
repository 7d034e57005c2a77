use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = TerrainError> = std::result::Result<T, E>;

/// Everything that can abort a terrain build.
///
/// Per-frame operations never return these; a query that misses the
/// terrain is an `Option`, not an error.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("setup file has no `{field}` entry")]
    MissingField { field: &'static str },

    #[error("invalid value `{value}` for `{field}`")]
    InvalidField { field: &'static str, value: String },

    #[error("height map {} holds {found} samples, expected {expected}", .path.display())]
    TruncatedHeightMap {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("failed to decode color map {}: {source}", .path.display())]
    ColorMap {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("color map is {found_width}x{found_height}, terrain is {width}x{height}")]
    ColorMapDimensions {
        width: usize,
        height: usize,
        found_width: u32,
        found_height: u32,
    },

    #[error("terrain {width}x{height} cannot be split into square {quads}x{quads} quad cells")]
    UnsupportedSize {
        width: usize,
        height: usize,
        quads: usize,
    },

    #[error("cell ({cell_x}, {cell_z}) reaches past the end of the terrain mesh")]
    CellOutOfBounds { cell_x: usize, cell_z: usize },

    #[error("could not allocate {count} terrain vertices")]
    Allocation { count: usize },
}
