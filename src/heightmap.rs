use std::{fs, path::Path};

use bevy::prelude::Vec3;
use image::{ImageFormat, RgbImage};
use ndarray::Array2;

use crate::error::{Result, TerrainError};

/// One lattice point of the source grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightSample {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Vec3,
}

impl HeightSample {
    fn with_elevation(elevation: f32) -> Self {
        Self {
            position: Vec3::new(0., elevation, 0.),
            normal: Vec3::Y,
            color: Vec3::ONE,
        }
    }
}

/// Height samples indexed `[[row, column]]`; row 0 is the far edge of the terrain.
#[derive(Debug)]
pub struct HeightMap(pub Array2<HeightSample>);

impl HeightMap {
    /// Raw elevations shaped `(height, width)`; coordinates are assigned later
    /// by [`HeightMap::set_coordinates`].
    pub fn from_elevations(elevations: &Array2<f32>) -> Self {
        Self(elevations.map(|&e| HeightSample::with_elevation(e)))
    }

    /// Reads `width * height` little-endian `u16` samples, row-major.
    pub fn load_raw(path: impl AsRef<Path>, width: usize, height: usize) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| TerrainError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let expected = width * height;
        if bytes.len() / 2 < expected {
            return Err(TerrainError::TruncatedHeightMap {
                path: path.to_path_buf(),
                expected,
                found: bytes.len() / 2,
            });
        }

        Ok(Self(Array2::from_shape_fn((height, width), |(j, i)| {
            let k = 2 * (j * width + i);
            HeightSample::with_elevation(u16::from_le_bytes([bytes[k], bytes[k + 1]]) as f32)
        })))
    }

    pub fn width(&self) -> usize {
        self.0.dim().1
    }

    pub fn height(&self) -> usize {
        self.0.dim().0
    }

    pub fn sample(&self, column: usize, row: usize) -> &HeightSample {
        &self.0[[row, column]]
    }

    /// Places sample `(i, j)` at `x = i`, `z = (height - 1) - j` and divides
    /// its elevation by `height_scale`.
    pub fn set_coordinates(&mut self, height_scale: f32) {
        let far_edge = (self.height() - 1) as f32;

        for ((j, i), sample) in self.0.indexed_iter_mut() {
            sample.position.x = i as f32;
            sample.position.z = far_edge - j as f32;
            sample.position.y /= height_scale;
        }
    }

    /// Smooth vertex normals: one face normal per quad, then every vertex gets
    /// the renormalized sum of the faces touching it.
    ///
    /// Degenerate faces are not guarded and produce NaN normals.
    pub fn calculate_normals(&mut self) {
        let (height, width) = self.0.dim();

        let faces = Array2::from_shape_fn((height - 1, width - 1), |(j, i)| {
            let bottom_left = self.0[[j + 1, i]].position;
            let bottom_right = self.0[[j + 1, i + 1]].position;
            let upper_left = self.0[[j, i]].position;

            let a = bottom_left - upper_left;
            let b = upper_left - bottom_right;
            let normal = a.cross(b);
            normal / normal.length()
        });

        for ((j, i), sample) in self.0.indexed_iter_mut() {
            let mut sum = Vec3::ZERO;

            if i > 0 && j > 0 {
                sum += faces[[j - 1, i - 1]];
            }
            if i < width - 1 && j > 0 {
                sum += faces[[j - 1, i]];
            }
            if i > 0 && j < height - 1 {
                sum += faces[[j, i - 1]];
            }
            if i < width - 1 && j < height - 1 {
                sum += faces[[j, i]];
            }

            sample.normal = sum / sum.length();
        }
    }

    /// Loads a bitmap whose dimensions must match the grid exactly.
    ///
    /// The file is always decoded as BMP whatever its extension. Bit depths
    /// other than 24 are converted to 8-bit RGB.
    pub fn load_color_map(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let mut reader = image::io::Reader::open(path).map_err(|source| TerrainError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        reader.set_format(ImageFormat::Bmp);

        let image = reader
            .decode()
            .map_err(|source| TerrainError::ColorMap {
                path: path.to_path_buf(),
                source,
            })?;

        self.set_colors(&image.to_rgb8())
    }

    /// Copies pixel colors onto the samples.
    ///
    /// `image` rows are top-down, so image row `j` lands on grid row `j`; this
    /// is the bottom-up file row `height - 1 - j`.
    pub fn set_colors(&mut self, image: &RgbImage) -> Result<()> {
        let (height, width) = self.0.dim();

        if image.width() as usize != width || image.height() as usize != height {
            return Err(TerrainError::ColorMapDimensions {
                width,
                height,
                found_width: image.width(),
                found_height: image.height(),
            });
        }

        for ((j, i), sample) in self.0.indexed_iter_mut() {
            let [r, g, b] = image.get_pixel(i as u32, j as u32).0;
            sample.color = Vec3::new(r as f32, g as f32, b as f32) / 255.;
        }

        Ok(())
    }
}
