//! Writes sample terrain assets: a raw height map, a matching color map and
//! the setup file tying them together.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::{Rgb, RgbImage};
use ndarray::prelude::*;
use noise::{NoiseFn, Perlin};

use crate::{
    config::TerrainSetup,
    error::{Result, TerrainError},
    terrain::check_size,
};

pub struct NoiseSettings {
    pub scale: f32,
    pub octaves: usize,
    /// Heights below this fraction are flattened into lakes.
    pub sea_level: f32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: 5e-3,
            octaves: 8,
            sea_level: 0.4,
        }
    }
}

/// Fractal Perlin noise in `[0, 1]`, shaped `(height, width)`.
pub fn perlin_terrain(
    (width, height): (usize, usize),
    seed: u32,
    noise_settings: &NoiseSettings,
) -> Array2<f32> {
    let scale_start = noise_settings.scale;
    let perlin = Perlin::new(seed);

    let mut data: Array2<f32> = Array::zeros((height, width));

    for ((y, x), value) in data.indexed_iter_mut() {
        let mut scale = 1.;

        for i in 0..noise_settings.octaves {
            *value += scale
                * perlin.get([
                    (i as f32 * 1000. + scale_start / scale * x as f32) as f64,
                    (scale_start / scale * y as f32) as f64,
                ]) as f32;
            scale /= 2.;
        }
    }

    // Sum of the octave amplitudes
    let max_magnitude: f32 = (0..noise_settings.octaves)
        .map(|i| 0.5f32.powi(i as i32))
        .sum();

    // Covert the values from -max_magnitude..max_magnitude to 0..1
    ((data / max_magnitude + 1.) / 2.).mapv(|v: f32| v.clamp(noise_settings.sea_level, 1.))
}

fn ground_color(height: f32, sea_level: f32) -> Rgb<u8> {
    let t = ((height - sea_level) / (1. - sea_level)).clamp(0., 1.);

    let palette: [(f32, [f32; 3]); 4] = [
        (0., [48., 92., 140.]),
        (0.05, [86., 125., 70.]),
        (0.6, [120., 100., 80.]),
        (1., [245., 245., 250.]),
    ];

    let upper = palette.iter().position(|(stop, _)| t <= *stop).unwrap_or(3).max(1);
    let (low_stop, low) = palette[upper - 1];
    let (high_stop, high) = palette[upper];
    let f = (t - low_stop) / (high_stop - low_stop);

    Rgb([0, 1, 2].map(|c| (low[c] + (high[c] - low[c]) * f) as u8))
}

/// Writes `heightmap.r16`, `colormap.bmp` and `setup.txt` into `dir` for a
/// `size` x `size` terrain and returns the setup file path.
///
/// Sizes the terrain builder would reject are refused before anything is
/// written.
pub fn write_sample_terrain(
    dir: &Path,
    size: usize,
    seed: u32,
    noise_settings: &NoiseSettings,
) -> Result<PathBuf> {
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| TerrainError::Io { path, source }
    };

    check_size(size, size)?;
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    let heights = perlin_terrain((size, size), seed, noise_settings);

    let raw: Vec<u8> = heights
        .iter()
        .flat_map(|h| ((h * u16::MAX as f32) as u16).to_le_bytes())
        .collect();
    let height_map = dir.join("heightmap.r16");
    fs::write(&height_map, raw).map_err(io_error(&height_map))?;

    let colors = RgbImage::from_fn(size as u32, size as u32, |x, y| {
        ground_color(heights[[y as usize, x as usize]], noise_settings.sea_level)
    });
    let color_map = dir.join("colormap.bmp");
    colors
        .save(&color_map)
        .map_err(|source| TerrainError::ColorMap {
            path: color_map.clone(),
            source,
        })?;

    let setup = TerrainSetup {
        height_map: PathBuf::from("heightmap.r16"),
        height: size,
        width: size,
        // Tallest peak at a quarter of the terrain width
        height_scale: u16::MAX as f32 / (size as f32 * 0.25),
        color_map: PathBuf::from("colormap.bmp"),
    };
    let setup_path = dir.join("setup.txt");
    fs::write(&setup_path, setup.to_setup_text()).map_err(io_error(&setup_path))?;

    Ok(setup_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render::testing::MemoryDevice, terrain::Terrain};

    #[test]
    fn noise_is_normalized() {
        let settings = NoiseSettings::default();
        let heights = perlin_terrain((40, 20), 2, &settings);

        assert_eq!(heights.dim(), (20, 40));
        assert!(heights
            .iter()
            .all(|h| (settings.sea_level..=1.).contains(h)));
    }

    #[test]
    fn palette_runs_from_water_to_snow() {
        assert_eq!(ground_color(0.4, 0.4), Rgb([48, 92, 140]));
        assert_eq!(ground_color(1., 0.4), Rgb([245, 245, 250]));
    }

    #[test]
    fn written_assets_build_a_terrain() {
        let dir = tempfile::tempdir().unwrap();

        let setup = write_sample_terrain(dir.path(), 65, 7, &NoiseSettings::default()).unwrap();
        let terrain = Terrain::build(&mut MemoryDevice::default(), setup).unwrap();

        assert_eq!(terrain.cell_count(), 4);
        let height = terrain.height_at(20.5, 20.5).unwrap();
        assert!((0. ..=65. * 0.25).contains(&height));
    }

    #[test]
    fn unsupported_size_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let err = write_sample_terrain(&out, 100, 7, &NoiseSettings::default()).unwrap_err();

        assert!(matches!(
            err,
            TerrainError::UnsupportedSize { width: 100, .. }
        ));
        assert!(!out.exists());
    }
}
