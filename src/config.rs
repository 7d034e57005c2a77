use std::{
    fs,
    path::{Path, PathBuf},
};

use bevy::prelude::Resource;

use crate::error::{Result, TerrainError};

/// Contents of a terrain setup file.
///
/// The file is read positionally: each value follows the next `:` in the
/// text, in this order:
///
/// ```text
/// Terrain Filename: heightmap.r16
/// Terrain Height: 257
/// Terrain Width: 257
/// Terrain Scaling: 12.0
/// Color Map Filename: colormap.bmp
/// ```
///
/// Labels are ignored, so they can be anything that does not contain a colon.
#[derive(Debug, PartialEq)]
pub struct TerrainSetup {
    pub height_map: PathBuf,
    pub height: usize,
    pub width: usize,
    pub height_scale: f32,
    pub color_map: PathBuf,
}

impl TerrainSetup {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| TerrainError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&text, path.parent().unwrap_or_else(|| Path::new("")))
    }

    /// Relative file names are resolved against `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> Result<Self> {
        let mut fields = Fields { rest: text };

        let height_map = base_dir.join(fields.next("terrain filename")?);
        let height = fields.parse("terrain height")?;
        let width = fields.parse("terrain width")?;
        let height_scale = fields.parse("terrain scaling")?;
        let color_map = base_dir.join(fields.next("color map filename")?);

        Ok(Self {
            height_map,
            height,
            width,
            height_scale,
            color_map,
        })
    }

    /// Text form accepted by [`TerrainSetup::parse`], with paths written as given.
    pub fn to_setup_text(&self) -> String {
        format!(
            "Terrain Filename: {}\nTerrain Height: {}\nTerrain Width: {}\nTerrain Scaling: {}\nColor Map Filename: {}\n",
            self.height_map.display(),
            self.height,
            self.width,
            self.height_scale,
            self.color_map.display(),
        )
    }
}

struct Fields<'a> {
    rest: &'a str,
}

impl<'a> Fields<'a> {
    fn next(&mut self, field: &'static str) -> Result<&'a str> {
        let colon = self
            .rest
            .find(':')
            .ok_or(TerrainError::MissingField { field })?;
        let value = self.rest[colon + 1..].trim_start();
        let end = value.find(char::is_whitespace).unwrap_or(value.len());

        if end == 0 {
            return Err(TerrainError::MissingField { field });
        }

        self.rest = &value[end..];
        Ok(&value[..end])
    }

    fn parse<T: std::str::FromStr>(&mut self, field: &'static str) -> Result<T> {
        let value = self.next(field)?;
        value.parse().map_err(|_| TerrainError::InvalidField {
            field,
            value: value.to_owned(),
        })
    }
}

/// Runtime knobs for [`crate::plugin::TerrainPlugin`].
#[derive(Resource, Debug, Clone)]
pub struct TerrainSettings {
    pub setup_path: PathBuf,
    /// Draw distance; the frustum far plane is pulled in to this depth.
    pub screen_depth: f32,
    pub show_cell_bounds: bool,
    pub lock_to_ground: bool,
    /// Camera height above the ground when `lock_to_ground` is set.
    pub eye_height: f32,
    /// Seconds between frame statistics log lines, `None` disables them.
    pub log_frame_stats: Option<f32>,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            setup_path: PathBuf::from("assets/terrain/setup.txt"),
            screen_depth: 1000.,
            show_cell_bounds: false,
            lock_to_ground: false,
            eye_height: 2.,
            log_frame_stats: Some(2.),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETUP: &str = "Terrain Filename: data/heightmap.r16\n\
                         Terrain Height: 257\n\
                         Terrain Width: 257\n\
                         Terrain Scaling: 12.5\n\
                         Color Map Filename: data/colormap.bmp\n";

    #[test]
    fn parses_fields_in_order() {
        let setup = TerrainSetup::parse(SETUP, Path::new("assets")).unwrap();

        assert_eq!(setup.height_map, Path::new("assets/data/heightmap.r16"));
        assert_eq!(setup.height, 257);
        assert_eq!(setup.width, 257);
        assert_eq!(setup.height_scale, 12.5);
        assert_eq!(setup.color_map, Path::new("assets/data/colormap.bmp"));
    }

    #[test]
    fn labels_are_ignored() {
        let text = "a: h.r16 b: 65 c: 33 d: 2 e: c.bmp";
        let setup = TerrainSetup::parse(text, Path::new("")).unwrap();

        assert_eq!(setup.height, 65);
        assert_eq!(setup.width, 33);
        assert_eq!(setup.color_map, Path::new("c.bmp"));
    }

    #[test]
    fn missing_field_is_reported() {
        let text = "Terrain Filename: h.r16\nTerrain Height: 65\n";
        let err = TerrainSetup::parse(text, Path::new("")).unwrap_err();

        assert!(matches!(
            err,
            TerrainError::MissingField {
                field: "terrain width"
            }
        ));
    }

    #[test]
    fn bad_number_is_reported() {
        let text = SETUP.replace("12.5", "tall");
        let err = TerrainSetup::parse(&text, Path::new("")).unwrap_err();

        assert!(matches!(err, TerrainError::InvalidField { value, .. } if value == "tall"));
    }

    #[test]
    fn setup_text_round_trips_through_parse() {
        let setup = TerrainSetup::parse(SETUP, Path::new("")).unwrap();
        let again = TerrainSetup::parse(&setup.to_setup_text(), Path::new("")).unwrap();

        assert_eq!(setup, again);
    }

    #[test]
    fn load_resolves_against_setup_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.txt");
        std::fs::write(&path, SETUP).unwrap();

        let setup = TerrainSetup::load(&path).unwrap();

        assert_eq!(setup.height_map, dir.path().join("data/heightmap.r16"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TerrainSetup::load(dir.path().join("nope.txt")).unwrap_err();

        assert!(matches!(err, TerrainError::Io { .. }));
    }
}
