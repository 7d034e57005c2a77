pub mod cell;
pub mod config;
pub mod error;
pub mod frustum;
pub mod generation;
pub mod heightmap;
pub mod meshing;
pub mod plugin;
pub mod render;
pub mod terrain;

pub use error::{Result, TerrainError};
pub use heightmap::HeightMap;
pub use plugin::{TerrainPlugin, TerrainViewer};
pub use terrain::Terrain;
