//! Usage: `generate_terrain [output dir] [size] [seed]`
//!
//! Size must be a multiple of 32 plus one, e.g. 257 or 1025.

use std::path::PathBuf;

use cell_terrain::{
    generation::{write_sample_terrain, NoiseSettings},
    TerrainError,
};

fn main() -> Result<(), TerrainError> {
    let mut args = std::env::args().skip(1);

    let dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets/terrain"));
    let size = parse_arg(args.next(), "size", 257)?;
    let seed = parse_arg(args.next(), "seed", 2)?;

    let setup = write_sample_terrain(&dir, size, seed, &NoiseSettings::default())?;
    println!("wrote {}", setup.display());

    Ok(())
}

fn parse_arg<T: std::str::FromStr>(
    arg: Option<String>,
    field: &'static str,
    default: T,
) -> Result<T, TerrainError> {
    match arg {
        Some(value) => value
            .parse()
            .map_err(|_| TerrainError::InvalidField { field, value }),
        None => Ok(default),
    }
}
