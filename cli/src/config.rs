use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use sweeper_core::{Coord, Grid, GridShape, Level, Topology};

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Preset {
    Beginner,
    Intermediate,
    Expert,
}

impl From<Preset> for Level {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Beginner => Level::beginner(),
            Preset::Intermediate => Level::intermediate(),
            Preset::Expert => Level::expert(),
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    Square,
    Hex,
}

impl From<Shape> for GridShape {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Square => GridShape::Square,
            Shape::Hex => GridShape::Hex,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Edges {
    Limited,
    Toroidal,
}

impl From<Edges> for Topology {
    fn from(edges: Edges) -> Self {
        match edges {
            Edges::Limited => Topology::Limited,
            Edges::Toroidal => Topology::Toroidal,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct GridArgs {
    /// Number of rows
    #[arg(long)]
    pub rows: Option<Coord>,

    /// Number of columns
    #[arg(long)]
    pub cols: Option<Coord>,

    /// Cell tessellation
    #[arg(long, value_enum)]
    pub shape: Option<Shape>,

    /// Edge behavior
    #[arg(long, value_enum)]
    pub topology: Option<Edges>,
}

impl GridArgs {
    /// Overrides the fields of `grid` that were given on the command line.
    pub fn apply(&self, grid: Grid) -> Grid {
        Grid {
            rows: self.rows.unwrap_or(grid.rows),
            cols: self.cols.unwrap_or(grid.cols),
            shape: self.shape.map_or(grid.shape, Into::into),
            topology: self.topology.map_or(grid.topology, Into::into),
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct LevelArgs {
    /// Start from a standard level
    #[arg(short, long, value_enum)]
    pub preset: Option<Preset>,

    /// Read the level from a TOML file instead
    #[arg(long, conflicts_with = "preset")]
    pub level: Option<PathBuf>,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Number of mines
    #[arg(short, long)]
    pub mines: Option<u16>,
}

impl LevelArgs {
    pub fn resolve(&self) -> Result<Level> {
        let base = match &self.level {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Could not read level file {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("Could not parse level file {}", path.display()))?
            }
            None => self.preset.map(Level::from).unwrap_or_default(),
        };

        let level = Level {
            grid: self.grid.apply(base.grid),
            mines: self.mines.unwrap_or(base.mines),
        };
        log::debug!("level: {:?}", level);
        Ok(level)
    }
}
