//! # World Map
//!
//! Fixed size square grid with one vote accumulator per [`WorldMapLayer`]. Values only ever
//! increase, saturating at `u32::MAX`.

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use std::{fs::File, io, path::Path};

use image::{Rgb, RgbImage};
use ndarray::{Array3, ArrayView2, s};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WorldMapParams {
    /// Number of cells along each side of the square map
    pub size_cells: usize,
}

/// Persistent grid of evidence accumulators.
#[derive(Debug, Clone, Serialize)]
pub struct WorldMap {
    /// Number of cells along each side
    size: usize,

    /// Raw map data, a 3D array with dimension order layer, x cell, y cell
    data: Array3<u32>,
}

/// Summary of how much of the map has been explored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MapCoverage {
    /// Cells with any navigable or obstacle evidence
    pub mapped_cells: usize,

    /// Cells where navigable evidence is at least as strong as obstacle evidence
    pub navigable_cells: usize,

    /// Cells with any rock evidence
    pub rock_cells: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Layers in a [`WorldMap`].
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug, Serialize, Deserialize)]
pub enum WorldMapLayer {
    Obstacle,
    Rock,
    Navigable,
}

#[derive(Debug, thiserror::Error)]
pub enum WorldMapError {
    #[error("The world map must have at least one cell")]
    ZeroSize,

    #[error("Requested cell ({0}, {1}) outside map bounds")]
    OutsideMap(usize, usize),

    #[error("Cell index lists have different lengths ({0} x, {1} y)")]
    MismatchedIndices(usize, usize),

    #[error("An IO operation failed: {0}")]
    IoError(io::Error),

    #[error("Couldn't serialize the world map: {0}")]
    SerializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WorldMapLayer {
    pub const ALL: [WorldMapLayer; 3] = [
        WorldMapLayer::Obstacle,
        WorldMapLayer::Rock,
        WorldMapLayer::Navigable,
    ];

    fn index(&self) -> usize {
        match self {
            WorldMapLayer::Obstacle => 0,
            WorldMapLayer::Rock => 1,
            WorldMapLayer::Navigable => 2,
        }
    }
}

impl WorldMap {
    /// Create a new zeroed map.
    pub fn new(params: &WorldMapParams) -> Result<Self, WorldMapError> {
        if params.size_cells == 0 {
            return Err(WorldMapError::ZeroSize);
        }

        Ok(Self {
            size: params.size_cells,
            data: Array3::zeros((WorldMapLayer::ALL.len(), params.size_cells, params.size_cells)),
        })
    }

    /// Number of cells along each side of the map.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Add `weight` to the given layer at every `(x, y)` cell.
    ///
    /// Indices past the edge of the map are clamped onto the edge. A cell listed more than once
    /// receives the weight once per listing.
    pub fn accumulate(
        &mut self,
        layer: WorldMapLayer,
        x_cells: &[usize],
        y_cells: &[usize],
        weight: u32,
    ) -> Result<(), WorldMapError> {
        if x_cells.len() != y_cells.len() {
            return Err(WorldMapError::MismatchedIndices(x_cells.len(), y_cells.len()));
        }

        let max_idx = self.size - 1;
        let mut view = self.data.slice_mut(s![layer.index(), .., ..]);

        for (&x, &y) in x_cells.iter().zip(y_cells.iter()) {
            let cell = &mut view[[x.min(max_idx), y.min(max_idx)]];
            *cell = cell.saturating_add(weight);
        }

        Ok(())
    }

    /// Get the accumulated value of a single cell.
    pub fn get(&self, layer: WorldMapLayer, x: usize, y: usize) -> Result<u32, WorldMapError> {
        if x >= self.size || y >= self.size {
            return Err(WorldMapError::OutsideMap(x, y));
        }

        Ok(self.data[[layer.index(), x, y]])
    }

    /// Read-only view of a whole layer, indexed `[x, y]`.
    pub fn layer(&self, layer: WorldMapLayer) -> ArrayView2<u32> {
        self.data.slice(s![layer.index(), .., ..])
    }

    /// Count the explored cells of the map.
    pub fn coverage(&self) -> MapCoverage {
        let obs = self.layer(WorldMapLayer::Obstacle);
        let rock = self.layer(WorldMapLayer::Rock);
        let nav = self.layer(WorldMapLayer::Navigable);

        let mut cov = MapCoverage::default();

        for ((&o, &r), &n) in obs.iter().zip(rock.iter()).zip(nav.iter()) {
            if o > 0 || n > 0 {
                cov.mapped_cells += 1;
            }
            if n > 0 && n >= o {
                cov.navigable_cells += 1;
            }
            if r > 0 {
                cov.rock_cells += 1;
            }
        }

        cov
    }

    /// Render the map as an image, obstacle in red, rock in green, navigable in blue.
    ///
    /// Obstacle evidence is hidden in cells where navigable evidence is at least as strong. The
    /// image is flipped so that world +y points up.
    pub fn to_rgb_image(&self) -> RgbImage {
        let size = self.size as u32;
        let obs = self.layer(WorldMapLayer::Obstacle);
        let rock = self.layer(WorldMapLayer::Rock);
        let nav = self.layer(WorldMapLayer::Navigable);

        RgbImage::from_fn(size, size, |px, py| {
            let x = px as usize;
            let y = (size - 1 - py) as usize;

            let (o, r, n) = (obs[[x, y]], rock[[x, y]], nav[[x, y]]);

            let red = if n >= o { 0 } else { o.min(255) as u8 };
            let green = if r > 0 { 255 } else { 0 };

            Rgb([red, green, n.min(255) as u8])
        })
    }

    /// Save the map as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), WorldMapError> {
        let file = File::create(path).map_err(WorldMapError::IoError)?;

        serde_json::to_writer(file, self).map_err(WorldMapError::SerializeError)
    }
}
