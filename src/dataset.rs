//! In-memory gridded soil data on a regular lon/lat lattice.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::location::BoundingBox;

pub const CRS_WGS84: &str = "EPSG:4326";

/// One 2-D variable, row-major, row 0 at the northern edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    /// `NaN` marks missing cells.
    pub data: Vec<f64>,
    pub units: String,
    pub long_name: String,
}

impl Grid {
    pub fn new(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(Error::invalid(
                "grid",
                format!(
                    "{} value(s) do not fill a {}x{} grid",
                    data.len(),
                    width,
                    height
                ),
            ));
        }
        Ok(Self {
            width,
            height,
            data,
            units: String::new(),
            long_name: String::new(),
        })
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = long_name.into();
        self
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.data[row * self.width + col])
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

/// Soil variables sharing one lattice over a bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedDataset {
    pub bbox: BoundingBox,
    pub crs: String,
    /// Cell-centre longitudes, west to east.
    pub lon: Vec<f64>,
    /// Cell-centre latitudes, north to south.
    pub lat: Vec<f64>,
    pub variables: BTreeMap<String, Grid>,
    /// Free-form global metadata carried into the output file.
    pub attributes: BTreeMap<String, String>,
}

impl GriddedDataset {
    /// Empty dataset whose `width` x `height` cells evenly tile `bbox`.
    pub fn new(bbox: BoundingBox, width: usize, height: usize) -> Self {
        let dx = (bbox.xmax - bbox.xmin) / width as f64;
        let dy = (bbox.ymax - bbox.ymin) / height as f64;
        Self::with_geotransform(bbox, bbox.xmin, dx, bbox.ymax, dy, width, height)
    }

    /// Lattice anchored at the north-west corner (`x0`, `y0`) with cell size
    /// `dx` x `dy`, as read from GeoTIFF tie point and pixel scale tags.
    pub fn with_geotransform(
        bbox: BoundingBox,
        x0: f64,
        dx: f64,
        y0: f64,
        dy: f64,
        width: usize,
        height: usize,
    ) -> Self {
        let lon = (0..width).map(|i| x0 + (i as f64 + 0.5) * dx).collect();
        let lat = (0..height).map(|j| y0 - (j as f64 + 0.5) * dy).collect();
        Self {
            bbox,
            crs: CRS_WGS84.to_string(),
            lon,
            lat,
            variables: BTreeMap::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.lon.len()
    }

    pub fn height(&self) -> usize {
        self.lat.len()
    }

    pub fn insert(&mut self, name: impl Into<String>, grid: Grid) -> Result<()> {
        let name = name.into();
        if grid.width != self.width() || grid.height != self.height() {
            return Err(Error::invalid(
                "grid",
                format!(
                    "variable '{}' is {}x{}, dataset lattice is {}x{}",
                    name,
                    grid.width,
                    grid.height,
                    self.width(),
                    self.height()
                ),
            ));
        }
        self.variables.insert(name, grid);
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&Grid> {
        self.variables.get(name)
    }
}

/// Thickness-weighted mean of depth layers.
///
/// A cell is missing in the result if it is missing in any layer or if the
/// mean is exactly zero (SoilGrids encodes water and bare rock as 0).
pub fn depth_weighted_mean(layers: &[(Grid, f64)]) -> Result<Grid> {
    let Some((first, _)) = layers.first() else {
        return Err(Error::invalid("layers", "no depth layers to average"));
    };
    let (width, height) = (first.width, first.height);
    if let Some((odd, _)) = layers
        .iter()
        .find(|(g, _)| g.width != width || g.height != height)
    {
        return Err(Error::invalid(
            "layers",
            format!(
                "depth layers differ in shape: {}x{} vs {}x{}",
                width, height, odd.width, odd.height
            ),
        ));
    }

    let total: f64 = layers.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(Error::invalid("layers", "depth weights must sum to a positive value"));
    }

    let data = (0..width * height)
        .map(|i| {
            let sum: f64 = layers.iter().map(|(g, w)| g.data[i] * w).sum();
            let mean = sum / total;
            if mean == 0.0 { f64::NAN } else { mean }
        })
        .collect();

    Ok(Grid {
        width,
        height,
        data,
        units: first.units.clone(),
        long_name: first.long_name.clone(),
    })
}
