//! NetCDF classic encoding of [`GriddedDataset`].
//!
//! Layout: dimensions `lat` and `lon`, CF coordinate variables of the same
//! names, one `double` variable per soil property over `(lat, lon)`, and
//! `geospatial_*` global attributes holding the requested bounding box.
//! Missing cells are stored as [`NC_FILL_F64`] and read back as `NaN`.

use netcdf3::{DataSet, FileReader, FileWriter, NC_FILL_F64, Version};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;

use crate::dataset::{CRS_WGS84, Grid, GriddedDataset};
use crate::error::{Error, Result};
use crate::location::BoundingBox;

const LAT: &str = "lat";
const LON: &str = "lon";

pub const ATTR_LON_MIN: &str = "geospatial_lon_min";
pub const ATTR_LON_MAX: &str = "geospatial_lon_max";
pub const ATTR_LAT_MIN: &str = "geospatial_lat_min";
pub const ATTR_LAT_MAX: &str = "geospatial_lat_max";

fn write_err(path: &Path, e: impl Debug) -> Error {
    Error::io(path, std::io::Error::other(format!("NetCDF write failed: {e:?}")))
}

fn read_err(path: &Path, e: impl Debug) -> Error {
    Error::io(path, std::io::Error::other(format!("NetCDF read failed: {e:?}")))
}

fn define(ds: &GriddedDataset, path: &Path) -> Result<DataSet> {
    let err = |e| write_err(path, e);
    let mut def = DataSet::new();

    def.add_fixed_dim(LAT, ds.height()).map_err(err)?;
    def.add_fixed_dim(LON, ds.width()).map_err(err)?;

    def.add_var_f64(LAT, &[LAT]).map_err(err)?;
    def.add_var_attr_string(LAT, "standard_name", "latitude").map_err(err)?;
    def.add_var_attr_string(LAT, "units", "degrees_north").map_err(err)?;
    def.add_var_f64(LON, &[LON]).map_err(err)?;
    def.add_var_attr_string(LON, "standard_name", "longitude").map_err(err)?;
    def.add_var_attr_string(LON, "units", "degrees_east").map_err(err)?;

    for (name, grid) in &ds.variables {
        def.add_var_f64(name, &[LAT, LON]).map_err(err)?;
        if !grid.units.is_empty() {
            def.add_var_attr_string(name, "units", &grid.units).map_err(err)?;
        }
        if !grid.long_name.is_empty() {
            def.add_var_attr_string(name, "long_name", &grid.long_name).map_err(err)?;
        }
        def.add_var_attr_f64(name, "_FillValue", vec![NC_FILL_F64]).map_err(err)?;
    }

    def.add_global_attr_string("Conventions", "CF-1.8").map_err(err)?;
    def.add_global_attr_string("crs", &ds.crs).map_err(err)?;
    for (key, value) in &ds.attributes {
        def.add_global_attr_string(key, value).map_err(err)?;
    }
    def.add_global_attr_f64(ATTR_LON_MIN, vec![ds.bbox.xmin]).map_err(err)?;
    def.add_global_attr_f64(ATTR_LON_MAX, vec![ds.bbox.xmax]).map_err(err)?;
    def.add_global_attr_f64(ATTR_LAT_MIN, vec![ds.bbox.ymin]).map_err(err)?;
    def.add_global_attr_f64(ATTR_LAT_MAX, vec![ds.bbox.ymax]).map_err(err)?;

    Ok(def)
}

/// Writes `ds` to `path`, which must not be observed by readers until this
/// returns (callers write to a staging location and rename).
pub fn write_dataset(path: &Path, ds: &GriddedDataset) -> Result<()> {
    let def = define(ds, path)?;
    let err = |e| write_err(path, e);

    let mut writer = FileWriter::open(path).map_err(err)?;
    writer.set_def(&def, Version::Classic, 0).map_err(err)?;
    writer.write_var_f64(LAT, &ds.lat).map_err(err)?;
    writer.write_var_f64(LON, &ds.lon).map_err(err)?;
    for (name, grid) in &ds.variables {
        let filled: Vec<f64> = grid
            .data
            .iter()
            .map(|&v| if v.is_nan() { NC_FILL_F64 } else { v })
            .collect();
        writer.write_var_f64(name, &filled).map_err(err)?;
    }
    writer.close().map_err(err)?;
    Ok(())
}

/// Reads back a file produced by [`write_dataset`].
pub fn read_dataset(path: &Path) -> Result<GriddedDataset> {
    let err = |e| read_err(path, e);
    let mut reader = FileReader::open(path).map_err(err)?;

    let (bbox, crs, names) = {
        let def = reader.data_set();
        let bound = |attr: &str| -> Result<f64> {
            def.get_global_attr_f64(attr)
                .and_then(|v| v.first().copied())
                .ok_or_else(|| read_err(path, format!("missing global attribute {attr}")))
        };
        let bbox = BoundingBox {
            xmin: bound(ATTR_LON_MIN)?,
            xmax: bound(ATTR_LON_MAX)?,
            ymin: bound(ATTR_LAT_MIN)?,
            ymax: bound(ATTR_LAT_MAX)?,
        };
        let crs = def
            .get_global_attr_as_string("crs")
            .unwrap_or_else(|| CRS_WGS84.to_string());
        let names: Vec<(String, String, String)> = def
            .get_var_names()
            .into_iter()
            .filter(|n| n != LAT && n != LON)
            .map(|n| {
                let units = def.get_var_attr_as_string(&n, "units").unwrap_or_default();
                let long_name = def
                    .get_var_attr_as_string(&n, "long_name")
                    .unwrap_or_default();
                (n, units, long_name)
            })
            .collect();
        (bbox, crs, names)
    };

    let lat = reader.read_var_f64(LAT).map_err(err)?;
    let lon = reader.read_var_f64(LON).map_err(err)?;

    let mut variables = BTreeMap::new();
    for (name, units, long_name) in names {
        let data = reader
            .read_var_f64(&name)
            .map_err(err)?
            .into_iter()
            .map(|v| if v == NC_FILL_F64 { f64::NAN } else { v })
            .collect();
        let grid = Grid::new(lon.len(), lat.len(), data)?
            .with_units(units)
            .with_long_name(long_name);
        variables.insert(name, grid);
    }
    reader.close();

    Ok(GriddedDataset {
        bbox,
        crs,
        lon,
        lat,
        variables,
        attributes: BTreeMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("clay.nc");

        let bbox = BoundingBox::new(-3.6, -3.4, 50.6, 50.8).unwrap();
        let mut ds = GriddedDataset::new(bbox, 3, 2);
        ds.attributes
            .insert("title".to_string(), "test".to_string());
        ds.insert(
            "clay",
            Grid::new(3, 2, vec![23.1, f64::NAN, 18.0, 20.5, 21.0, 22.0])
                .unwrap()
                .with_units("g/100g")
                .with_long_name("Clay"),
        )
        .unwrap();

        write_dataset(&path, &ds).unwrap();
        let back = read_dataset(&path).unwrap();

        assert_eq!(back.bbox, bbox);
        assert_eq!(back.crs, CRS_WGS84);
        assert_eq!((back.width(), back.height()), (3, 2));
        assert_abs_diff_eq!(back.lat[0], ds.lat[0], epsilon = 1e-12);
        let clay = back.variable("clay").unwrap();
        assert_eq!(clay.units, "g/100g");
        assert_eq!(clay.long_name, "Clay");
        assert_abs_diff_eq!(clay.data[0], 23.1, epsilon = 1e-12);
        assert!(clay.data[1].is_nan());
        assert_eq!(clay.valid_count(), 5);
    }

    #[test]
    fn missing_cells_use_the_classic_fill_value() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sand.nc");

        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let mut ds = GriddedDataset::new(bbox, 2, 1);
        ds.insert("sand", Grid::new(2, 1, vec![f64::NAN, f64::NAN]).unwrap())
            .unwrap();
        write_dataset(&path, &ds).unwrap();

        let reader = FileReader::open(&path).unwrap();
        let fill = reader.data_set().get_var_attr_f64("sand", "_FillValue").unwrap();
        assert_eq!(fill, &[NC_FILL_F64]);
        drop(reader);

        let back = read_dataset(&path).unwrap();
        assert_eq!(back.variable("sand").unwrap().valid_count(), 0);
    }
}
