use serde::Deserialize;

use crate::error::{Error, Result};
use crate::osgrid::OsGridRef;

/// Where a point query should be answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// WGS84 longitude/latitude in degrees.
    Coordinate { lon: f64, lat: f64 },
    /// Ordnance Survey National Grid reference.
    GridCode(OsGridRef),
}

impl Location {
    pub fn coordinate(lon: f64, lat: f64) -> Result<Self> {
        check_lon("lon", lon)?;
        check_lat("lat", lat)?;
        Ok(Location::Coordinate { lon, lat })
    }

    pub fn grid_code(code: &str) -> Result<Self> {
        Ok(Location::GridCode(OsGridRef::parse(code)?))
    }

    /// WGS84 `(lon, lat)` to send to the service.
    pub fn lon_lat(&self) -> (f64, f64) {
        match self {
            Location::Coordinate { lon, lat } => (*lon, *lat),
            Location::GridCode(grid) => grid.to_wgs84(),
        }
    }
}

/// Mapping-shaped location input: either `{lon, lat}` or `{OS_code}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationParams {
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default, rename = "OS_code")]
    pub os_code: Option<String>,
}

impl TryFrom<&LocationParams> for Location {
    type Error = Error;

    fn try_from(p: &LocationParams) -> Result<Self> {
        let has_coord = p.lon.is_some() || p.lat.is_some();
        match (has_coord, p.os_code.as_deref()) {
            (true, Some(_)) => Err(Error::invalid(
                "location",
                "give either lon/lat or OS_code, not both",
            )),
            (false, None) => Err(Error::invalid(
                "location",
                "one of lon/lat or OS_code is required",
            )),
            (false, Some(code)) => Location::grid_code(code),
            (true, None) => match (p.lon, p.lat) {
                (Some(lon), Some(lat)) => Location::coordinate(lon, lat),
                (None, _) => Err(Error::invalid("lon", "lat given without lon")),
                (_, None) => Err(Error::invalid("lat", "lon given without lat")),
            },
        }
    }
}

impl TryFrom<LocationParams> for Location {
    type Error = Error;

    fn try_from(p: LocationParams) -> Result<Self> {
        Location::try_from(&p)
    }
}

/// Rectangular lon/lat region, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Builds a non-degenerate box (`xmin < xmax`, `ymin < ymax`).
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<Self> {
        check_lon("xmin", xmin)?;
        check_lon("xmax", xmax)?;
        check_lat("ymin", ymin)?;
        check_lat("ymax", ymax)?;
        if xmin >= xmax {
            return Err(Error::invalid(
                "xmin",
                format!("xmin ({xmin}) must be smaller than xmax ({xmax})"),
            ));
        }
        if ymin >= ymax {
            return Err(Error::invalid(
                "ymin",
                format!("ymin ({ymin}) must be smaller than ymax ({ymax})"),
            ));
        }
        Ok(Self {
            xmin,
            xmax,
            ymin,
            ymax,
        })
    }
}

fn check_lon(field: &'static str, v: f64) -> Result<()> {
    if !v.is_finite() || !(-180.0..=180.0).contains(&v) {
        return Err(Error::invalid(
            field,
            format!("{v} is outside the longitude range [-180, 180]"),
        ));
    }
    Ok(())
}

fn check_lat(field: &'static str, v: f64) -> Result<()> {
    if !v.is_finite() || !(-90.0..=90.0).contains(&v) {
        return Err(Error::invalid(
            field,
            format!("{v} is outside the latitude range [-90, 90]"),
        ));
    }
    Ok(())
}
