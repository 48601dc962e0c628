//! A small Rust client for the ISRIC SoilGrids web services.
//!
//! Two operations are offered through [`Client`]:
//! - **point query**: soil properties at a lon/lat coordinate or an Ordnance
//!   Survey grid reference, returned in memory;
//! - **bulk download**: every soil property over a bounding box, averaged over
//!   0-60 cm, written to one NetCDF file.
//!
//! ## Quick start
//!
//! ```no_run
//! use soilgrids::{Client, Location};
//!
//! fn main() -> Result<(), soilgrids::Error> {
//!     let client = Client::new()?;
//!
//!     let here = Location::coordinate(-3.5, 50.7)?;
//!     let props = client.point_query(&here)?;
//!     println!("clay 0-5cm: {:?}", props.value("clay", "0-5cm", "mean"));
//!
//!     let path = client.bulk_download(-3.6, -3.4, 50.6, 50.8, "/tmp/out")?;
//!     println!("wrote {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! Endpoints and timeouts can be overridden through [`ClientConfig`], the
//! `SOILGRIDS_*` environment variables or a `.soilgridsrc` file (see
//! [`Client::from_env`]).

#![forbid(unsafe_code)]

mod api;
mod client;
mod config;
mod coverage;
mod dataset;
mod download;
mod error;
mod location;
pub mod netcdf;
mod osgrid;
mod point;
mod property;
mod source;
mod util;

pub use api::SoilGridsApi;
pub use client::{Client, ClientConfig, DEFAULT_REST_URL, DEFAULT_TIMEOUT, DEFAULT_WCS_URL};
pub use dataset::{CRS_WGS84, Grid, GriddedDataset, depth_weighted_mean};
pub use download::output_file_name;
pub use error::{Error, Result};
pub use location::{BoundingBox, Location, LocationParams};
pub use osgrid::OsGridRef;
pub use point::{
    DepthRange, DepthValues, LayerCollection, PointGeometry, SoilLayer, SoilProperties,
    UnitMeasure,
};
pub use property::{Depth, SoilProperty};
pub use source::{PointRequest, RegionRequest, SoilSource, VALUE_STATISTICS};
