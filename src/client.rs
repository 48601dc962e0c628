use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::api::SoilGridsApi;
use crate::config::load_config;
use crate::download;
use crate::error::{Error, Result};
use crate::location::{BoundingBox, Location, LocationParams};
use crate::point::SoilProperties;
use crate::source::{PointRequest, RegionRequest, SoilSource};

pub const DEFAULT_REST_URL: &str = "https://rest.isric.org/soilgrids/v2.0";
pub const DEFAULT_WCS_URL: &str = "https://maps.isric.org/mapserv";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the REST API, used for point queries.
    pub rest_url: String,
    /// MapServer endpoint serving the WCS coverages, used for bulk downloads.
    pub wcs_url: String,
    /// Upper bound on each HTTP request.
    pub timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify: bool,
    /// Show a progress bar during bulk downloads.
    pub progress: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rest_url: DEFAULT_REST_URL.to_string(),
            wcs_url: DEFAULT_WCS_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            verify: true,
            progress: true,
        }
    }
}

/// Entry point for SoilGrids point queries and region downloads.
///
/// Holds only configuration; a `Client` can be shared across threads and
/// each call is independent.
#[derive(Debug, Clone)]
pub struct Client<S = SoilGridsApi> {
    source: S,
}

impl Client<SoilGridsApi> {
    /// Creates a client for the public SoilGrids service.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client using (in order of precedence):
    /// - environment variables `SOILGRIDS_REST_URL`, `SOILGRIDS_WCS_URL`,
    ///   `SOILGRIDS_TIMEOUT`
    /// - config file from `SOILGRIDS_RC` or `.soilgridsrc`
    /// - the public service defaults
    pub fn from_env() -> Result<Self> {
        Self::with_config(load_config()?)
    }

    pub fn with_config(cfg: ClientConfig) -> Result<Self> {
        Ok(Self {
            source: SoilGridsApi::new(&cfg)?,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.source = self.source.with_timeout(timeout);
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.source = self.source.with_progress(progress);
        self
    }
}

impl<S: SoilSource> Client<S> {
    /// Wraps any [`SoilSource`].
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// Soil properties at `location` for all properties and standard depths.
    pub fn point_query(&self, location: &Location) -> Result<SoilProperties> {
        self.point_query_with(location, &PointRequest::default())
    }

    /// Point query from mapping-shaped input (`{lon, lat}` or `{OS_code}`).
    ///
    /// The input is validated before any request is made.
    pub fn point_query_params(&self, params: &LocationParams) -> Result<SoilProperties> {
        let location = Location::try_from(params)?;
        self.point_query(&location)
    }

    pub fn point_query_with(
        &self,
        location: &Location,
        request: &PointRequest,
    ) -> Result<SoilProperties> {
        request.validate()?;
        let (lon, lat) = location.lon_lat();
        debug!(lon, lat, "point query");

        let props = self.source.query_point(lon, lat, request)?;
        if props.is_empty() {
            return Err(Error::external(
                format!("point ({lon}, {lat})"),
                "service returned no soil layers",
            ));
        }
        Ok(props)
    }

    /// Downloads every soil property over the box into one NetCDF file
    /// under `save_path` and returns its path.
    ///
    /// The file name depends only on the box, and an existing file of that
    /// name is replaced. Concurrent downloads of the same box into the same
    /// directory race; callers must serialize them.
    pub fn bulk_download(
        &self,
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
        save_path: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let bbox = BoundingBox::new(xmin, xmax, ymin, ymax)?;
        self.bulk_download_with(&bbox, save_path, &RegionRequest::default())
    }

    pub fn bulk_download_with(
        &self,
        bbox: &BoundingBox,
        save_path: impl AsRef<Path>,
        request: &RegionRequest,
    ) -> Result<PathBuf> {
        download::bulk_download(&self.source, bbox, save_path.as_ref(), request)
    }
}
